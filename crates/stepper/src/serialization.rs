use crate::replay::Frame;
use crate::runner::{Mode, Phase};
use crate::store::Store;
use serde::Serialize;
use sssp::{Algorithm, Graph, NodeId, ShortestPathResult, Step};
use std::path::Path;

// ------------------------------------------------------------------
// Export structures
// ------------------------------------------------------------------

#[derive(Serialize)]
pub struct RunParams {
    pub algorithm: Algorithm,
    pub source_node: Option<NodeId>,
    pub destination_node: Option<NodeId>,
    pub has_negative_cycle: bool,
}

#[derive(Serialize)]
pub struct PlaybackState<'a> {
    pub phase: Phase,
    pub mode: Mode,
    pub current_step: usize,
    pub total_steps: usize,
    pub frame: &'a Frame,
}

/// Snapshot of a graph, its step log and the runner's position.
#[derive(Serialize)]
pub struct RunExport<'a> {
    pub graph: &'a Graph,
    pub params: RunParams,
    pub steps: &'a [Step],
    pub result: Option<&'a ShortestPathResult>,
    pub playback: PlaybackState<'a>,
}

impl<'a> RunExport<'a> {
    pub fn from_store(store: &'a Store) -> Self {
        let runner = &store.runner;
        Self {
            graph: store.graph.get(),
            params: RunParams {
                algorithm: runner.algorithm(),
                source_node: store.source,
                destination_node: store.destination,
                has_negative_cycle: store.has_negative_cycle,
            },
            steps: runner.steps(),
            result: runner.result(),
            playback: PlaybackState {
                phase: runner.phase(),
                mode: runner.mode(),
                current_step: runner.current_step(),
                total_steps: runner.len(),
                frame: runner.frame(),
            },
        }
    }
}

// ------------------------------------------------------------------
// Output
// ------------------------------------------------------------------

pub fn to_json(store: &Store) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RunExport::from_store(store))
}

pub fn save_to_file(store: &Store, path: &Path) -> Result<(), String> {
    let json = to_json(store).map_err(|e| format!("Failed to serialize: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write file: {}", e))
}

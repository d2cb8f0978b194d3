//! Derived display state for any index of a step log.
//!
//! A [`Frame`] is a pure function of `(steps, index)`: the status
//! overlay starts from `unvisited`, takes the current step's edge
//! updates, then marks every confirmed path edge `included`. Edges the
//! current step flags as part of a negative cycle keep that status.

use serde::Serialize;
use sssp::step::Distances;
use sssp::{
    Edge, EdgeId, EdgeStatus, HeapEntry, NodeId, ShortestPathResult, Step,
    StepLabel,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    /// Number of applied steps; the displayed step is `index - 1`.
    pub index: usize,
    pub explanation: String,
    pub label: Option<StepLabel>,
    pub visited_nodes: Vec<NodeId>,
    pub distances: Distances,
    pub min_heap: Vec<HeapEntry>,
    pub iteration: Option<usize>,
    pub negative_cycle_detected: bool,
    pub current_edge: Option<EdgeId>,
    pub updated_distances: Vec<NodeId>,
    pub confirmed_path_edges: BTreeSet<EdgeId>,
    pub edge_overlay: BTreeMap<EdgeId, EdgeStatus>,
}

impl Frame {
    /// Frame after applying `step` as the `index`-th step.
    pub fn from_step(
        index: usize,
        step: &Step,
        confirmed: &BTreeSet<EdgeId>,
    ) -> Self {
        let mut overlay: BTreeMap<EdgeId, EdgeStatus> = step
            .edge_updates
            .iter()
            .map(|u| (u.id.clone(), u.status))
            .collect();
        for id in confirmed {
            let status = overlay.entry(id.clone()).or_default();
            if *status != EdgeStatus::NegativeCycle {
                *status = EdgeStatus::Included;
            }
        }

        Self {
            index,
            explanation: step.explanation.clone(),
            label: Some(step.label),
            visited_nodes: step.visited_nodes.clone(),
            distances: step.distances.clone(),
            min_heap: step.min_heap().map(<[_]>::to_vec).unwrap_or_default(),
            iteration: step.iteration(),
            negative_cycle_detected: step.negative_cycle_detected,
            current_edge: step.current_edge.clone(),
            updated_distances: step.updated_distances.clone(),
            confirmed_path_edges: confirmed.clone(),
            edge_overlay: overlay,
        }
    }

    pub fn status(&self, id: &EdgeId) -> EdgeStatus {
        self.edge_overlay.get(id).copied().unwrap_or_default()
    }

    /// Write the overlay onto the caller's own edge copies.
    pub fn apply_to(&self, edges: &mut [Edge]) {
        for edge in edges {
            edge.status = self.status(&edge.id);
        }
    }

    pub fn distance(&self, id: NodeId) -> f64 {
        self.distances.get(&id).copied().unwrap_or(f64::INFINITY)
    }
}

/// Union of `path_edge_updates` over the first `index` steps.
pub fn confirmed_edges(steps: &[Step], index: usize) -> BTreeSet<EdgeId> {
    steps
        .iter()
        .take(index)
        .flat_map(|s| s.path_edge_updates.iter().cloned())
        .collect()
}

/// Frame after applying steps `0..index`; `index` is clamped.
pub fn frame_at(steps: &[Step], index: usize) -> Frame {
    let index = index.min(steps.len());
    match index.checked_sub(1).and_then(|i| steps.get(i)) {
        Some(step) => {
            Frame::from_step(index, step, &confirmed_edges(steps, index))
        }
        None => Frame::default(),
    }
}

/// Final frame of the view mode: the shortest-path tree of the result,
/// or the negative cycle when one was found.
pub fn result_frame(steps: &[Step], result: &ShortestPathResult) -> Frame {
    let mut frame = frame_at(steps, steps.len());
    frame.edge_overlay.clear();
    if result.has_negative_cycle {
        frame.confirmed_path_edges.clear();
        for id in &result.cycle_edges {
            frame.edge_overlay.insert(id.clone(), EdgeStatus::NegativeCycle);
        }
    } else {
        frame.confirmed_path_edges = result.tree_edges.clone();
        for id in &result.tree_edges {
            frame.edge_overlay.insert(id.clone(), EdgeStatus::Included);
        }
    }
    frame
}

/// Whether `step` is worth stopping at during a coarse forward seek:
/// the visited set grew, a path edge was confirmed, or a negative
/// cycle was just reported.
pub fn is_significant(previous: Option<&Step>, step: &Step) -> bool {
    let visited_before = previous.map_or(0, |p| p.visited_nodes.len());
    let cycle_before = previous.is_some_and(|p| p.negative_cycle_detected);
    step.visited_nodes.len() > visited_before
        || !step.path_edge_updates.is_empty()
        || (step.negative_cycle_detected && !cycle_before)
}

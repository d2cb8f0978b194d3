//! Step records emitted by the instrumented algorithms.
//!
//! A run produces its complete `Vec<Step>` up front. Each step is an
//! immutable snapshot: the visited set, the distance table and the
//! algorithm-specific structures are copied into it, so any index can
//! be displayed without replaying mutations.

use crate::graph::{EdgeId, EdgeStatus, Graph, NodeId};
use crate::{bellman_ford, dijkstra};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub type Distances = BTreeMap<NodeId, f64>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[default]
    Dijkstra,
    BellmanFord,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::BellmanFord => "Bellman-Ford",
        }
    }

    /// Run the instrumented algorithm from `source`.
    pub fn run(
        self,
        graph: &Graph,
        source: NodeId,
    ) -> Result<AlgorithmRun, RunError> {
        match self {
            Algorithm::Dijkstra => dijkstra::run(graph, source),
            Algorithm::BellmanFord => bellman_ford::run(graph, source),
        }
    }

    /// Callback flavour of [`Algorithm::run`]: the result is handed to
    /// `set_result` exactly once, after the last step was generated.
    pub fn generate_steps(
        self,
        graph: &Graph,
        source: NodeId,
        set_result: impl FnOnce(ShortestPathResult),
    ) -> Result<Vec<Step>, RunError> {
        let run = self.run(graph, source)?;
        set_result(run.result);
        Ok(run.steps)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("source node {0} is not part of the graph")]
    UnknownSource(NodeId),
}

// ------------------------------------------------------------------
// Step records
// ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepLabel {
    Initialize,
    /// Dijkstra popped a node that was already finalized.
    SkipVisited,
    /// Dijkstra finalized the node with the smallest tentative distance.
    Extract,
    /// Bellman-Ford started an outer pass.
    Iteration,
    /// Bellman-Ford met an edge whose tail is still unreachable.
    SkipUnreachable,
    Candidate,
    /// Dijkstra refuses to use a negative edge.
    ExcludedNegative,
    Relaxed,
    NoImprovement,
    /// A full Bellman-Ford pass changed nothing.
    EarlyStop,
    /// The verification pass found no relaxable edge.
    CycleCheck,
    NegativeCycle,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeUpdate {
    pub id: EdgeId,
    pub status: EdgeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeapEntry {
    pub id: NodeId,
    pub dist: f64,
}

/// Algorithm-specific part of a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum AlgorithmState {
    Dijkstra { min_heap: Vec<HeapEntry> },
    BellmanFord { iteration: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub explanation: String,
    pub label: StepLabel,
    /// Dijkstra: finalized nodes in extraction order. Bellman-Ford:
    /// nodes with a finite distance so far.
    pub visited_nodes: Vec<NodeId>,
    /// Infinite entries serialize as `null`.
    pub distances: Distances,
    pub edge_updates: Vec<EdgeUpdate>,
    /// Edges newly confirmed on some shortest path.
    pub path_edge_updates: Vec<EdgeId>,
    pub updated_distances: Vec<NodeId>,
    pub current_edge: Option<EdgeId>,
    pub negative_cycle_detected: bool,
    pub state: AlgorithmState,
}

impl Step {
    pub fn algorithm(&self) -> Algorithm {
        match self.state {
            AlgorithmState::Dijkstra { .. } => Algorithm::Dijkstra,
            AlgorithmState::BellmanFord { .. } => Algorithm::BellmanFord,
        }
    }

    pub fn min_heap(&self) -> Option<&[HeapEntry]> {
        match &self.state {
            AlgorithmState::Dijkstra { min_heap } => Some(min_heap),
            AlgorithmState::BellmanFord { .. } => None,
        }
    }

    pub fn iteration(&self) -> Option<usize> {
        match self.state {
            AlgorithmState::Dijkstra { .. } => None,
            AlgorithmState::BellmanFord { iteration } => Some(iteration),
        }
    }

    pub fn distance(&self, id: NodeId) -> f64 {
        self.distances.get(&id).copied().unwrap_or(f64::INFINITY)
    }
}

/// What a single step changes, before the run state is snapshotted.
#[derive(Debug, Clone, Default)]
pub(crate) struct StepChange {
    pub edge_updates: Vec<EdgeUpdate>,
    pub path_edge_updates: Vec<EdgeId>,
    pub updated_distances: Vec<NodeId>,
    pub current_edge: Option<EdgeId>,
}

impl StepChange {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn touching(id: &EdgeId) -> Self {
        Self {
            current_edge: Some(id.clone()),
            ..Self::default()
        }
    }

    pub fn edge(id: &EdgeId, status: EdgeStatus) -> Self {
        Self {
            edge_updates: vec![EdgeUpdate {
                id: id.clone(),
                status,
            }],
            current_edge: Some(id.clone()),
            ..Self::default()
        }
    }

    pub fn relaxed(id: &EdgeId, node: NodeId) -> Self {
        Self {
            path_edge_updates: vec![id.clone()],
            updated_distances: vec![node],
            ..Self::edge(id, EdgeStatus::Included)
        }
    }

    pub fn cycle<'a>(edges: impl IntoIterator<Item = &'a EdgeId>) -> Self {
        Self {
            edge_updates: edges
                .into_iter()
                .map(|id| EdgeUpdate {
                    id: id.clone(),
                    status: EdgeStatus::NegativeCycle,
                })
                .collect(),
            ..Self::default()
        }
    }
}

// ------------------------------------------------------------------
// Results
// ------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShortestPathResult {
    pub distances: Distances,
    /// Node sequence from the source, per reachable node. Empty when a
    /// negative cycle voids all paths.
    pub paths: BTreeMap<NodeId, Vec<NodeId>>,
    pub has_negative_cycle: bool,
    /// Predecessor edges of the final shortest-path tree.
    pub tree_edges: BTreeSet<EdgeId>,
    pub cycle_edges: BTreeSet<EdgeId>,
}

impl ShortestPathResult {
    pub fn distance(&self, id: NodeId) -> f64 {
        self.distances.get(&id).copied().unwrap_or(f64::INFINITY)
    }

    pub fn path(&self, id: NodeId) -> Option<&[NodeId]> {
        self.paths.get(&id).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmRun {
    pub algorithm: Algorithm,
    pub source: NodeId,
    pub steps: Vec<Step>,
    pub result: ShortestPathResult,
}

pub(crate) type Predecessors = BTreeMap<NodeId, (NodeId, EdgeId)>;

/// Walk predecessor links back to `source` for every reachable node.
pub(crate) fn reconstruct_paths(
    source: NodeId,
    dist: &Distances,
    prev: &Predecessors,
) -> (BTreeMap<NodeId, Vec<NodeId>>, BTreeSet<EdgeId>) {
    let limit = dist.len();
    let mut paths = BTreeMap::new();
    let mut tree = BTreeSet::new();

    for (&node, d) in dist {
        if !d.is_finite() {
            continue;
        }
        let mut path = vec![node];
        let mut edges = Vec::new();
        let mut at = node;
        while at != source && path.len() <= limit {
            let Some((p, edge)) = prev.get(&at) else {
                break;
            };
            edges.push(edge.clone());
            path.push(*p);
            at = *p;
        }
        if at == source {
            path.reverse();
            tree.extend(edges);
            paths.insert(node, path);
        }
    }
    (paths, tree)
}

/// Distance as shown in explanations: `∞` for unreachable nodes.
pub fn fmt_distance(d: f64) -> String {
    if d.is_infinite() {
        "∞".to_string()
    } else {
        format!("{d}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct_paths() {
        let dist = Distances::from([
            (0, 0.0),
            (1, 1.0),
            (2, 3.0),
            (3, f64::INFINITY),
        ]);
        let prev = Predecessors::from([
            (1, (0, EdgeId::new(0, 1))),
            (2, (1, EdgeId::new(1, 2))),
        ]);
        let (paths, tree) = reconstruct_paths(0, &dist, &prev);
        assert_eq!(paths.get(&2), Some(&vec![0, 1, 2]));
        assert_eq!(paths.get(&0), Some(&vec![0]));
        assert!(!paths.contains_key(&3));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_fmt_distance() {
        assert_eq!(fmt_distance(f64::INFINITY), "∞");
        assert_eq!(fmt_distance(4.0), "4");
        assert_eq!(fmt_distance(-2.5), "-2.5");
    }

    #[test]
    fn test_unknown_source() {
        let g = Graph::default();
        assert_eq!(
            Algorithm::Dijkstra.run(&g, 0),
            Err(RunError::UnknownSource(0))
        );
    }
}

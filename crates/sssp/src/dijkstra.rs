//! Instrumented Dijkstra.
//!
//! The priority list is a plain vector re-sorted before every
//! extraction; graphs here have at most a few dozen nodes.
//!
//! A node sits in the list at most once (`upsert`), and a non-negative
//! relaxation can never lower a finalized distance, so the
//! `SkipVisited` step is a guard that stays silent on normal runs.

use crate::graph::{EdgeStatus, Graph, NodeId};
use crate::step::{
    Algorithm, AlgorithmRun, AlgorithmState, Distances, HeapEntry,
    Predecessors, RunError, ShortestPathResult, Step, StepChange,
    StepLabel, fmt_distance, reconstruct_paths,
};
use std::collections::BTreeSet;

/// State of one run. Built fresh for every call to [`run`].
struct DijkstraRun<'g> {
    graph: &'g Graph,
    source: NodeId,
    dist: Distances,
    prev: Predecessors,
    visited: BTreeSet<NodeId>,
    visited_order: Vec<NodeId>,
    queue: Vec<HeapEntry>,
    steps: Vec<Step>,
}

impl<'g> DijkstraRun<'g> {
    fn new(graph: &'g Graph, source: NodeId) -> Self {
        let dist = graph
            .node_ids()
            .map(|id| (id, if id == source { 0.0 } else { f64::INFINITY }))
            .collect();
        Self {
            graph,
            source,
            dist,
            prev: Predecessors::new(),
            visited: BTreeSet::new(),
            visited_order: Vec::new(),
            queue: vec![HeapEntry {
                id: source,
                dist: 0.0,
            }],
            steps: Vec::new(),
        }
    }

    fn name(&self, id: NodeId) -> String {
        self.graph
            .node(id)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn dist(&self, id: NodeId) -> f64 {
        self.dist.get(&id).copied().unwrap_or(f64::INFINITY)
    }

    fn sort_queue(&mut self) {
        self.queue.sort_by(|a, b| {
            a.dist.total_cmp(&b.dist).then(a.id.cmp(&b.id))
        });
    }

    fn upsert(&mut self, id: NodeId, dist: f64) {
        match self.queue.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.dist = dist,
            None => self.queue.push(HeapEntry { id, dist }),
        }
    }

    fn record(
        &mut self,
        label: StepLabel,
        explanation: String,
        change: StepChange,
    ) {
        let mut min_heap = self.queue.clone();
        min_heap.sort_by(|a, b| {
            a.dist.total_cmp(&b.dist).then(a.id.cmp(&b.id))
        });
        self.steps.push(Step {
            explanation,
            label,
            visited_nodes: self.visited_order.clone(),
            distances: self.dist.clone(),
            edge_updates: change.edge_updates,
            path_edge_updates: change.path_edge_updates,
            updated_distances: change.updated_distances,
            current_edge: change.current_edge,
            negative_cycle_detected: false,
            state: AlgorithmState::Dijkstra { min_heap },
        });
    }

    fn execute(mut self) -> AlgorithmRun {
        let graph = self.graph;
        let source = self.source;

        self.record(
            StepLabel::Initialize,
            format!(
                "Set the distance of {} to 0 and every other node to ∞; \
                 queue {}.",
                self.name(source),
                self.name(source)
            ),
            StepChange {
                updated_distances: vec![source],
                ..StepChange::none()
            },
        );

        while !self.queue.is_empty() {
            self.sort_queue();
            let HeapEntry { id: u, dist: d } = self.queue.remove(0);

            if !self.visited.insert(u) {
                self.record(
                    StepLabel::SkipVisited,
                    format!(
                        "{} is already finalized; skip it.",
                        self.name(u)
                    ),
                    StepChange::none(),
                );
                continue;
            }
            self.visited_order.push(u);
            self.record(
                StepLabel::Extract,
                format!(
                    "Extract {} with the smallest tentative distance {}; \
                     its distance is now final.",
                    self.name(u),
                    fmt_distance(d)
                ),
                StepChange::none(),
            );

            for (edge, v) in graph.neighbors(u) {
                let (from, to) = (self.name(u), self.name(v));
                if edge.weight < 0.0 {
                    self.record(
                        StepLabel::ExcludedNegative,
                        format!(
                            "Edge {from}→{to} has negative weight {}; \
                             Dijkstra cannot use negative edges, so it \
                             is excluded.",
                            edge.weight
                        ),
                        StepChange::edge(&edge.id, EdgeStatus::Excluded),
                    );
                    continue;
                }

                self.record(
                    StepLabel::Candidate,
                    format!(
                        "Consider edge {from}→{to} with weight {}.",
                        edge.weight
                    ),
                    StepChange::edge(&edge.id, EdgeStatus::Candidate),
                );

                let current = self.dist(v);
                let candidate = self.dist(u) + edge.weight;
                if candidate < current {
                    self.dist.insert(v, candidate);
                    self.prev.insert(v, (u, edge.id.clone()));
                    self.upsert(v, candidate);
                    self.record(
                        StepLabel::Relaxed,
                        format!(
                            "Relax {from}→{to}: {} + {} = {} improves on \
                             {}; update {to}.",
                            fmt_distance(self.dist(u)),
                            edge.weight,
                            fmt_distance(candidate),
                            fmt_distance(current)
                        ),
                        StepChange::relaxed(&edge.id, v),
                    );
                } else {
                    self.record(
                        StepLabel::NoImprovement,
                        format!(
                            "{from}→{to} gives {}, no better than {}; \
                             keep the current distance.",
                            fmt_distance(candidate),
                            fmt_distance(current)
                        ),
                        StepChange::edge(&edge.id, EdgeStatus::Excluded),
                    );
                }
            }
        }

        let (paths, tree_edges) =
            reconstruct_paths(source, &self.dist, &self.prev);
        let unreachable = self.dist.values().filter(|d| d.is_infinite()).count();
        self.record(
            StepLabel::Complete,
            format!(
                "Queue empty: shortest paths from {} are final \
                 ({} reachable, {} unreachable).",
                self.name(source),
                paths.len(),
                unreachable
            ),
            StepChange::none(),
        );

        tracing::debug!(
            steps = self.steps.len(),
            reachable = paths.len(),
            "dijkstra run finished"
        );

        AlgorithmRun {
            algorithm: Algorithm::Dijkstra,
            source,
            result: ShortestPathResult {
                distances: self.dist,
                paths,
                has_negative_cycle: false,
                tree_edges,
                cycle_edges: BTreeSet::new(),
            },
            steps: self.steps,
        }
    }
}

pub fn run(graph: &Graph, source: NodeId) -> Result<AlgorithmRun, RunError> {
    if !graph.contains_node(source) {
        return Err(RunError::UnknownSource(source));
    }
    Ok(DijkstraRun::new(graph, source).execute())
}

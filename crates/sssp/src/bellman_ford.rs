//! Instrumented Bellman-Ford.
//!
//! Edges are relaxed in array order; an undirected edge is relaxed in
//! its forward direction, then its reverse. A final pass over every
//! edge proves whether a negative cycle is reachable from the source.

use crate::graph::{EdgeId, EdgeStatus, Graph, NodeId};
use crate::step::{
    Algorithm, AlgorithmRun, AlgorithmState, Distances, Predecessors,
    RunError, ShortestPathResult, Step, StepChange, StepLabel,
    fmt_distance, reconstruct_paths,
};
use std::collections::{BTreeMap, BTreeSet};

/// State of one run. Built fresh for every call to [`run`].
struct BellmanFordRun<'g> {
    graph: &'g Graph,
    source: NodeId,
    dist: Distances,
    prev: Predecessors,
    iteration: usize,
    negative_cycle: bool,
    steps: Vec<Step>,
}

impl<'g> BellmanFordRun<'g> {
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
            iteration: 0,
            negative_cycle: false,
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

    fn record(
        &mut self,
        label: StepLabel,
        explanation: String,
        change: StepChange,
    ) {
        let reached = self
            .dist
            .iter()
            .filter(|(_, d)| d.is_finite())
            .map(|(&id, _)| id)
            .collect();
        self.steps.push(Step {
            explanation,
            label,
            visited_nodes: reached,
            distances: self.dist.clone(),
            edge_updates: change.edge_updates,
            path_edge_updates: change.path_edge_updates,
            updated_distances: change.updated_distances,
            current_edge: change.current_edge,
            negative_cycle_detected: self.negative_cycle,
            state: AlgorithmState::BellmanFord {
                iteration: self.iteration,
            },
        });
    }

    /// One relaxation pass; returns the number of improved distances.
    fn relax_all(&mut self) -> usize {
        let graph = self.graph;
        let mut relaxed = 0;

        for (edge, u, v) in graph.traversals() {
            let (from, to) = (self.name(u), self.name(v));
            let du = self.dist(u);
            if du.is_infinite() {
                self.record(
                    StepLabel::SkipUnreachable,
                    format!(
                        "Skip {from}→{to}: {from} has not been reached yet."
                    ),
                    StepChange::touching(&edge.id),
                );
                continue;
            }

            self.record(
                StepLabel::Candidate,
                format!("Consider edge {from}→{to} with weight {}.", edge.weight),
                StepChange::edge(&edge.id, EdgeStatus::Candidate),
            );

            let current = self.dist(v);
            let candidate = du + edge.weight;
            if candidate < current {
                self.dist.insert(v, candidate);
                self.prev.insert(v, (u, edge.id.clone()));
                relaxed += 1;
                self.record(
                    StepLabel::Relaxed,
                    format!(
                        "Relax {from}→{to}: {} + {} = {} improves on {}; \
                         update {to}.",
                        fmt_distance(du),
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
                        "{from}→{to} gives {}, no better than {}; keep the \
                         current distance.",
                        fmt_distance(candidate),
                        fmt_distance(current)
                    ),
                    StepChange::edge(&edge.id, EdgeStatus::Excluded),
                );
            }
        }
        relaxed
    }

    /// First edge that can still be relaxed after the main loop.
    fn find_violation(&self) -> Option<(NodeId, NodeId, EdgeId)> {
        self.graph.traversals().find_map(|(edge, u, v)| {
            let du = self.dist(u);
            (du.is_finite() && du + edge.weight < self.dist(v))
                .then(|| (u, v, edge.id.clone()))
        })
    }

    /// Edges of the cycle behind a violation on `u→v`. Walking `n`
    /// predecessor links from `v` lands inside the cycle.
    fn trace_cycle(&self, u: NodeId, v: NodeId, via: &EdgeId) -> BTreeSet<EdgeId> {
        let mut pred: BTreeMap<NodeId, (NodeId, EdgeId)> = self.prev.clone();
        pred.insert(v, (u, via.clone()));

        let mut at = v;
        for _ in 0..self.graph.node_count() {
            match pred.get(&at) {
                Some((p, _)) => at = *p,
                None => return BTreeSet::from([via.clone()]),
            }
        }

        let start = at;
        let mut cycle = BTreeSet::new();
        for _ in 0..=self.graph.node_count() {
            let Some((p, edge)) = pred.get(&at) else {
                break;
            };
            cycle.insert(edge.clone());
            at = *p;
            if at == start {
                return cycle;
            }
        }
        BTreeSet::from([via.clone()])
    }

    fn execute(mut self) -> AlgorithmRun {
        let source = self.source;
        let passes = self.graph.node_count().saturating_sub(1);

        self.record(
            StepLabel::Initialize,
            format!(
                "Set the distance of {} to 0 and every other node to ∞; \
                 up to {passes} passes over all edges follow.",
                self.name(source)
            ),
            StepChange {
                updated_distances: vec![source],
                ..StepChange::none()
            },
        );

        for i in 1..=passes {
            self.iteration = i;
            self.record(
                StepLabel::Iteration,
                format!("Pass {i} of {passes}: relax every edge in order."),
                StepChange::none(),
            );
            if self.relax_all() == 0 {
                self.record(
                    StepLabel::EarlyStop,
                    format!(
                        "Pass {i} changed no distance; the distances have \
                         converged, stop early."
                    ),
                    StepChange::none(),
                );
                break;
            }
        }

        let mut cycle_edges = BTreeSet::new();
        match self.find_violation() {
            Some((u, v, via)) => {
                cycle_edges = self.trace_cycle(u, v, &via);
                self.negative_cycle = true;
                self.record(
                    StepLabel::NegativeCycle,
                    format!(
                        "Edge {}→{} can still be relaxed after {passes} \
                         passes: a negative cycle is reachable from {}.",
                        self.name(u),
                        self.name(v),
                        self.name(source)
                    ),
                    StepChange {
                        current_edge: Some(via),
                        ..StepChange::cycle(&cycle_edges)
                    },
                );
            }
            None => {
                self.record(
                    StepLabel::CycleCheck,
                    "No edge can be relaxed any further: no negative cycle \
                     is reachable."
                        .to_string(),
                    StepChange::none(),
                );
            }
        }

        let (paths, tree_edges) = if self.negative_cycle {
            (BTreeMap::new(), BTreeSet::new())
        } else {
            reconstruct_paths(source, &self.dist, &self.prev)
        };

        let summary = if self.negative_cycle {
            "Finished: distances are undefined because of the negative \
             cycle, no shortest paths are reported."
                .to_string()
        } else {
            format!(
                "Finished: shortest paths from {} are final ({} reachable).",
                self.name(source),
                paths.len()
            )
        };
        self.record(StepLabel::Complete, summary, StepChange::cycle(&cycle_edges));

        tracing::debug!(
            steps = self.steps.len(),
            negative_cycle = self.negative_cycle,
            "bellman-ford run finished"
        );

        AlgorithmRun {
            algorithm: Algorithm::BellmanFord,
            source,
            result: ShortestPathResult {
                distances: self.dist,
                paths,
                has_negative_cycle: self.negative_cycle,
                tree_edges,
                cycle_edges,
            },
            steps: self.steps,
        }
    }
}

pub fn run(graph: &Graph, source: NodeId) -> Result<AlgorithmRun, RunError> {
    if !graph.contains_node(source) {
        return Err(RunError::UnknownSource(source));
    }
    Ok(BellmanFordRun::new(graph, source).execute())
}

//! Graph generator: layout -> topology -> weights -> optional negative
//! cycle, bundled into one graph plus its run parameters.

use crate::graph::{Edge, Graph, NodeId};
use crate::layout_circular::{SpacingConfig, circular_positions};
use crate::layout_spatial::{ScatterConfig, scattered_positions};
use crate::negative_cycle::inject_negative_cycle;
use crate::step::Algorithm;
use crate::topology::{build_topology, reconnect};
use crate::weights::{WeightAssigner, WeightMode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const NODE_COUNT_RANGE: RangeInclusive<usize> = 3..=15;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    #[default]
    Circular,
    /// Scattered positions; weights follow edge length.
    Spatial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub node_count: usize,
    pub density: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    pub allow_negative_edges: bool,
    pub is_directed: bool,
    pub graph_type: GraphType,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub algorithm: Algorithm,
    /// Inject a negative cycle. Only honoured for Bellman-Ford with
    /// negative edges allowed.
    pub negative_cycle: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            node_count: 8,
            density: 0.3,
            min_weight: 1.0,
            max_weight: 20.0,
            allow_negative_edges: false,
            is_directed: true,
            graph_type: GraphType::Circular,
            viewport_width: 800.0,
            viewport_height: 600.0,
            algorithm: Algorithm::Dijkstra,
            negative_cycle: false,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("node count {0} is outside 3..=15")]
    NodeCount(usize),
    #[error("density {0} is outside [0, 1]")]
    Density(f64),
    #[error("weight range [{min}, {max}] is empty or not finite")]
    WeightRange { min: f64, max: f64 },
    #[error("viewport {width}x{height} must be positive")]
    Viewport { width: f64, height: f64 },
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if !NODE_COUNT_RANGE.contains(&self.node_count) {
            return Err(GenerateError::NodeCount(self.node_count));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(GenerateError::Density(self.density));
        }
        if !self.min_weight.is_finite()
            || !self.max_weight.is_finite()
            || self.min_weight > self.max_weight
        {
            return Err(GenerateError::WeightRange {
                min: self.min_weight,
                max: self.max_weight,
            });
        }
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(GenerateError::Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
            });
        }
        Ok(())
    }

    pub fn wants_negative_cycle(&self) -> bool {
        self.negative_cycle
            && self.allow_negative_edges
            && self.algorithm == Algorithm::BellmanFord
    }

    pub fn weight_assigner(&self) -> WeightAssigner {
        let mode = match self.graph_type {
            GraphType::Circular => WeightMode::Random,
            GraphType::Spatial => WeightMode::Spatial {
                diagonal: self.viewport_width.hypot(self.viewport_height),
            },
        };
        WeightAssigner {
            algorithm: self.algorithm,
            min_weight: self.min_weight,
            max_weight: self.max_weight,
            allow_negative: self.allow_negative_edges,
            mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphParams {
    pub source_node: NodeId,
    pub has_negative_cycle: bool,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedGraph {
    pub graph: Graph,
    pub params: GraphParams,
}

pub fn generate_graph<R: Rng + ?Sized>(
    params: &GeneratorParams,
    rng: &mut R,
) -> Result<GeneratedGraph, GenerateError> {
    params.validate()?;

    let count = params.node_count;
    let (width, height) = (params.viewport_width, params.viewport_height);
    let nodes = match params.graph_type {
        GraphType::Circular => circular_positions(
            count,
            width,
            height,
            &SpacingConfig::default(),
            rng,
        ),
        GraphType::Spatial => scattered_positions(
            count,
            width,
            height,
            &ScatterConfig::default(),
            rng,
        ),
    };

    let source = rng.random_range(0..count);
    let undirected = !params.is_directed;
    let pairs = build_topology(
        &nodes,
        source,
        params.is_directed,
        params.density,
        params.algorithm,
        rng,
    );

    let assigner = params.weight_assigner();
    let edges: Vec<Edge> = pairs
        .into_iter()
        .map(|(a, b)| {
            let w = assigner.weight_for(&nodes[a], &nodes[b], undirected, rng);
            Edge::new(a, b, w, undirected)
        })
        .collect();
    let mut graph = Graph::new(nodes, edges);

    let mut has_negative_cycle = false;
    if params.wants_negative_cycle() {
        has_negative_cycle = inject_negative_cycle(&mut graph, rng).is_some();
        let repaired = reconnect(&mut graph, source, undirected, |a, b| {
            assigner.weight_for(a, b, undirected, rng)
        });
        if !repaired.is_empty() {
            tracing::debug!(?repaired, "reconnected nodes after injection");
        }
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edges.len(),
        source,
        has_negative_cycle,
        "generated graph"
    );

    Ok(GeneratedGraph {
        graph,
        params: GraphParams {
            source_node: source,
            has_negative_cycle,
            algorithm: params.algorithm,
        },
    })
}

/// Recompute weights from node distances when the graph is spatial.
/// Returns whether anything was recomputed.
pub fn respace_spatial_weights(graph: &mut Graph, params: &GeneratorParams) -> bool {
    if params.graph_type != GraphType::Spatial {
        return false;
    }
    params.weight_assigner().respace(graph);
    true
}

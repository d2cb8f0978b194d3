//! Graph model shared by the generator, the step generators and the
//! editing layer.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub type NodeId = usize;

/// Node label derived from its id: `A`..`Z`, then `A1`, `B1`, ...
pub fn node_label(id: NodeId) -> String {
    let letter = (b'A' + (id % 26) as u8) as char;
    match id / 26 {
        0 => letter.to_string(),
        round => format!("{letter}{round}"),
    }
}

// ------------------------------------------------------------------
// Nodes and edges
// ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl Node {
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            label: node_label(id),
        }
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Edge key, formatted as `"<source>-<target>"`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self(format!("{source}-{target}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation status of an edge. Recomputed by the runner for every
/// step index; never part of the graph's identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    #[default]
    Unvisited,
    Candidate,
    Included,
    Excluded,
    NegativeCycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    #[serde(default)]
    pub status: EdgeStatus,
    pub is_undirected: bool,
    pub is_negative: bool,
    #[serde(default)]
    pub in_negative_cycle: bool,
}

impl Edge {
    pub fn new(
        source: NodeId,
        target: NodeId,
        weight: f64,
        is_undirected: bool,
    ) -> Self {
        Self {
            id: EdgeId::new(source, target),
            source,
            target,
            weight,
            status: EdgeStatus::Unvisited,
            is_undirected,
            is_negative: weight < 0.0,
            in_negative_cycle: false,
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
        self.is_negative = weight < 0.0;
    }

    /// Whether this edge links `a` and `b` in either orientation.
    pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b)
            || (self.source == b && self.target == a)
    }

    /// Traversal directions honoured by neighbor lookup.
    pub fn directions(&self) -> impl Iterator<Item = (NodeId, NodeId)> {
        let forward = (self.source, self.target);
        let backward = self
            .is_undirected
            .then_some((self.target, self.source));
        std::iter::once(forward).chain(backward)
    }
}

// ------------------------------------------------------------------
// Graph
// ------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeId),
    #[error("edge {0} already exists")]
    DuplicateEdge(EdgeId),
    #[error("self loops are not allowed (node {0})")]
    SelfLoop(NodeId),
    #[error("weight {0} is not a finite number")]
    NonFiniteWeight(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| &e.id == id)
    }

    /// Edge usable to travel from `source` to `target`, if any.
    pub fn edge_between(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> Option<&Edge> {
        self.edges.iter().find(|e| {
            (e.source == source && e.target == target)
                || (e.is_undirected
                    && e.source == target
                    && e.target == source)
        })
    }

    /// Outgoing `(edge, neighbor)` pairs of `u`, in edge array order.
    pub fn neighbors(&self, u: NodeId) -> Vec<(&Edge, NodeId)> {
        self.edges
            .iter()
            .filter_map(|e| {
                if e.source == u {
                    Some((e, e.target))
                } else if e.is_undirected && e.target == u {
                    Some((e, e.source))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Every `(edge, from, to)` traversal in edge array order. An
    /// undirected edge yields its forward direction, then its reverse.
    pub fn traversals(
        &self,
    ) -> impl Iterator<Item = (&Edge, NodeId, NodeId)> + '_ {
        self.edges
            .iter()
            .flat_map(|e| e.directions().map(move |(u, v)| (e, u, v)))
    }

    pub fn next_node_id(&self) -> NodeId {
        self.nodes.iter().map(|n| n.id + 1).max().unwrap_or(0)
    }

    pub fn add_node(&mut self, x: f64, y: f64) -> NodeId {
        let id = self.next_node_id();
        self.nodes.push(Node::new(id, x, y));
        id
    }

    /// Remove a node together with every incident edge.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(GraphError::UnknownNode(id))?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(self.nodes.remove(pos))
    }

    pub fn move_node(
        &mut self,
        id: NodeId,
        x: f64,
        y: f64,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(GraphError::UnknownNode(id))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: f64,
        is_undirected: bool,
    ) -> Result<EdgeId, GraphError> {
        for id in [source, target] {
            if !self.contains_node(id) {
                return Err(GraphError::UnknownNode(id));
            }
        }
        if source == target {
            return Err(GraphError::SelfLoop(source));
        }
        if !weight.is_finite() {
            return Err(GraphError::NonFiniteWeight(weight));
        }
        let clash = self.edges.iter().find(|e| {
            (e.source == source && e.target == target)
                || ((is_undirected || e.is_undirected)
                    && e.joins(source, target))
        });
        if let Some(existing) = clash {
            return Err(GraphError::DuplicateEdge(existing.id.clone()));
        }
        let edge = Edge::new(source, target, weight, is_undirected);
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, GraphError> {
        let pos = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| GraphError::UnknownEdge(id.clone()))?;
        Ok(self.edges.remove(pos))
    }

    pub fn set_weight(
        &mut self,
        id: &EdgeId,
        weight: f64,
    ) -> Result<(), GraphError> {
        if !weight.is_finite() {
            return Err(GraphError::NonFiniteWeight(weight));
        }
        let edge = self
            .edge_mut(id)
            .ok_or_else(|| GraphError::UnknownEdge(id.clone()))?;
        edge.set_weight(weight);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Directed petgraph view: undirected edges contribute both
    /// directions. Returns the graph and the id -> index map.
    pub fn to_stable_graph(
        &self,
    ) -> (StableGraph<NodeId, f64>, HashMap<NodeId, NodeIndex>) {
        let mut g = StableGraph::new();
        let index: HashMap<NodeId, NodeIndex> = self
            .nodes
            .iter()
            .map(|n| (n.id, g.add_node(n.id)))
            .collect();
        for (edge, u, v) in self.traversals() {
            if let (Some(&a), Some(&b)) = (index.get(&u), index.get(&v)) {
                g.add_edge(a, b, edge.weight);
            }
        }
        (g, index)
    }

    /// Nodes reachable from `source`, including itself.
    pub fn reachable_from(&self, source: NodeId) -> BTreeSet<NodeId> {
        let (g, index) = self.to_stable_graph();
        let mut reached = BTreeSet::new();
        if let Some(&start) = index.get(&source) {
            let mut bfs = Bfs::new(&g, start);
            while let Some(nx) = bfs.next(&g) {
                if let Some(&id) = g.node_weight(nx) {
                    reached.insert(id);
                }
            }
        }
        reached
    }

    /// Whether edge ids are unique and every endpoint exists.
    pub fn is_consistent(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.edges.iter().all(|e| {
            seen.insert(e.id.clone())
                && e.id == EdgeId::new(e.source, e.target)
                && self.contains_node(e.source)
                && self.contains_node(e.target)
        })
    }
}

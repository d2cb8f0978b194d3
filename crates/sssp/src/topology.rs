//! Edge topology for generated graphs.
//!
//! Every ordered pair of nodes is a candidate edge scored by its
//! *adjusted distance*: the Euclidean length inflated by how far apart
//! the two endpoints sit on the ring. A spanning structure grown from
//! the source guarantees reachability; further candidates are then
//! added until the requested density is met.

use crate::graph::{Graph, Node, NodeId};
use crate::layout_circular::circular_separation;
use crate::step::Algorithm;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Extra cost factor at maximal ring separation.
pub const SEPARATION_PENALTY: f64 = 1.5;
/// Probability of dropping an edge whose reverse is already present.
pub const REVERSE_SKIP_PROBABILITY: f64 = 0.75;
/// Edges spanning more than this fraction of the maximal separation
/// cut across the centre of the ring.
pub const CENTER_CROSSING_FRACTION: f64 = 0.6;
/// Probability of dropping a centre-crossing edge.
pub const CENTER_SKIP_PROBABILITY: f64 = 0.8;
/// Relative jitter applied to adjusted distances before selection.
pub const SELECTION_JITTER: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub source: NodeId,
    pub target: NodeId,
    pub distance: f64,
    pub separation: usize,
    pub adjusted: f64,
}

pub fn max_separation(count: usize) -> usize {
    (count / 2).max(1)
}

pub fn adjusted_distance(distance: f64, separation: usize, count: usize) -> f64 {
    let ratio = separation as f64 / max_separation(count) as f64;
    distance * (1.0 + SEPARATION_PENALTY * ratio)
}

/// All ordered pairs of distinct nodes. Ring separation is measured on
/// positions in `nodes`, which follow the layout order.
pub fn candidate_edges(nodes: &[Node]) -> Vec<Candidate> {
    let count = nodes.len();
    let mut out = Vec::with_capacity(count * count.saturating_sub(1));
    for (i, a) in nodes.iter().enumerate() {
        for (j, b) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let distance = a.distance_to(b);
            let separation = circular_separation(i, j, count);
            out.push(Candidate {
                source: a.id,
                target: b.id,
                distance,
                separation,
                adjusted: adjusted_distance(distance, separation, count),
            });
        }
    }
    out
}

fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    (a.min(b), a.max(b))
}

/// Grow a spanning structure from `source`: pop a node, link it to the
/// closest (adjusted) node not yet connected, queue that node. When the
/// queue runs dry early, a random connected node is requeued.
pub fn spanning_edges<R: Rng + ?Sized>(
    nodes: &[Node],
    candidates: &[Candidate],
    source: NodeId,
    rng: &mut R,
) -> Vec<(NodeId, NodeId)> {
    let total = nodes.len();
    let mut tree = Vec::with_capacity(total.saturating_sub(1));
    if total == 0 || !nodes.iter().any(|n| n.id == source) {
        return tree;
    }

    let mut connected: BTreeSet<NodeId> = BTreeSet::from([source]);
    let mut order: Vec<NodeId> = vec![source];
    let mut queue: VecDeque<NodeId> = VecDeque::from([source]);

    while connected.len() < total {
        let Some(u) = queue.pop_front() else {
            if let Some(&again) = order.choose(rng) {
                queue.push_back(again);
            }
            continue;
        };
        let best = candidates
            .iter()
            .filter(|c| c.source == u && !connected.contains(&c.target))
            .min_by(|a, b| a.adjusted.total_cmp(&b.adjusted));
        if let Some(c) = best {
            connected.insert(c.target);
            order.push(c.target);
            queue.push_back(c.target);
            tree.push((u, c.target));
        }
    }
    tree
}

/// Density after scaling down for large graphs and nudging per
/// algorithm (Dijkstra a little denser to show more path options).
pub fn effective_density(density: f64, count: usize, algorithm: Algorithm) -> f64 {
    let scale = (1.0 - count.saturating_sub(6) as f64 * 0.05).clamp(0.5, 1.0);
    let nudge = match algorithm {
        Algorithm::Dijkstra => 1.1,
        Algorithm::BellmanFord => 1.0,
    };
    (density.clamp(0.0, 1.0) * scale * nudge).clamp(0.0, 1.0)
}

pub fn max_edge_count(count: usize, directed: bool) -> usize {
    let ordered = count * count.saturating_sub(1);
    if directed { ordered } else { ordered / 2 }
}

pub fn target_edge_count(
    density: f64,
    count: usize,
    directed: bool,
    algorithm: Algorithm,
) -> usize {
    let max = max_edge_count(count, directed);
    let wanted =
        (max as f64 * effective_density(density, count, algorithm)).ceil();
    (wanted as usize).min(max)
}

/// Spanning structure plus density fill. For undirected graphs each
/// unordered pair appears at most once.
pub fn build_topology<R: Rng + ?Sized>(
    nodes: &[Node],
    source: NodeId,
    directed: bool,
    density: f64,
    algorithm: Algorithm,
    rng: &mut R,
) -> Vec<(NodeId, NodeId)> {
    let count = nodes.len();
    let candidates = candidate_edges(nodes);
    let mut chosen = spanning_edges(nodes, &candidates, source, rng);

    let mut present: HashSet<(NodeId, NodeId)> =
        chosen.iter().copied().collect();
    let mut pairs: HashSet<(NodeId, NodeId)> =
        chosen.iter().map(|&(a, b)| pair_key(a, b)).collect();

    let target = target_edge_count(density, count, directed, algorithm)
        .max(chosen.len());
    let crossing_limit =
        CENTER_CROSSING_FRACTION * max_separation(count) as f64;

    let mut rest: Vec<(f64, Candidate)> = candidates
        .into_iter()
        .filter(|c| !present.contains(&(c.source, c.target)))
        .map(|c| {
            let jitter = 1.0
                + (rng.random::<f64>() * 2.0 - 1.0) * SELECTION_JITTER;
            (c.adjusted * jitter, c)
        })
        .collect();
    rest.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (_, c) in rest {
        if chosen.len() >= target {
            break;
        }
        let key = pair_key(c.source, c.target);
        if !directed && pairs.contains(&key) {
            continue;
        }
        if directed
            && present.contains(&(c.target, c.source))
            && rng.random_bool(REVERSE_SKIP_PROBABILITY)
        {
            continue;
        }
        if c.separation as f64 > crossing_limit
            && rng.random_bool(CENTER_SKIP_PROBABILITY)
        {
            continue;
        }
        present.insert((c.source, c.target));
        pairs.insert(key);
        chosen.push((c.source, c.target));
    }

    chosen
}

/// Re-establish reachability from `source` by linking each stranded
/// node from the reached set with the closest (adjusted) edge. Returns
/// the added edges.
pub fn reconnect(
    graph: &mut Graph,
    source: NodeId,
    undirected: bool,
    mut weight_for: impl FnMut(&Node, &Node) -> f64,
) -> Vec<(NodeId, NodeId)> {
    let count = graph.node_count();
    let mut added = Vec::new();
    loop {
        let reached = graph.reachable_from(source);
        if reached.len() >= count || reached.is_empty() {
            return added;
        }
        let mut best: Option<(f64, usize, usize)> = None;
        for (i, a) in graph.nodes.iter().enumerate() {
            if !reached.contains(&a.id) {
                continue;
            }
            for (j, b) in graph.nodes.iter().enumerate() {
                if reached.contains(&b.id) {
                    continue;
                }
                let score = adjusted_distance(
                    a.distance_to(b),
                    circular_separation(i, j, count),
                    count,
                );
                if best.is_none_or(|(s, _, _)| score < s) {
                    best = Some((score, i, j));
                }
            }
        }
        let Some((_, i, j)) = best else {
            return added;
        };
        let (a, b) = (&graph.nodes[i], &graph.nodes[j]);
        let (u, v) = (a.id, b.id);
        let weight = weight_for(a, b);
        if graph.add_edge(u, v, weight, undirected).is_err()
            && graph.add_edge(u, v, weight, false).is_err()
        {
            return added;
        }
        added.push((u, v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_circular::{SpacingConfig, circular_positions};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ring(count: usize, seed: u64) -> (Vec<Node>, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = circular_positions(
            count,
            800.0,
            600.0,
            &SpacingConfig::default(),
            &mut rng,
        );
        (nodes, rng)
    }

    fn reaches_all(count: usize, edges: &[(NodeId, NodeId)], source: NodeId) -> bool {
        let mut g = Graph::default();
        for _ in 0..count {
            g.add_node(0.0, 0.0);
        }
        for &(a, b) in edges {
            g.add_edge(a, b, 1.0, false).unwrap();
        }
        g.reachable_from(source).len() == count
    }

    #[test]
    fn test_candidates_cover_all_ordered_pairs() {
        let (nodes, _) = ring(5, 1);
        let candidates = candidate_edges(&nodes);
        assert_eq!(candidates.len(), 20);
        let far = candidates
            .iter()
            .find(|c| c.source == 0 && c.target == 2)
            .unwrap();
        assert_eq!(far.separation, 2);
        assert!(far.adjusted > far.distance);
    }

    #[test]
    fn test_spanning_edges_form_arborescence() {
        for seed in 0..20 {
            let (nodes, mut rng) = ring(9, seed);
            let source = (seed as usize) % 9;
            let candidates = candidate_edges(&nodes);
            let tree = spanning_edges(&nodes, &candidates, source, &mut rng);
            assert_eq!(tree.len(), 8);
            assert!(reaches_all(9, &tree, source));
        }
    }

    #[test]
    fn test_density_bounds() {
        assert_eq!(max_edge_count(5, true), 20);
        assert_eq!(max_edge_count(5, false), 10);
        assert_eq!(target_edge_count(1.0, 5, true, Algorithm::BellmanFord), 20);
        assert_eq!(target_edge_count(0.0, 5, true, Algorithm::Dijkstra), 0);
        assert!(
            effective_density(0.5, 15, Algorithm::BellmanFord)
                < effective_density(0.5, 5, Algorithm::BellmanFord)
        );
        assert!(
            effective_density(0.5, 8, Algorithm::Dijkstra)
                > effective_density(0.5, 8, Algorithm::BellmanFord)
        );
    }

    #[test]
    fn test_undirected_topology_has_no_pair_twice() {
        let (nodes, mut rng) = ring(8, 5);
        let edges =
            build_topology(&nodes, 0, false, 0.9, Algorithm::Dijkstra, &mut rng);
        let pairs: HashSet<(NodeId, NodeId)> =
            edges.iter().map(|&(a, b)| pair_key(a, b)).collect();
        assert_eq!(pairs.len(), edges.len());
        assert!(edges.len() >= 7);
    }

    #[test]
    fn test_zero_density_keeps_tree_only() {
        let (nodes, mut rng) = ring(6, 2);
        let edges =
            build_topology(&nodes, 3, true, 0.0, Algorithm::Dijkstra, &mut rng);
        assert_eq!(edges.len(), 5);
        assert!(reaches_all(6, &edges, 3));
    }

    #[test]
    fn test_reconnect_links_stranded_nodes() {
        let (nodes, _) = ring(4, 9);
        let mut g = Graph::new(nodes, Vec::new());
        g.add_edge(0, 1, 1.0, false).unwrap();
        let added = reconnect(&mut g, 0, false, |_, _| 2.0);
        assert_eq!(added.len(), 2);
        assert_eq!(g.reachable_from(0).len(), 4);
    }
}

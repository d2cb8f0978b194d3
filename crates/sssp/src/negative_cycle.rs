use crate::graph::{Edge, Graph, NodeId};
use rand::Rng;
use std::collections::HashSet;

/// Ring length used for injection on a graph of `count` nodes. A ring
/// never shrinks below two nodes, a one-node ring would be a self loop.
pub fn cycle_size(count: usize) -> usize {
    if count < 2 { 0 } else { (count / 2).clamp(2, 3) }
}

/// Overwrite a small directed ring of consecutive nodes so that its
/// total weight is strictly negative.
///
/// Existing edges between consecutive ring nodes are replaced, and any
/// edge that would form a bidirectional pair with a ring edge is
/// deleted. Returns the ring, or `None` when the graph is too small.
///
/// Deleting edges can strand nodes; callers that need reachability
/// follow up with [`crate::topology::reconnect`].
pub fn inject_negative_cycle<R: Rng + ?Sized>(
    graph: &mut Graph,
    rng: &mut R,
) -> Option<Vec<NodeId>> {
    let count = graph.node_count();
    let size = cycle_size(count);
    if size < 2 {
        return None;
    }

    let start = rng.random_range(0..count);
    let ring: Vec<NodeId> = (0..size)
        .map(|k| graph.nodes[(start + k) % count].id)
        .collect();
    let arcs: Vec<(NodeId, NodeId)> = (0..size)
        .map(|k| (ring[k], ring[(k + 1) % size]))
        .collect();
    let wanted: HashSet<(NodeId, NodeId)> = arcs.iter().copied().collect();

    // Drop everything joining two consecutive ring nodes that is not
    // itself a directed ring arc.
    graph.edges.retain(|e| {
        let joins_ring = arcs.iter().any(|&(a, b)| e.joins(a, b));
        !joins_ring
            || (!e.is_undirected && wanted.contains(&(e.source, e.target)))
    });

    let mut weights: Vec<f64> =
        (0..size).map(|_| rng.random_range(1..=3) as f64).collect();
    let sum: f64 = weights.iter().sum();
    let extra = rng.random_range(1..=3) as f64;
    if let Some(last) = weights.last_mut() {
        *last = -(sum + extra);
    }

    for (&(a, b), &w) in arcs.iter().zip(&weights) {
        let at = match graph
            .edges
            .iter()
            .position(|e| e.source == a && e.target == b)
        {
            Some(at) => at,
            None => {
                graph.edges.push(Edge::new(a, b, w, false));
                graph.edges.len() - 1
            }
        };
        let edge = &mut graph.edges[at];
        edge.set_weight(w);
        edge.is_undirected = false;
        edge.in_negative_cycle = true;
    }

    tracing::debug!(?ring, "injected negative cycle");
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn line(count: usize, undirected: bool) -> Graph {
        let mut g = Graph::default();
        for i in 0..count {
            g.add_node(i as f64, 0.0);
        }
        for i in 0..count {
            let j = (i + 1) % count;
            let _ = g.add_edge(i, j, 5.0, undirected);
            let _ = g.add_edge(j, i, 5.0, undirected);
        }
        g
    }

    #[test]
    fn test_cycle_size() {
        assert_eq!(cycle_size(1), 0);
        assert_eq!(cycle_size(2), 2);
        assert_eq!(cycle_size(3), 2);
        assert_eq!(cycle_size(6), 3);
        assert_eq!(cycle_size(15), 3);
    }

    #[test]
    fn test_ring_sum_is_negative() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut g = line(7, false);
            let ring = inject_negative_cycle(&mut g, &mut rng).unwrap();
            assert_eq!(ring.len(), 3);

            let ring_edges: Vec<&Edge> =
                g.edges.iter().filter(|e| e.in_negative_cycle).collect();
            assert_eq!(ring_edges.len(), 3);
            let total: f64 = ring_edges.iter().map(|e| e.weight).sum();
            assert!(total < 0.0);
            assert!(g.is_consistent());

            // No reverse edge survives between consecutive ring nodes.
            for k in 0..3 {
                let (a, b) = (ring[k], ring[(k + 1) % 3]);
                assert!(g.edge(&EdgeId::new(b, a)).is_none());
            }
        }
    }

    #[test]
    fn test_undirected_pairs_become_directed_ring() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut g = line(6, true);
        inject_negative_cycle(&mut g, &mut rng).unwrap();
        let ring: Vec<&Edge> =
            g.edges.iter().filter(|e| e.in_negative_cycle).collect();
        assert_eq!(ring.len(), 3);
        assert!(ring.iter().all(|e| !e.is_undirected));
        assert!(g.is_consistent());
    }

    #[test]
    fn test_two_node_ring() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut g = line(2, false);
        let ring = inject_negative_cycle(&mut g, &mut rng).unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(g.edges.len(), 2);
        assert!(g.edges.iter().map(|e| e.weight).sum::<f64>() < 0.0);
    }

    #[test]
    fn test_too_small() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = line(1, false);
        assert!(inject_negative_cycle(&mut g, &mut rng).is_none());
    }
}

//! Property-based tests for the generator and both step generators.
//!
//! Properties verified:
//! - Every generated graph is reachable from its source
//! - Dijkstra agrees with petgraph and with brute-force enumeration
//! - Bellman-Ford agrees with petgraph, including cycle detection
//! - Negative cycles are detected exactly when one is reachable

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sssp::{
    Algorithm, GeneratorParams, Graph, GraphType, NodeId, generate_graph,
};

fn reference_graph(graph: &Graph) -> petgraph::Graph<(), f64> {
    let mut g = petgraph::Graph::new();
    let index: Vec<_> = graph.nodes.iter().map(|_| g.add_node(())).collect();
    for (edge, u, v) in graph.traversals() {
        g.add_edge(index[u], index[v], edge.weight);
    }
    g
}

fn params(
    node_count: usize,
    density: f64,
    directed: bool,
    spatial: bool,
    algorithm: Algorithm,
) -> GeneratorParams {
    GeneratorParams {
        node_count,
        density,
        is_directed: directed,
        graph_type: if spatial {
            GraphType::Spatial
        } else {
            GraphType::Circular
        },
        algorithm,
        ..Default::default()
    }
}

/// Cheapest simple path weight by exhaustive search.
fn brute_force(graph: &Graph, source: NodeId) -> Vec<f64> {
    fn walk(
        graph: &Graph,
        at: NodeId,
        cost: f64,
        on_path: &mut Vec<bool>,
        best: &mut Vec<f64>,
    ) {
        if cost < best[at] {
            best[at] = cost;
        }
        for (edge, next) in graph.neighbors(at) {
            if !on_path[next] {
                on_path[next] = true;
                walk(graph, next, cost + edge.weight, on_path, best);
                on_path[next] = false;
            }
        }
    }
    let n = graph.node_count();
    let mut best = vec![f64::INFINITY; n];
    let mut on_path = vec![false; n];
    on_path[source] = true;
    walk(graph, source, 0.0, &mut on_path, &mut best);
    best
}

// ==========================================================================
// PROPERTY: Connectivity
// ==========================================================================

proptest! {
    #[test]
    fn prop_generated_graphs_reach_every_node(
        seed in any::<u64>(),
        node_count in 3usize..=15,
        density in 0.0f64..=1.0,
        directed in any::<bool>(),
        spatial in any::<bool>(),
        bellman in any::<bool>(),
        negative_cycle in any::<bool>(),
    ) {
        let algorithm = if bellman { Algorithm::BellmanFord } else { Algorithm::Dijkstra };
        let p = GeneratorParams {
            allow_negative_edges: bellman,
            negative_cycle,
            ..params(node_count, density, directed, spatial, algorithm)
        };
        let out = generate_graph(&p, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert!(out.graph.is_consistent());
        prop_assert_eq!(
            out.graph.reachable_from(out.params.source_node).len(),
            node_count
        );
        prop_assert_eq!(out.params.has_negative_cycle, p.wants_negative_cycle());
    }
}

// ==========================================================================
// PROPERTY: Correctness against references
// ==========================================================================

proptest! {
    #[test]
    fn prop_dijkstra_matches_petgraph(
        seed in any::<u64>(),
        node_count in 3usize..=15,
        density in 0.0f64..=1.0,
        directed in any::<bool>(),
    ) {
        let p = params(node_count, density, directed, false, Algorithm::Dijkstra);
        let out = generate_graph(&p, &mut StdRng::seed_from_u64(seed)).unwrap();
        let source = out.params.source_node;
        let run = Algorithm::Dijkstra.run(&out.graph, source).unwrap();

        let g = reference_graph(&out.graph);
        let start = petgraph::graph::NodeIndex::new(source);
        let expected = petgraph::algo::dijkstra(&g, start, None, |e| *e.weight());
        for id in 0..node_count {
            let want = expected
                .get(&petgraph::graph::NodeIndex::new(id))
                .copied()
                .unwrap_or(f64::INFINITY);
            prop_assert_eq!(run.result.distance(id), want);
        }
        prop_assert_eq!(run.result.paths.len(), node_count);
    }

    #[test]
    fn prop_dijkstra_matches_brute_force(
        seed in any::<u64>(),
        node_count in 3usize..=6,
        density in 0.0f64..=1.0,
    ) {
        let p = params(node_count, density, true, false, Algorithm::Dijkstra);
        let out = generate_graph(&p, &mut StdRng::seed_from_u64(seed)).unwrap();
        let source = out.params.source_node;
        let run = Algorithm::Dijkstra.run(&out.graph, source).unwrap();
        let best = brute_force(&out.graph, source);

        for id in 0..node_count {
            prop_assert_eq!(run.result.distance(id), best[id]);
            let path = run.result.path(id).unwrap();
            let cost: f64 = path
                .windows(2)
                .map(|w| out.graph.edge_between(w[0], w[1]).unwrap().weight)
                .sum();
            prop_assert_eq!(cost, best[id]);
        }
    }

    #[test]
    fn prop_bellman_ford_matches_petgraph(
        seed in any::<u64>(),
        node_count in 3usize..=12,
        density in 0.0f64..=1.0,
        directed in any::<bool>(),
        negative_cycle in any::<bool>(),
    ) {
        let p = GeneratorParams {
            allow_negative_edges: true,
            negative_cycle,
            min_weight: 1.0,
            max_weight: 15.0,
            ..params(node_count, density, directed, false, Algorithm::BellmanFord)
        };
        let out = generate_graph(&p, &mut StdRng::seed_from_u64(seed)).unwrap();
        let source = out.params.source_node;
        let run = Algorithm::BellmanFord.run(&out.graph, source).unwrap();

        let g = reference_graph(&out.graph);
        let start = petgraph::graph::NodeIndex::new(source);
        match petgraph::algo::bellman_ford(&g, start) {
            Err(_) => {
                prop_assert!(run.result.has_negative_cycle);
                prop_assert!(run.result.paths.is_empty());
            }
            Ok(paths) => {
                prop_assert!(!run.result.has_negative_cycle);
                for id in 0..node_count {
                    prop_assert_eq!(run.result.distance(id), paths.distances[id]);
                }
            }
        }
        if out.params.has_negative_cycle {
            prop_assert!(run.result.has_negative_cycle);
        }
        let last = run.steps.last().unwrap();
        prop_assert_eq!(last.negative_cycle_detected, run.result.has_negative_cycle);
    }
}

// ==========================================================================
// PROPERTY: Negative cycle soundness
// ==========================================================================

proptest! {
    /// Edges only point from lower to higher ids, so no cycle exists
    /// however negative the weights are.
    #[test]
    fn prop_acyclic_graphs_have_no_negative_cycle(
        weights in proptest::collection::vec(-20.0f64..20.0, 15),
        node_count in 3usize..=6,
    ) {
        let mut g = Graph::default();
        for i in 0..node_count {
            g.add_node(i as f64, 0.0);
        }
        let mut w = weights.iter();
        for a in 0..node_count {
            for b in (a + 1)..node_count {
                if let Some(&weight) = w.next() {
                    g.add_edge(a, b, weight.round(), false).unwrap();
                }
            }
        }
        let run = Algorithm::BellmanFord.run(&g, 0).unwrap();
        prop_assert!(!run.result.has_negative_cycle);
        prop_assert!(run.steps.iter().all(|s| !s.negative_cycle_detected));
    }

    #[test]
    fn prop_non_negative_graphs_have_no_negative_cycle(
        seed in any::<u64>(),
        node_count in 3usize..=15,
        density in 0.0f64..=1.0,
        directed in any::<bool>(),
    ) {
        let p = params(node_count, density, directed, false, Algorithm::BellmanFord);
        let out = generate_graph(&p, &mut StdRng::seed_from_u64(seed)).unwrap();
        let run = Algorithm::BellmanFord
            .run(&out.graph, out.params.source_node)
            .unwrap();
        prop_assert!(!run.result.has_negative_cycle);
        prop_assert_eq!(run.result.paths.len(), node_count);
    }

    /// A negative configured minimum alone never yields negative edges:
    /// those need `allow_negative_edges`, and undirected edges never get
    /// them at all.
    #[test]
    fn prop_negative_minimum_keeps_contract(
        seed in any::<u64>(),
        node_count in 3usize..=12,
        density in 0.0f64..=1.0,
        directed in any::<bool>(),
        allow_negative in any::<bool>(),
        min_weight in -50.0f64..0.0,
    ) {
        let p = GeneratorParams {
            allow_negative_edges: allow_negative,
            min_weight: min_weight.round(),
            max_weight: 20.0,
            ..params(node_count, density, directed, false, Algorithm::BellmanFord)
        };
        let out = generate_graph(&p, &mut StdRng::seed_from_u64(seed)).unwrap();
        if !allow_negative || !directed {
            prop_assert!(out.graph.edges.iter().all(|e| e.weight >= 0.0));
            let run = Algorithm::BellmanFord
                .run(&out.graph, out.params.source_node)
                .unwrap();
            prop_assert!(!run.result.has_negative_cycle);
        }
    }
}

#[test]
fn test_four_node_example() {
    // A→B(1), B→C(2), A→C(10), C→D(1)
    let mut g = Graph::default();
    for i in 0..4 {
        g.add_node(i as f64, 0.0);
    }
    for (a, b, w) in [(0, 1, 1.0), (1, 2, 2.0), (0, 2, 10.0), (2, 3, 1.0)] {
        g.add_edge(a, b, w, false).unwrap();
    }
    let run = Algorithm::Dijkstra.run(&g, 0).unwrap();
    let distances: Vec<f64> = (0..4).map(|i| run.result.distance(i)).collect();
    assert_eq!(distances, vec![0.0, 1.0, 3.0, 4.0]);
    assert_eq!(run.result.path(3), Some(&[0, 1, 2, 3][..]));
    assert_eq!(brute_force(&g, 0), distances);
}

#[test]
fn test_three_node_negative_ring() {
    let mut g = Graph::default();
    for i in 0..3 {
        g.add_node(i as f64, 0.0);
    }
    for (a, b, w) in [(0, 1, 2.0), (1, 2, 2.0), (2, 0, -10.0)] {
        g.add_edge(a, b, w, false).unwrap();
    }
    let mut delivered = None;
    let steps = Algorithm::BellmanFord
        .generate_steps(&g, 0, |result| delivered = Some(result))
        .unwrap();
    let result = delivered.unwrap();
    assert!(result.has_negative_cycle);
    assert!(result.paths.is_empty());
    assert!(steps.last().unwrap().negative_cycle_detected);
}

use crate::graph::{Graph, Node};
use crate::step::Algorithm;
use rand::Rng;

/// Share of the viewport diagonal that maps onto the full weight span.
pub const SPATIAL_DIAGONAL_FRACTION: f64 = 0.7;
/// Chance that a Bellman-Ford edge turns negative when allowed.
pub const NEGATIVE_PROBABILITY: f64 = 0.25;

/// How edge weights are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightMode {
    /// Algorithm-specific random distributions.
    Random,
    /// Linear in the Euclidean length of the edge.
    Spatial { diagonal: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightAssigner {
    pub algorithm: Algorithm,
    pub min_weight: f64,
    pub max_weight: f64,
    pub allow_negative: bool,
    pub mode: WeightMode,
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + rng.random::<f64>() * (hi - lo)
}

impl WeightAssigner {
    /// Bounds of the base draw. The base draw never goes below zero, so
    /// negative weights only come from the explicit negative branch; an
    /// inverted range collapses onto its minimum.
    pub fn bounds(&self) -> (f64, f64) {
        let lo = self.min_weight.max(0.0);
        (lo, self.max_weight.max(lo))
    }

    /// Dijkstra: 30% small, then 40% of the rest medium, else large.
    fn tiered<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = self.bounds();
        let span = hi - lo;
        let w = if rng.random_bool(0.3) {
            uniform(rng, lo, lo + 0.2 * span)
        } else if rng.random_bool(0.4) {
            uniform(rng, lo + 0.2 * span, lo + 0.6 * span)
        } else {
            uniform(rng, lo + 0.6 * span, hi)
        };
        w.round().max(0.0)
    }

    /// Bellman-Ford: 70% uniform, else biased to the top of the range,
    /// with an independent chance of turning negative.
    fn wide<R: Rng + ?Sized>(&self, undirected: bool, rng: &mut R) -> f64 {
        let (lo, hi) = self.bounds();
        let span = hi - lo;
        let mut w = if rng.random_bool(0.7) {
            uniform(rng, lo, hi)
        } else {
            uniform(rng, lo + 0.5 * span, hi)
        };
        // A negative undirected edge is a two-edge negative cycle.
        if self.allow_negative
            && !undirected
            && rng.random_bool(NEGATIVE_PROBABILITY)
        {
            let floor = lo.max(1.0);
            w = -uniform(rng, floor, span + floor);
        }
        w.round()
    }

    pub fn spatial_weight(&self, a: &Node, b: &Node) -> f64 {
        let (lo, hi) = self.bounds();
        let diagonal = match self.mode {
            WeightMode::Spatial { diagonal } => diagonal,
            WeightMode::Random => return lo,
        };
        let scale = (diagonal * SPATIAL_DIAGONAL_FRACTION).max(f64::EPSILON);
        let t = (a.distance_to(b) / scale).clamp(0.0, 1.0);
        (lo + t * (hi - lo)).round().max(lo.ceil())
    }

    pub fn weight_for<R: Rng + ?Sized>(
        &self,
        a: &Node,
        b: &Node,
        undirected: bool,
        rng: &mut R,
    ) -> f64 {
        match (self.mode, self.algorithm) {
            (WeightMode::Spatial { .. }, _) => self.spatial_weight(a, b),
            (WeightMode::Random, Algorithm::Dijkstra) => self.tiered(rng),
            (WeightMode::Random, Algorithm::BellmanFord) => {
                self.wide(undirected, rng)
            }
        }
    }

    /// Recompute every edge from node distance. Keeps the "weight is
    /// physical length" invariant after drags and resizes.
    pub fn respace(&self, graph: &mut Graph) {
        let Graph { nodes, edges } = graph;
        for edge in edges.iter_mut() {
            let a = nodes.iter().find(|n| n.id == edge.source);
            let b = nodes.iter().find(|n| n.id == edge.target);
            if let (Some(a), Some(b)) = (a, b) {
                edge.set_weight(self.spatial_weight(a, b));
            }
        }
    }
}

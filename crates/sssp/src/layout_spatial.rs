use crate::graph::Node;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for the scattered layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScatterConfig {
    /// Border kept free on every side, as a fraction of the smaller side
    pub padding_fraction: f64,
    /// Minimum spacing as a fraction of `sqrt(area / count)`
    pub spacing_factor: f64,
    /// Number of relaxation passes
    pub iterations: usize,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            padding_fraction: 0.08,
            spacing_factor: 0.65,
            iterations: 60,
        }
    }
}

/// Scatter `count` nodes uniformly in the padded viewport, then push
/// apart any pair closer than the minimum spacing. Positions are
/// clamped back into the padded area after every pass.
pub fn scattered_positions<R: Rng + ?Sized>(
    count: usize,
    width: f64,
    height: f64,
    config: &ScatterConfig,
    rng: &mut R,
) -> Vec<Node> {
    if count == 0 {
        return Vec::new();
    }

    let pad = width.min(height) * config.padding_fraction;
    let (min_x, max_x) = (pad, (width - pad).max(pad));
    let (min_y, max_y) = (pad, (height - pad).max(pad));
    let area = (max_x - min_x) * (max_y - min_y);
    let min_dist = (area / count as f64).sqrt() * config.spacing_factor;

    let mut points: Vec<(f64, f64)> = (0..count)
        .map(|_| {
            (
                min_x + rng.random::<f64>() * (max_x - min_x),
                min_y + rng.random::<f64>() * (max_y - min_y),
            )
        })
        .collect();

    for _ in 0..config.iterations {
        let mut moved = false;
        for i in 0..count {
            for j in (i + 1)..count {
                let dx = points[j].0 - points[i].0;
                let dy = points[j].1 - points[i].1;
                let d = dx.hypot(dy);
                if d >= min_dist {
                    continue;
                }
                moved = true;
                // Coincident points get a random push direction.
                let (ux, uy) = if d < 1e-9 {
                    let a = rng.random::<f64>() * std::f64::consts::TAU;
                    (a.cos(), a.sin())
                } else {
                    (dx / d, dy / d)
                };
                let push = (min_dist - d) / 2.0;
                points[i].0 -= ux * push;
                points[i].1 -= uy * push;
                points[j].0 += ux * push;
                points[j].1 += uy * push;
            }
        }
        for p in &mut points {
            p.0 = p.0.clamp(min_x, max_x);
            p.1 = p.1.clamp(min_y, max_y);
        }
        if !moved {
            break;
        }
    }

    points
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| Node::new(i, x, y))
        .collect()
}

use crate::graph::Node;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for spacing/radius of the circular layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpacingConfig {
    /// Ring radius as a fraction of the smaller viewport side
    pub radius_fraction: f64,
    /// Maximum angular offset, as a fraction of the slot angle
    pub angle_jitter: f64,
    /// Maximum radial offset, as a fraction of the radius
    pub radius_jitter: f64,
}

impl SpacingConfig {
    pub fn without_jitter(mut self) -> Self {
        self.angle_jitter = 0.0;
        self.radius_jitter = 0.0;
        self
    }
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            radius_fraction: 0.38,
            angle_jitter: 0.18,
            radius_jitter: 0.06,
        }
    }
}

/// Place `count` nodes on a ring centred in the viewport, starting at
/// the top and going clockwise. Each slot is perturbed slightly so the
/// ring does not look perfectly symmetric.
pub fn circular_positions<R: Rng + ?Sized>(
    count: usize,
    width: f64,
    height: f64,
    spacing: &SpacingConfig,
    rng: &mut R,
) -> Vec<Node> {
    if count == 0 {
        return Vec::new();
    }

    let center_x = width / 2.0;
    let center_y = height / 2.0;
    let radius = width.min(height) * spacing.radius_fraction;
    let slot = 2.0 * PI / count as f64;

    (0..count)
        .map(|i| {
            let angle_offset =
                (rng.random::<f64>() * 2.0 - 1.0) * spacing.angle_jitter;
            let radius_offset =
                (rng.random::<f64>() * 2.0 - 1.0) * spacing.radius_jitter;
            let angle = -PI / 2.0 + (i as f64 + angle_offset) * slot;
            let r = radius * (1.0 + radius_offset);
            Node::new(
                i,
                center_x + r * angle.cos(),
                center_y + r * angle.sin(),
            )
        })
        .collect()
}

/// Ring distance between two slot indices.
pub fn circular_separation(a: usize, b: usize, count: usize) -> usize {
    let d = a.abs_diff(b);
    d.min(count.saturating_sub(d))
}

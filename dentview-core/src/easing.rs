//! Easing curves for band progress.
//!
//! Curves map progress in `[0, 1]` onto `[0, 1]`; inputs are clamped.

use serde::{Deserialize, Serialize};

/// Progress remapping applied before blending two poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// No remapping
    Linear,
    /// Accelerate through the first half, decelerate through the second
    #[default]
    QuadraticInOut,
}

impl Easing {
    #[inline]
    pub fn evaluate(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Easing::Linear => t,
            Easing::QuadraticInOut => ease_in_out_quad(t),
        }
    }
}

/// `2p²` below the midpoint, `1 - (-2p + 2)² / 2` above it
#[inline]
pub fn ease_in_out_quad(p: f32) -> f32 {
    if p < 0.5 {
        2.0 * p * p
    } else {
        let q = -2.0 * p + 2.0;
        1.0 - q * q / 2.0
    }
}

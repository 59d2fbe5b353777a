//! Guarded scalar and vector interpolation.
//!
//! Every helper here must stay finite for `dt == 0` and zero-length
//! windows, since the sampler calls them unconditionally each step.

use glam::Vec3;
use tether_types::constants::EPSILON;

/// Clamps `x` into `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Linear interpolation `a + (b - a) * t` (no clamping of `t`).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise linear interpolation between two vectors.
#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Divides by `max(denominator, EPSILON)`.
///
/// Denominators here are durations and distances, which are
/// never meaningfully negative.
#[inline]
pub fn safe_div(numerator: f32, denominator: f32) -> f32 {
    numerator / denominator.max(EPSILON)
}

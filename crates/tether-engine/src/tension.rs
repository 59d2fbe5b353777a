//! Tension shaping and adaptive drive.
//!
//! Purely a feel layer: tension scales the spring-damper drive but never
//! feeds back into break thresholds.

use tether_math::{clamp01, lerp, safe_div, SpaceMode, Vec3};

use crate::backend::DriveParams;
use crate::config::{DriveConfig, TensionConfig};

/// `max(0, |filter(separation)| - |filter(rest)|)`.
///
/// Only lengthening counts. Compression and swinging around the rest
/// length read as zero.
#[inline]
pub fn stretch(space: SpaceMode, separation: Vec3, rest: Vec3) -> f32 {
    let s = space.length(separation) - space.length(rest);
    if s.is_finite() {
        s.max(0.0)
    } else {
        0.0
    }
}

/// `clamp01(stretch / max_distance)`.
#[inline]
pub fn normalized_stretch(stretch: f32, max_distance: f32) -> f32 {
    clamp01(safe_div(stretch, max_distance))
}

/// Stateless stretch → tension → drive mapping.
pub struct TensionModel;

impl TensionModel {
    /// Shapes normalized stretch into tension.
    ///
    /// Stretch inside the soft zone maps to zero; the remainder is
    /// rescaled to `[0, 1]` and run through the response curve.
    pub fn tension(config: &TensionConfig, normalized: f32) -> f32 {
        let soft = clamp01(config.soft_zone_fraction);
        let x = clamp01(safe_div(normalized - soft, 1.0 - soft));
        clamp01(config.curve.evaluate(x))
    }

    /// Drive parameters for this step.
    ///
    /// With adaptive drive off the base drive is used as-is; the
    /// engagement factor applies either way.
    pub fn drive(
        base: &DriveConfig,
        config: &TensionConfig,
        tension: f32,
        engagement_factor: f32,
    ) -> DriveParams {
        let (spring_mult, damper_mult) = if config.adaptive {
            (
                lerp(config.min_spring_multiplier, config.max_spring_multiplier, tension),
                lerp(config.min_damper_multiplier, config.max_damper_multiplier, tension),
            )
        } else {
            (1.0, 1.0)
        };
        DriveParams {
            spring: base.spring * spring_mult * engagement_factor,
            damper: base.damper * damper_mult * engagement_factor,
            max_force: base.max_force * engagement_factor,
        }
    }
}

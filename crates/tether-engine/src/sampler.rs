//! Anchor sampling and velocity estimation.
//!
//! Runs unconditionally every step, before any arming or suppression
//! check, so the previous-position history is always one step old.

use tether_math::{clamp01, lerp_vec3, safe_div, Vec3};

/// One step's worth of anchor geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorSample {
    pub self_position: Vec3,
    pub other_position: Vec3,
    /// `other - self`.
    pub separation: Vec3,
    pub velocity_self: Vec3,
    pub velocity_other: Vec3,
    /// Self anchor displacement since the previous step.
    pub self_displacement: Vec3,
    /// Change of `self - other` since the previous step.
    pub relative_displacement: Vec3,
}

/// Tracks previous anchor positions and velocity estimates for both ends.
#[derive(Debug, Clone)]
pub struct GeometrySampler {
    prev_self: Vec3,
    prev_other: Vec3,
    velocity_self: Vec3,
    velocity_other: Vec3,
}

impl GeometrySampler {
    /// Starts a history at rest at the given positions.
    pub fn new(self_position: Vec3, other_position: Vec3) -> Self {
        Self {
            prev_self: self_position,
            prev_other: other_position,
            velocity_self: Vec3::ZERO,
            velocity_other: Vec3::ZERO,
        }
    }

    /// Forgets history and restarts at rest.
    pub fn reset(&mut self, self_position: Vec3, other_position: Vec3) {
        *self = Self::new(self_position, other_position);
    }

    /// Samples new anchor positions.
    ///
    /// Velocity is `Δp / max(dt, ε)`; with a positive `smoothing_window`
    /// it is blended as `lerp(prev, instant, clamp01(dt / window))`.
    pub fn sample(
        &mut self,
        self_position: Vec3,
        other_position: Vec3,
        dt: f32,
        smoothing_window: f32,
    ) -> AnchorSample {
        let self_displacement = self_position - self.prev_self;
        let other_displacement = other_position - self.prev_other;

        let instant_self = self_displacement * safe_div(1.0, dt);
        let instant_other = other_displacement * safe_div(1.0, dt);

        if smoothing_window > 0.0 {
            let t = clamp01(safe_div(dt, smoothing_window));
            self.velocity_self = lerp_vec3(self.velocity_self, instant_self, t);
            self.velocity_other = lerp_vec3(self.velocity_other, instant_other, t);
        } else {
            self.velocity_self = instant_self;
            self.velocity_other = instant_other;
        }

        self.prev_self = self_position;
        self.prev_other = other_position;

        AnchorSample {
            self_position,
            other_position,
            separation: other_position - self_position,
            velocity_self: self.velocity_self,
            velocity_other: self.velocity_other,
            self_displacement,
            relative_displacement: self_displacement - other_displacement,
        }
    }

    pub fn velocity_self(&self) -> Vec3 {
        self.velocity_self
    }

    pub fn velocity_other(&self) -> Vec3 {
        self.velocity_other
    }
}

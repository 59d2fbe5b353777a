//! # tether-math
//!
//! Small numeric toolkit for the tether break engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Quat`)
//! - Guarded interpolation helpers (`lerp`, `clamp01`, `safe_div`)
//! - [`SpaceMode`] filtering for planar vs. full 3D tests
//! - [`ResponseCurve`] for stretch → tension shaping

pub mod curve;
pub mod interp;
pub mod space;

pub use curve::ResponseCurve;
pub use interp::{clamp01, lerp, lerp_vec3, safe_div};
pub use space::SpaceMode;

// Re-export glam types as the canonical math types for the engine.
pub use glam::{Quat, Vec3};

/// A rigid body's world transform as reported by the physics backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Pure translation.
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Maps a body-local point into world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

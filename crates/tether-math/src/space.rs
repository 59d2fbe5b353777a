//! Space filtering for break tests.
//!
//! A primarily 2D interaction still runs on 3D bodies. Zeroing the
//! out-of-plane axis before taking magnitudes keeps break behavior
//! independent of depth jitter.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which axes participate in stretch, speed and travel magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceMode {
    /// All three axes.
    #[default]
    Full,
    /// XY plane; Z is dropped.
    PlanarXy,
    /// XZ plane; Y is dropped.
    PlanarXz,
    /// YZ plane; X is dropped.
    PlanarYz,
}

impl SpaceMode {
    /// Zeroes the out-of-plane component (identity for `Full`).
    #[inline]
    pub fn filter(self, v: Vec3) -> Vec3 {
        match self {
            SpaceMode::Full => v,
            SpaceMode::PlanarXy => Vec3::new(v.x, v.y, 0.0),
            SpaceMode::PlanarXz => Vec3::new(v.x, 0.0, v.z),
            SpaceMode::PlanarYz => Vec3::new(0.0, v.y, v.z),
        }
    }

    /// Magnitude of the filtered vector.
    #[inline]
    pub fn length(self, v: Vec3) -> f32 {
        self.filter(v).length()
    }

    /// Returns true for any of the planar modes.
    pub fn is_planar(self) -> bool {
        !matches!(self, SpaceMode::Full)
    }
}

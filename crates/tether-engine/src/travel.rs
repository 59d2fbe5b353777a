//! Travel accumulation.
//!
//! Both accumulators are monotonically non-decreasing between resets.
//! The owning tether only feeds them once its arming delay has passed.

use tether_math::{SpaceMode, Vec3};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TravelAccumulator {
    absolute: f32,
    relative: f32,
}

impl TravelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one step of displacement, filtered through `space`.
    pub fn accumulate(&mut self, space: SpaceMode, self_displacement: Vec3, relative_displacement: Vec3) {
        let a = space.length(self_displacement);
        let r = space.length(relative_displacement);
        // NaN would poison the accumulators forever.
        if a.is_finite() {
            self.absolute += a;
        }
        if r.is_finite() {
            self.relative += r;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total distance travelled by the self anchor.
    pub fn absolute(&self) -> f32 {
        self.absolute
    }

    /// Total change of the self-to-other offset.
    pub fn relative(&self) -> f32 {
        self.relative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_ignores_depth() {
        let mut t = TravelAccumulator::new();
        t.accumulate(SpaceMode::PlanarXy, Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.3, 0.4, 9.0));
        assert_eq!(t.absolute(), 0.0);
        assert!((t.relative() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reset_zeroes_both() {
        let mut t = TravelAccumulator::new();
        t.accumulate(SpaceMode::Full, Vec3::X, Vec3::Y);
        t.reset();
        assert_eq!(t.absolute(), 0.0);
        assert_eq!(t.relative(), 0.0);
    }
}

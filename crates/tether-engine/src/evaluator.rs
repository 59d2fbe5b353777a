//! Authored break criteria.
//!
//! Criteria are checked in a fixed order and the first match wins:
//! distance, relative speed, own speed, absolute travel, relative travel.
//! `NativeForce` is not evaluated here; it is a solver-side limit.

use tether_math::SpaceMode;
use tether_types::constants::EPSILON;
use tether_types::BreakReason;

use crate::config::{BreakConfig, Criterion};
use crate::sampler::AnchorSample;

/// Per-step quantities the criteria compare against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    pub stretch: f32,
    pub relative_speed: f32,
    pub own_speed: f32,
    pub absolute_travel: f32,
    pub relative_travel: f32,
}

impl Measurements {
    /// Derives speeds from a sample, filtered through `space`.
    pub fn from_sample(
        space: SpaceMode,
        sample: &AnchorSample,
        stretch: f32,
        absolute_travel: f32,
        relative_travel: f32,
    ) -> Self {
        Self {
            stretch,
            relative_speed: space.length(sample.velocity_self - sample.velocity_other),
            own_speed: space.length(sample.velocity_self),
            absolute_travel,
            relative_travel,
        }
    }
}

pub struct BreakEvaluator;

impl BreakEvaluator {
    /// Returns the first criterion that fires, if any.
    pub fn evaluate(config: &BreakConfig, max_distance: f32, m: &Measurements) -> Option<BreakReason> {
        let mask = config.criteria;

        if mask.contains(Criterion::Distance) {
            let limit = max_distance.max(EPSILON);
            if m.stretch > limit {
                return Some(BreakReason::Distance {
                    stretch: m.stretch,
                    limit,
                });
            }
        }

        if mask.contains(Criterion::RelativeSpeed) && m.relative_speed > config.relative_speed_threshold {
            return Some(BreakReason::RelativeSpeed {
                speed: m.relative_speed,
                limit: config.relative_speed_threshold,
            });
        }

        if mask.contains(Criterion::OwnSpeed) && m.own_speed > config.own_speed_threshold {
            return Some(BreakReason::OwnSpeed {
                speed: m.own_speed,
                limit: config.own_speed_threshold,
            });
        }

        if mask.contains(Criterion::AbsoluteTravel) && m.absolute_travel >= config.absolute_travel_threshold {
            return Some(BreakReason::AbsoluteTravel {
                travel: m.absolute_travel,
                limit: config.absolute_travel_threshold,
            });
        }

        if mask.contains(Criterion::RelativeTravel) && m.relative_travel >= config.relative_travel_threshold {
            return Some(BreakReason::RelativeTravel {
                travel: m.relative_travel,
                limit: config.relative_travel_threshold,
            });
        }

        None
    }
}

//! Break and detach reasons.
//!
//! A [`BreakReason`] says *what* severed a tether and carries the
//! measurement that crossed its limit. A [`DetachReason`] is the coarse
//! attribution written to the attachable entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a tether broke. At most one reason is produced per step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakReason {
    /// Stretch exceeded the maximum distance.
    Distance { stretch: f32, limit: f32 },
    /// Relative anchor speed exceeded its threshold.
    RelativeSpeed { speed: f32, limit: f32 },
    /// The self anchor's own speed exceeded its threshold.
    OwnSpeed { speed: f32, limit: f32 },
    /// Accumulated absolute travel reached its threshold.
    AbsoluteTravel { travel: f32, limit: f32 },
    /// Accumulated relative travel reached its threshold.
    RelativeTravel { travel: f32, limit: f32 },
    /// The native solver's break-force limit was exceeded.
    NativeForce,
    /// Stretch stayed above the pluck threshold for the dwell time.
    PluckDwell { dwell: f32 },
    /// Stretch fell back below the pop threshold after being high.
    ReleasePop { normalized_stretch: f32 },
    /// An external caller forced the break.
    Forced,
}

impl BreakReason {
    /// Short stable name, used for logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            BreakReason::Distance { .. } => "distance",
            BreakReason::RelativeSpeed { .. } => "relative_speed",
            BreakReason::OwnSpeed { .. } => "own_speed",
            BreakReason::AbsoluteTravel { .. } => "absolute_travel",
            BreakReason::RelativeTravel { .. } => "relative_travel",
            BreakReason::NativeForce => "native_force",
            BreakReason::PluckDwell { .. } => "pluck_dwell",
            BreakReason::ReleasePop { .. } => "release_pop",
            BreakReason::Forced => "forced",
        }
    }
}

impl fmt::Display for BreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakReason::Distance { stretch, limit } => {
                write!(f, "stretch {stretch:.3} > {limit:.3}")
            }
            BreakReason::RelativeSpeed { speed, limit } => {
                write!(f, "relative speed {speed:.3} > {limit:.3}")
            }
            BreakReason::OwnSpeed { speed, limit } => {
                write!(f, "own speed {speed:.3} > {limit:.3}")
            }
            BreakReason::AbsoluteTravel { travel, limit } => {
                write!(f, "absolute travel {travel:.3} >= {limit:.3}")
            }
            BreakReason::RelativeTravel { travel, limit } => {
                write!(f, "relative travel {travel:.3} >= {limit:.3}")
            }
            BreakReason::NativeForce => write!(f, "native break force exceeded"),
            BreakReason::PluckDwell { dwell } => write!(f, "pluck dwell {dwell:.3}s"),
            BreakReason::ReleasePop { normalized_stretch } => {
                write!(f, "release pop at {normalized_stretch:.3}")
            }
            BreakReason::Forced => write!(f, "forced"),
        }
    }
}

/// Attribution written to the attachable entity on detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetachReason {
    /// The player deliberately ripped the part free.
    PlayerAction,
    /// Anything else: criteria, dwell, native solver, external causes.
    PhysicsBreak,
}

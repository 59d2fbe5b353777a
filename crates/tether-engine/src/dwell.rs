//! Pluck dwell and release pop detection.
//!
//! Two triggers share one tiny state machine:
//!
//! ```text
//!   Idle ──(n ≥ pluck)──▶ AboveThreshold
//!     ▲                        │
//!     └──(n ≤ pop: ReleasePop)─┘
//! ```
//!
//! Pluck fires while still stretched; release pop fires on the way back
//! down. Pluck is checked first and wins ties.

use crate::config::DwellConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellState {
    Idle,
    AboveThreshold,
}

/// What the detector signalled this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DwellTrigger {
    /// Held above the pluck threshold for `dwell` seconds.
    Pluck { dwell: f32 },
    /// Dropped to `normalized_stretch` after being above the threshold.
    ReleasePop { normalized_stretch: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct DwellDetector {
    timer: f32,
    was_above: bool,
}

impl DwellDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the detector by `dt` at the given normalized stretch.
    pub fn update(&mut self, config: &DwellConfig, normalized: f32, dt: f32) -> Option<DwellTrigger> {
        let above = normalized >= config.pluck_threshold_fraction;

        if config.pluck_enabled {
            if above {
                self.timer += dt.max(0.0);
                if self.timer >= config.pluck_dwell_seconds {
                    let dwell = self.timer;
                    self.reset();
                    return Some(DwellTrigger::Pluck { dwell });
                }
            } else {
                // no partial credit
                self.timer = 0.0;
            }
        }

        if above {
            self.was_above = true;
        } else if self.was_above
            && config.release_pop_enabled
            && normalized <= config.release_pop_threshold_fraction
        {
            self.was_above = false;
            return Some(DwellTrigger::ReleasePop {
                normalized_stretch: normalized,
            });
        }

        None
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.was_above = false;
    }

    pub fn state(&self) -> DwellState {
        if self.was_above {
            DwellState::AboveThreshold
        } else {
            DwellState::Idle
        }
    }

    /// Time accumulated above the pluck threshold.
    pub fn timer(&self) -> f32 {
        self.timer
    }
}

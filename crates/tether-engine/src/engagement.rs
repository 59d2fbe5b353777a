//! Engagement gating and drive scaling.
//!
//! The gate decides whether an authored break may proceed while nobody
//! is manipulating the part. The factor is a continuous drive multiplier
//! that applies whether or not gating is enabled.

use crate::config::EngagementConfig;
use crate::publisher::BreakCause;

pub struct EngagementGate;

impl EngagementGate {
    /// True if a break with `cause` may proceed.
    ///
    /// Native breaks, physics-attributed forced breaks and dwell breaks
    /// caused by an external disturbance bypass the gate.
    pub fn allows(config: &EngagementConfig, cause: BreakCause, engaged: bool) -> bool {
        if !config.only_break_when_engaged || engaged {
            return true;
        }
        match cause {
            BreakCause::Native => true,
            BreakCause::Forced { physics } => physics,
            BreakCause::Dwell { external } => external,
            BreakCause::Criterion => false,
        }
    }

    /// `engaged ? engaged_multiplier : passive_multiplier * passive_intensity`.
    pub fn factor(config: &EngagementConfig, engaged: bool, passive_intensity: f32) -> f32 {
        if engaged {
            config.engaged_multiplier
        } else {
            let intensity = if passive_intensity.is_finite() {
                passive_intensity.max(0.0)
            } else {
                1.0
            };
            config.passive_multiplier * intensity
        }
    }
}

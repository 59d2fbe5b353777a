//! Tether configuration.
//!
//! Every designer-facing tunable lives here as a plain serde record.
//! All groups use `#[serde(default)]`, so a TOML file only needs the
//! fields it changes.

use serde::{Deserialize, Serialize};

use tether_math::{ResponseCurve, SpaceMode};
use tether_types::constants::{
    DEFAULT_ARM_DELAY, DEFAULT_GRACE_SECONDS, MAX_STARTUP_RETRIES, UNBREAKABLE,
};
use tether_types::{TetherError, TetherResult};

/// A single break criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Distance,
    RelativeSpeed,
    OwnSpeed,
    AbsoluteTravel,
    RelativeTravel,
    NativeForce,
}

impl Criterion {
    /// All criteria in evaluation order (`NativeForce` last; it is
    /// enforced by the solver, not the evaluator).
    pub const ALL: [Criterion; 6] = [
        Criterion::Distance,
        Criterion::RelativeSpeed,
        Criterion::OwnSpeed,
        Criterion::AbsoluteTravel,
        Criterion::RelativeTravel,
        Criterion::NativeForce,
    ];

    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Criterion::Distance => 1 << 0,
            Criterion::RelativeSpeed => 1 << 1,
            Criterion::OwnSpeed => 1 << 2,
            Criterion::AbsoluteTravel => 1 << 3,
            Criterion::RelativeTravel => 1 << 4,
            Criterion::NativeForce => 1 << 5,
        }
    }
}

/// Bit set of active break criteria.
///
/// Serializes as a list of criterion names, e.g. `["distance", "native_force"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Criterion>", into = "Vec<Criterion>")]
pub struct CriteriaMask(u8);

impl CriteriaMask {
    pub const NONE: Self = Self(0);

    /// Mask containing exactly the given criteria.
    pub fn of(criteria: &[Criterion]) -> Self {
        let mut mask = Self::NONE;
        for &c in criteria {
            mask.insert(c);
        }
        mask
    }

    #[inline]
    pub fn contains(self, criterion: Criterion) -> bool {
        self.0 & criterion.bit() != 0
    }

    pub fn insert(&mut self, criterion: Criterion) {
        self.0 |= criterion.bit();
    }

    pub fn remove(&mut self, criterion: Criterion) {
        self.0 &= !criterion.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Vec<Criterion>> for CriteriaMask {
    fn from(list: Vec<Criterion>) -> Self {
        Self::of(&list)
    }
}

impl From<CriteriaMask> for Vec<Criterion> {
    fn from(mask: CriteriaMask) -> Self {
        Criterion::ALL
            .iter()
            .copied()
            .filter(|&c| mask.contains(c))
            .collect()
    }
}

/// Base spring-damper drive written to the native joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Spring stiffness pulling the anchors back toward rest.
    pub spring: f32,
    /// Damping coefficient.
    pub damper: f32,
    /// Maximum drive force the joint may apply.
    pub max_force: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            spring: 400.0,
            damper: 20.0,
            max_force: 1000.0,
        }
    }
}

/// Adaptive drive shaping. Only changes feel, never break thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TensionConfig {
    /// Scale spring/damper by tension each step.
    pub adaptive: bool,
    /// Stretch → tension response.
    pub curve: ResponseCurve,
    /// Fraction of `max_distance` treated as gentle (zero tension).
    pub soft_zone_fraction: f32,
    pub min_spring_multiplier: f32,
    pub max_spring_multiplier: f32,
    pub min_damper_multiplier: f32,
    pub max_damper_multiplier: f32,
}

impl Default for TensionConfig {
    fn default() -> Self {
        Self {
            adaptive: false,
            curve: ResponseCurve::SmoothStep,
            soft_zone_fraction: 0.2,
            min_spring_multiplier: 0.25,
            max_spring_multiplier: 1.5,
            min_damper_multiplier: 0.5,
            max_damper_multiplier: 1.25,
        }
    }
}

/// Break criteria and their thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakConfig {
    pub criteria: CriteriaMask,
    /// Speed of the self anchor relative to the other anchor (m/s).
    pub relative_speed_threshold: f32,
    /// Speed of the self anchor (m/s).
    pub own_speed_threshold: f32,
    /// Accumulated absolute travel of the self anchor (m).
    pub absolute_travel_threshold: f32,
    /// Accumulated change of the relative offset (m).
    pub relative_travel_threshold: f32,
    /// Native solver break force once armed.
    pub break_force: f32,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            criteria: CriteriaMask::of(&[Criterion::Distance]),
            relative_speed_threshold: 8.0,
            own_speed_threshold: 10.0,
            absolute_travel_threshold: 5.0,
            relative_travel_threshold: 3.0,
            break_force: 800.0,
        }
    }
}

/// Pluck dwell and release pop triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    pub pluck_enabled: bool,
    pub release_pop_enabled: bool,
    /// Normalized stretch at or above which the tether counts as "high".
    pub pluck_threshold_fraction: f32,
    /// Time spent high before a pluck break.
    pub pluck_dwell_seconds: f32,
    /// Normalized stretch at or below which a release pop fires.
    pub release_pop_threshold_fraction: f32,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            pluck_enabled: false,
            release_pop_enabled: false,
            pluck_threshold_fraction: 0.8,
            pluck_dwell_seconds: 0.08,
            release_pop_threshold_fraction: 0.4,
        }
    }
}

/// Arming, startup grace and velocity estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds after construction before travel and breaking start.
    pub arm_delay: f32,
    /// Seconds after construction during which native breaks are retried.
    pub grace_seconds: f32,
    pub max_startup_retries: u32,
    /// Exponential smoothing window for velocities. `0` = raw deltas.
    pub velocity_smoothing_window: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            arm_delay: DEFAULT_ARM_DELAY,
            grace_seconds: DEFAULT_GRACE_SECONDS,
            max_startup_retries: MAX_STARTUP_RETRIES,
            velocity_smoothing_window: 0.0,
        }
    }
}

/// Engagement gating and drive scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Authored breaks require the entity to be actively manipulated.
    pub only_break_when_engaged: bool,
    /// Drive multiplier while engaged.
    pub engaged_multiplier: f32,
    /// Drive multiplier while passive, scaled by the passive intensity.
    pub passive_multiplier: f32,
    /// How long a neighbor's detach counts as an external cause (seconds).
    pub external_attribution_window: f32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            only_break_when_engaged: false,
            engaged_multiplier: 1.0,
            passive_multiplier: 1.0,
            external_attribution_window: 0.25,
        }
    }
}

/// Complete configuration for one tether.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Stretch at which the distance criterion fires; also normalizes
    /// stretch. Non-positive values leave the tether inert.
    pub max_distance: f32,
    /// Planar or full 3D magnitudes.
    pub space: SpaceMode,
    pub drive: DriveConfig,
    pub tension: TensionConfig,
    pub breaking: BreakConfig,
    pub dwell: DwellConfig,
    pub timing: TimingConfig,
    pub engagement: EngagementConfig,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            max_distance: 0.75,
            space: SpaceMode::Full,
            drive: DriveConfig::default(),
            tension: TensionConfig::default(),
            breaking: BreakConfig::default(),
            dwell: DwellConfig::default(),
            timing: TimingConfig::default(),
            engagement: EngagementConfig::default(),
        }
    }
}

impl TetherConfig {
    /// Planar toy: XY plane, distance + pluck, adaptive drive.
    pub fn planar_toy() -> Self {
        Self {
            space: SpaceMode::PlanarXy,
            tension: TensionConfig {
                adaptive: true,
                ..Default::default()
            },
            dwell: DwellConfig {
                pluck_enabled: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Only the native solver decides; no authored criteria.
    pub fn rigid() -> Self {
        Self {
            breaking: BreakConfig {
                criteria: CriteriaMask::of(&[Criterion::NativeForce]),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parses a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> TetherResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TetherError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the config as TOML.
    pub fn to_toml_string(&self) -> TetherResult<String> {
        toml::to_string_pretty(self).map_err(|e| TetherError::Serialization(e.to_string()))
    }

    /// Native break-force limit when armed and not suppressed.
    pub fn native_break_force(&self) -> f32 {
        if self.breaking.criteria.contains(Criterion::NativeForce) {
            self.breaking.break_force
        } else {
            UNBREAKABLE
        }
    }

    /// Checks that every value is physically meaningful.
    ///
    /// A non-positive `max_distance` is accepted: it is the documented
    /// inert configuration, not an error.
    pub fn validate(&self) -> TetherResult<()> {
        if self.max_distance.is_nan() {
            return invalid("max_distance must not be NaN");
        }

        non_negative("drive.spring", self.drive.spring)?;
        non_negative("drive.damper", self.drive.damper)?;
        non_negative("drive.max_force", self.drive.max_force)?;

        fraction("tension.soft_zone_fraction", self.tension.soft_zone_fraction)?;
        if self.tension.soft_zone_fraction >= 1.0 {
            return invalid("tension.soft_zone_fraction must be below 1");
        }
        non_negative("tension.min_spring_multiplier", self.tension.min_spring_multiplier)?;
        non_negative("tension.max_spring_multiplier", self.tension.max_spring_multiplier)?;
        non_negative("tension.min_damper_multiplier", self.tension.min_damper_multiplier)?;
        non_negative("tension.max_damper_multiplier", self.tension.max_damper_multiplier)?;
        self.tension
            .curve
            .check()
            .map_err(|e| TetherError::InvalidConfig(format!("tension.curve: {e}")))?;

        non_negative("breaking.relative_speed_threshold", self.breaking.relative_speed_threshold)?;
        non_negative("breaking.own_speed_threshold", self.breaking.own_speed_threshold)?;
        non_negative("breaking.absolute_travel_threshold", self.breaking.absolute_travel_threshold)?;
        non_negative("breaking.relative_travel_threshold", self.breaking.relative_travel_threshold)?;
        if self.breaking.break_force.is_nan() || self.breaking.break_force <= 0.0 {
            return invalid("breaking.break_force must be positive");
        }

        fraction("dwell.pluck_threshold_fraction", self.dwell.pluck_threshold_fraction)?;
        fraction(
            "dwell.release_pop_threshold_fraction",
            self.dwell.release_pop_threshold_fraction,
        )?;
        non_negative("dwell.pluck_dwell_seconds", self.dwell.pluck_dwell_seconds)?;
        if self.dwell.release_pop_threshold_fraction > self.dwell.pluck_threshold_fraction {
            return invalid("dwell.release_pop_threshold_fraction must not exceed the pluck threshold");
        }

        non_negative("timing.arm_delay", self.timing.arm_delay)?;
        non_negative("timing.grace_seconds", self.timing.grace_seconds)?;
        non_negative("timing.velocity_smoothing_window", self.timing.velocity_smoothing_window)?;

        non_negative("engagement.engaged_multiplier", self.engagement.engaged_multiplier)?;
        non_negative("engagement.passive_multiplier", self.engagement.passive_multiplier)?;
        non_negative(
            "engagement.external_attribution_window",
            self.engagement.external_attribution_window,
        )?;

        Ok(())
    }
}

fn invalid(msg: &str) -> TetherResult<()> {
    Err(TetherError::InvalidConfig(msg.into()))
}

fn non_negative(name: &str, value: f32) -> TetherResult<()> {
    if value.is_nan() || value < 0.0 {
        return Err(TetherError::InvalidConfig(format!(
            "{name} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

fn fraction(name: &str, value: f32) -> TetherResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TetherError::InvalidConfig(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

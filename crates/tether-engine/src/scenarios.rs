//! Scripted scenarios: one tether, two bodies, a fixed motion script.
//!
//! Six canonical scenarios for regression checks:
//! 1. **Distance**: stretch past `max_distance` after arming
//! 2. **Pluck**: hold high stretch for the dwell time
//! 3. **Release pop**: ramp up past the pluck threshold, then drop
//! 4. **Suppressed**: distance geometry under global suppression
//! 5. **Gate**: forced break refused while passive, accepted when engaged
//! 6. **Startup retry**: spurious native break inside the grace window

use serde::{Deserialize, Serialize};

use tether_math::Vec3;
use tether_telemetry::{EventKind, RecordingListener, TetherEvent, TracingListener};
use tether_types::{BodyId, BreakReason, DetachReason, EntityId, TetherError, TetherResult};

use crate::collaborators::StaticEngagement;
use crate::config::{CriteriaMask, Criterion, TetherConfig};
use crate::instance::Lifecycle;
use crate::publisher::BreakOutcome;
use crate::rig::TetherRig;

const SELF_BODY: BodyId = BodyId(0);
const OTHER_BODY: BodyId = BodyId(1);
const ENTITY: EntityId = EntityId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Distance,
    Pluck,
    ReleasePop,
    Suppressed,
    Gate,
    StartupRetry,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::Distance,
            ScenarioKind::Pluck,
            ScenarioKind::ReleasePop,
            ScenarioKind::Suppressed,
            ScenarioKind::Gate,
            ScenarioKind::StartupRetry,
        ]
    }

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Distance => "distance",
            ScenarioKind::Pluck => "pluck",
            ScenarioKind::ReleasePop => "release-pop",
            ScenarioKind::Suppressed => "suppressed",
            ScenarioKind::Gate => "gate",
            ScenarioKind::StartupRetry => "startup-retry",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// What a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioKind,
    pub steps: u32,
    pub sim_time: f64,
    /// Reason of the last break event, if any.
    pub break_reason: Option<BreakReason>,
    pub lifecycle: Lifecycle,
    pub is_attached: bool,
    pub is_permanently_detached: bool,
    pub last_detach_reason: Option<DetachReason>,
    pub startup_retries: u32,
    pub feedback_calls: u32,
    /// Whether the run matched the scenario's expected outcome.
    pub passed: bool,
    pub events: Vec<TetherEvent>,
}

/// Runs scenarios on a fresh [`TetherRig`] per run.
pub struct ScenarioRunner {
    base: TetherConfig,
    dt: f32,
    trace_events: bool,
}

impl ScenarioRunner {
    /// `base` supplies every setting a scenario does not pin itself.
    pub fn new(base: TetherConfig) -> Self {
        Self {
            base,
            dt: tether_types::constants::DEFAULT_DT,
            trace_events: false,
        }
    }

    /// Also forwards every event to `tracing`.
    pub fn with_trace_events(mut self, enabled: bool) -> Self {
        self.trace_events = enabled;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn run(&self, kind: ScenarioKind) -> TetherResult<ScenarioReport> {
        let mut config = self.base.clone();
        let mut rig = TetherRig::new();
        rig.add_body(SELF_BODY, Vec3::ZERO);
        rig.add_body(OTHER_BODY, Vec3::ZERO);
        let (recorder, log) = RecordingListener::new();
        rig.registry.add_listener(Box::new(recorder));
        if self.trace_events {
            rig.registry.add_listener(Box::new(TracingListener));
        }

        let settle = self.settle_steps(&config);
        let dt = self.dt;
        let mut steps = 0u32;

        let passed = match kind {
            ScenarioKind::Distance => {
                config.breaking.criteria = CriteriaMask::of(&[Criterion::Distance]);
                config.engagement.only_break_when_engaged = false;
                let handle = rig.spawn(SELF_BODY, Some(OTHER_BODY), ENTITY, config.clone())?;
                steps += settle;
                rig.run(settle, dt);
                rig.move_body(OTHER_BODY, Vec3::X * (config.max_distance + 0.05));
                steps += 1;
                rig.step(dt);
                !rig.registry.has_active_connection(handle)
                    && rig.record(ENTITY).last_detach_reason == Some(DetachReason::PhysicsBreak)
            }
            ScenarioKind::Pluck => {
                config.breaking.criteria = CriteriaMask::of(&[Criterion::Distance]);
                config.dwell.pluck_enabled = true;
                config.engagement.only_break_when_engaged = false;
                let hold = halfway_to_one(config.dwell.pluck_threshold_fraction);
                let handle = rig.spawn(SELF_BODY, Some(OTHER_BODY), ENTITY, config.clone())?;
                steps += settle;
                rig.run(settle, dt);
                rig.move_body(OTHER_BODY, Vec3::X * config.max_distance * hold);
                let max_steps = (config.dwell.pluck_dwell_seconds / dt).ceil() as u32 + 2;
                for _ in 0..max_steps {
                    steps += 1;
                    if rig.step(dt) > 0 {
                        break;
                    }
                }
                !rig.registry.has_active_connection(handle)
                    && matches!(last_break(&log.snapshot()), Some(BreakReason::PluckDwell { .. }))
            }
            ScenarioKind::ReleasePop => {
                config.breaking.criteria = CriteriaMask::of(&[Criterion::Distance]);
                config.dwell.pluck_enabled = false;
                config.dwell.release_pop_enabled = true;
                config.engagement.only_break_when_engaged = false;
                let peak = halfway_to_one(config.dwell.pluck_threshold_fraction);
                let low = config.dwell.release_pop_threshold_fraction * 0.75;
                let handle = rig.spawn(SELF_BODY, Some(OTHER_BODY), ENTITY, config.clone())?;
                steps += settle;
                rig.run(settle, dt);
                let mut early = false;
                for fraction in [peak * 0.5, peak, low] {
                    rig.move_body(OTHER_BODY, Vec3::X * config.max_distance * fraction);
                    steps += 1;
                    let severed = rig.step(dt) > 0;
                    if severed && fraction > low {
                        early = true;
                    }
                }
                !early
                    && !rig.registry.has_active_connection(handle)
                    && matches!(last_break(&log.snapshot()), Some(BreakReason::ReleasePop { .. }))
            }
            ScenarioKind::Suppressed => {
                config.breaking.criteria = CriteriaMask::of(&[Criterion::Distance]);
                let handle = rig.spawn(SELF_BODY, Some(OTHER_BODY), ENTITY, config.clone())?;
                rig.set_suppressed(true);
                rig.move_body(OTHER_BODY, Vec3::X * (config.max_distance + 0.05));
                steps += settle * 2;
                rig.run(settle * 2, dt);
                let alive = rig.registry.has_active_connection(handle);
                let travel_zero = rig
                    .tether(handle)
                    .is_some_and(|t| t.absolute_travel() == 0.0 && t.relative_travel() == 0.0);
                alive && travel_zero && rig.record(ENTITY).is_attached
            }
            ScenarioKind::Gate => {
                config.engagement.only_break_when_engaged = true;
                rig.engagement = StaticEngagement::passive();
                let handle = rig.spawn(SELF_BODY, Some(OTHER_BODY), ENTITY, config.clone())?;
                steps += settle;
                rig.run(settle, dt);
                let refused = rig.force_break(handle, "scenario", false)? == BreakOutcome::Gated
                    && rig.record(ENTITY).is_attached;
                rig.engagement = StaticEngagement::engaged();
                let accepted = rig.force_break(handle, "scenario", false)?
                    == BreakOutcome::Published {
                        detach: DetachReason::PlayerAction,
                    };
                refused && accepted
            }
            ScenarioKind::StartupRetry => {
                if config.timing.max_startup_retries == 0 {
                    return Err(TetherError::InvalidConfig(
                        "startup-retry needs timing.max_startup_retries > 0".into(),
                    ));
                }
                let handle = rig.spawn(SELF_BODY, Some(OTHER_BODY), ENTITY, config.clone())?;
                let inside = ((config.timing.grace_seconds * 0.2) / dt).floor() as u32;
                steps += inside;
                rig.run(inside, dt);
                let outcome = rig.native_break(handle)?;
                outcome == BreakOutcome::Retried { attempt: 1 }
                    && rig.registry.has_active_connection(handle)
                    && rig.record(ENTITY).is_attached
                    && rig.tether(handle).map(|t| t.startup_retry_count()) == Some(1)
            }
        };

        let handle_state = rig.registry.iter().next();
        let record = rig.record(ENTITY);
        let events = log.snapshot();
        Ok(ScenarioReport {
            scenario: kind,
            steps,
            sim_time: rig.registry.now(),
            break_reason: last_break(&events),
            lifecycle: handle_state.map_or(Lifecycle::Inert, |t| t.lifecycle()),
            is_attached: record.is_attached,
            is_permanently_detached: record.is_permanently_detached,
            last_detach_reason: record.last_detach_reason,
            startup_retries: handle_state.map_or(0, |t| t.startup_retry_count()),
            feedback_calls: rig.feedback.audio,
            passed,
            events,
        })
    }

    /// Steps needed to get past both the arming delay and the grace window.
    fn settle_steps(&self, config: &TetherConfig) -> u32 {
        let settle = config.timing.arm_delay.max(config.timing.grace_seconds);
        (settle / self.dt).ceil() as u32 + 1
    }
}

fn last_break(events: &[TetherEvent]) -> Option<BreakReason> {
    events.iter().rev().find_map(|e| match e.kind {
        EventKind::Broke { reason, .. } => Some(reason),
        _ => None,
    })
}

fn halfway_to_one(fraction: f32) -> f32 {
    (fraction + 1.0) * 0.5
}

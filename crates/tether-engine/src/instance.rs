//! A single tether: the per-step break pipeline and its lifecycle.
//!
//! ```text
//! Constructing ──▶ ArmedPending ──▶ Active ──▶ Broken (terminal)
//!       ▲               │              │
//!       │               └──────┬───────┘
//!       │                      ▼
//!       └──(reconnect)──── Inert
//! ```
//!
//! Per step: sample geometry → accumulate travel → shape tension and
//! write drive → arm → (dwell | criteria) → gate → publish.
//!
//! Instances are owned by the [`SuppressionRegistry`](crate::registry::SuppressionRegistry);
//! every entry point here is reached through a handle on the registry.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use tether_math::{Pose, Vec3};
use tether_telemetry::{EventKind, ListenerSet, TetherEvent};
use tether_types::constants::UNBREAKABLE;
use tether_types::{BodyId, BreakReason, EntityId, JointId, SimTime, TetherHandle};

use crate::backend::{DriveParams, JointDesc};
use crate::collaborators::Environment;
use crate::config::TetherConfig;
use crate::dwell::{DwellDetector, DwellState, DwellTrigger};
use crate::engagement::EngagementGate;
use crate::evaluator::{BreakEvaluator, Measurements};
use crate::publisher::{BreakCause, BreakOutcome, DetachPublisher};
use crate::sampler::GeometrySampler;
use crate::tension::{normalized_stretch, stretch, TensionModel};
use crate::travel::TravelAccumulator;

/// Lifecycle of a tether instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Building the native joint.
    Constructing,
    /// Joint exists; arming delay or startup grace still running.
    ArmedPending,
    /// Fully armed; criteria are evaluated every step.
    Active,
    /// No usable connection (missing body or invalid distance).
    Inert,
    /// Severed. Terminal.
    Broken,
}

/// Bodies, anchors and entity for one tether.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetherDesc {
    pub self_body: BodyId,
    /// `None` starts the tether inert until reconnected.
    pub other_body: Option<BodyId>,
    /// Entity whose detach state this tether publishes.
    pub entity: EntityId,
    /// Anchor in the self body's local frame.
    pub anchor_self: Vec3,
    /// Anchor in the other body's local frame.
    pub anchor_other: Vec3,
}

/// Parameters accepted by `retune`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetuneParams {
    pub max_distance: f32,
    pub spring: f32,
    pub damper: f32,
    pub drive_max: f32,
}

/// Values derived during the last step. Never carried into the next
/// step's decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readout {
    pub self_position: Vec3,
    pub other_position: Vec3,
    pub separation: Vec3,
    pub stretch: f32,
    pub normalized_stretch: f32,
    pub tension: f32,
    pub velocity_self: Vec3,
    pub velocity_other: Vec3,
}

/// Per-call context handed down by the registry.
pub(crate) struct Frame<'l> {
    pub now: SimTime,
    pub suppressed: bool,
    pub events: &'l mut ListenerSet,
}

impl Frame<'_> {
    fn emit(&mut self, handle: TetherHandle, kind: EventKind) {
        self.events.emit(TetherEvent::new(handle, self.now, kind));
    }
}

pub struct TetherInstance {
    handle: TetherHandle,
    desc: TetherDesc,
    config: TetherConfig,
    lifecycle: Lifecycle,
    joint: Option<JointId>,

    /// Captured once per (re)construction.
    rest_separation: Vec3,
    sampler: GeometrySampler,
    travel: TravelAccumulator,
    dwell: DwellDetector,
    publisher: DetachPublisher,
    readout: Readout,

    created_at: SimTime,
    armed_at: SimTime,
    startup_retries: u32,
    break_force_armed: bool,
    disturbed_until: SimTime,
}

impl TetherInstance {
    /// Creates the instance and builds its native joint.
    pub(crate) fn construct(
        handle: TetherHandle,
        desc: TetherDesc,
        config: TetherConfig,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) -> Self {
        let mut instance = Self {
            handle,
            desc,
            config,
            lifecycle: Lifecycle::Constructing,
            joint: None,
            rest_separation: Vec3::ZERO,
            sampler: GeometrySampler::new(Vec3::ZERO, Vec3::ZERO),
            travel: TravelAccumulator::new(),
            dwell: DwellDetector::new(),
            publisher: DetachPublisher::new(desc.entity),
            readout: Readout::default(),
            created_at: frame.now,
            armed_at: frame.now,
            startup_retries: 0,
            break_force_armed: false,
            disturbed_until: SimTime::NEG_INFINITY,
        };
        instance.build(frame, env);
        instance
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn handle(&self) -> TetherHandle {
        self.handle
    }

    pub fn desc(&self) -> &TetherDesc {
        &self.desc
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn joint(&self) -> Option<JointId> {
        self.joint
    }

    pub fn entity(&self) -> EntityId {
        self.desc.entity
    }

    pub fn rest_separation(&self) -> Vec3 {
        self.rest_separation
    }

    pub fn readout(&self) -> &Readout {
        &self.readout
    }

    pub fn stretch(&self) -> f32 {
        self.readout.stretch
    }

    pub fn normalized_stretch(&self) -> f32 {
        self.readout.normalized_stretch
    }

    pub fn absolute_travel(&self) -> f32 {
        self.travel.absolute()
    }

    pub fn relative_travel(&self) -> f32 {
        self.travel.relative()
    }

    pub fn pluck_timer(&self) -> f32 {
        self.dwell.timer()
    }

    pub fn dwell_state(&self) -> DwellState {
        self.dwell.state()
    }

    pub fn startup_retry_count(&self) -> u32 {
        self.startup_retries
    }

    pub fn break_force_armed(&self) -> bool {
        self.break_force_armed
    }

    pub fn created_at(&self) -> SimTime {
        self.created_at
    }

    pub fn armed_at(&self) -> SimTime {
        self.armed_at
    }

    /// True while a live native joint exists and the tether is not broken.
    pub fn has_active_connection(&self) -> bool {
        self.joint.is_some()
            && matches!(self.lifecycle, Lifecycle::ArmedPending | Lifecycle::Active)
    }

    /// True if `body` is either end of this tether.
    pub fn touches(&self, body: BodyId) -> bool {
        self.desc.self_body == body || self.desc.other_body == Some(body)
    }

    pub fn is_disturbed(&self, now: SimTime) -> bool {
        now < self.disturbed_until
    }

    fn in_grace(&self, now: SimTime) -> bool {
        now - self.created_at < self.config.timing.grace_seconds as SimTime
    }

    /// Break-force limit the native joint should carry right now.
    pub fn break_force_limit(&self, suppressed: bool) -> f32 {
        if suppressed || !self.break_force_armed {
            UNBREAKABLE
        } else {
            self.config.native_break_force()
        }
    }

    // ─── Construction ────────────────────────────────────────────

    /// (Re)builds the native joint and resets all per-connection state.
    /// Keeps the startup retry count; callers reset it when appropriate.
    fn build(&mut self, frame: &mut Frame<'_>, env: &mut Environment<'_>) {
        self.lifecycle = Lifecycle::Constructing;
        self.release_joint(env);

        let other = match self.desc.other_body {
            Some(other) if self.config.max_distance > 0.0 => other,
            _ => {
                self.go_inert(frame, env);
                return;
            }
        };
        let Some((self_pos, other_pos)) = self.anchor_positions(other, env) else {
            self.go_inert(frame, env);
            return;
        };

        self.rest_separation = other_pos - self_pos;
        let desc = JointDesc {
            self_body: self.desc.self_body,
            other_body: other,
            anchor_self: self.desc.anchor_self,
            anchor_other: self.desc.anchor_other,
            rest_offset: self.rest_separation,
            drive: DriveParams {
                spring: self.config.drive.spring,
                damper: self.config.drive.damper,
                max_force: self.config.drive.max_force,
            },
            break_force: UNBREAKABLE,
        };
        match env.physics.create_joint(&desc) {
            Ok(joint) => self.joint = Some(joint),
            Err(e) => {
                warn!(handle = %self.handle, error = %e, "joint creation failed");
                self.go_inert(frame, env);
                return;
            }
        }

        self.sampler.reset(self_pos, other_pos);
        self.travel.reset();
        self.dwell.reset();
        self.readout = Readout {
            self_position: self_pos,
            other_position: other_pos,
            separation: self.rest_separation,
            ..Default::default()
        };
        self.created_at = frame.now;
        self.armed_at = frame.now + self.config.timing.arm_delay as SimTime;
        self.break_force_armed = false;
        self.lifecycle = Lifecycle::ArmedPending;

        debug!(
            handle = %self.handle,
            retry = self.startup_retries,
            rest = ?self.rest_separation,
            "tether constructed"
        );
        frame.emit(
            self.handle,
            EventKind::Constructed {
                retry: self.startup_retries,
            },
        );
    }

    fn anchor_positions(&self, other: BodyId, env: &Environment<'_>) -> Option<(Vec3, Vec3)> {
        let a: Pose = env.physics.body_pose(self.desc.self_body)?;
        let b: Pose = env.physics.body_pose(other)?;
        Some((
            a.transform_point(self.desc.anchor_self),
            b.transform_point(self.desc.anchor_other),
        ))
    }

    fn release_joint(&mut self, env: &mut Environment<'_>) {
        if let Some(joint) = self.joint.take() {
            env.physics.destroy_joint(joint);
        }
    }

    fn go_inert(&mut self, frame: &mut Frame<'_>, env: &mut Environment<'_>) {
        self.release_joint(env);
        if self.lifecycle != Lifecycle::Inert {
            self.lifecycle = Lifecycle::Inert;
            debug!(handle = %self.handle, "tether inert");
            frame.emit(self.handle, EventKind::WentInert);
        }
    }

    /// Attaches a new other body and rebuilds from scratch.
    pub(crate) fn reconnect(
        &mut self,
        other: BodyId,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) {
        self.desc.other_body = Some(other);
        self.startup_retries = 0;
        self.build(frame, env);
        debug!(handle = %self.handle, other = other.0, "tether reconnected");
        frame.emit(self.handle, EventKind::Reconnected);
    }

    /// Rebuilds with new distance and drive parameters.
    pub(crate) fn retune(
        &mut self,
        params: RetuneParams,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) {
        self.config.max_distance = params.max_distance;
        self.config.drive.spring = params.spring;
        self.config.drive.damper = params.damper;
        self.config.drive.max_force = params.drive_max;
        self.startup_retries = 0;
        self.build(frame, env);
        debug!(handle = %self.handle, max_distance = params.max_distance, "tether retuned");
        frame.emit(self.handle, EventKind::Retuned);
    }

    /// Releases solver resources. The instance must not be used afterwards.
    pub(crate) fn destroy(&mut self, env: &mut Environment<'_>) {
        self.release_joint(env);
    }

    pub(crate) fn mark_disturbed(&mut self, until: SimTime) {
        self.disturbed_until = self.disturbed_until.max(until);
    }

    // ─── Suppression ─────────────────────────────────────────────

    /// Applies a global suppression toggle to this instance.
    pub(crate) fn apply_suppression(&mut self, frame: &mut Frame<'_>, env: &mut Environment<'_>) {
        if frame.suppressed {
            self.travel.reset();
            self.dwell.reset();
        }
        if let Some(joint) = self.joint {
            env.physics
                .set_break_force(joint, self.break_force_limit(frame.suppressed));
        }
        frame.emit(
            self.handle,
            EventKind::SuppressionChanged {
                suppressed: frame.suppressed,
            },
        );
    }

    // ─── Step ────────────────────────────────────────────────────

    /// Advances one fixed step. Returns the outcome if a break was requested.
    pub(crate) fn step(
        &mut self,
        dt: f32,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) -> Option<BreakOutcome> {
        if !matches!(self.lifecycle, Lifecycle::ArmedPending | Lifecycle::Active) {
            return None;
        }
        let (Some(joint), Some(other)) = (self.joint, self.desc.other_body) else {
            self.go_inert(frame, env);
            return None;
        };
        let Some((self_pos, other_pos)) = self.anchor_positions(other, env) else {
            self.go_inert(frame, env);
            return None;
        };

        let space = self.config.space;
        let sample = self.sampler.sample(
            self_pos,
            other_pos,
            dt,
            self.config.timing.velocity_smoothing_window,
        );
        let stretch = stretch(space, sample.separation, self.rest_separation);
        let normalized = normalized_stretch(stretch, self.config.max_distance);

        let armed = frame.now >= self.armed_at;
        if armed && !frame.suppressed {
            self.travel
                .accumulate(space, sample.self_displacement, sample.relative_displacement);
        }

        // Drive: tension and engagement only shape feel.
        let engaged = env.engagement.is_engaged(self.desc.entity);
        let factor = EngagementGate::factor(
            &self.config.engagement,
            engaged,
            env.engagement.passive_intensity(),
        );
        let tension = TensionModel::tension(&self.config.tension, normalized);
        let drive = TensionModel::drive(&self.config.drive, &self.config.tension, tension, factor);
        env.physics.set_drive(joint, drive);
        if self.config.tension.adaptive {
            frame.emit(self.handle, EventKind::TensionChanged { tension });
        }

        self.readout = Readout {
            self_position: self_pos,
            other_position: other_pos,
            separation: sample.separation,
            stretch,
            normalized_stretch: normalized,
            tension,
            velocity_self: sample.velocity_self,
            velocity_other: sample.velocity_other,
        };

        let in_grace = self.in_grace(frame.now);
        if !in_grace && !self.break_force_armed {
            self.break_force_armed = true;
            let limit = self.break_force_limit(frame.suppressed);
            env.physics.set_break_force(joint, limit);
            debug!(handle = %self.handle, break_force = limit, "break force armed");
            frame.emit(
                self.handle,
                EventKind::Armed {
                    native_force: limit.is_finite(),
                },
            );
        }
        if armed && !in_grace && self.lifecycle == Lifecycle::ArmedPending {
            self.lifecycle = Lifecycle::Active;
        }

        if frame.suppressed || !armed || in_grace {
            return None;
        }

        trace!(handle = %self.handle, stretch, normalized, "tether step");

        if let Some(trigger) = self.dwell.update(&self.config.dwell, normalized, dt) {
            let reason = match trigger {
                DwellTrigger::Pluck { dwell } => BreakReason::PluckDwell { dwell },
                DwellTrigger::ReleasePop { normalized_stretch } => {
                    BreakReason::ReleasePop { normalized_stretch }
                }
            };
            let cause = BreakCause::Dwell {
                external: self.is_disturbed(frame.now),
            };
            return Some(self.request_break(cause, reason, frame, env));
        }

        let measurements = Measurements::from_sample(
            space,
            &sample,
            stretch,
            self.travel.absolute(),
            self.travel.relative(),
        );
        BreakEvaluator::evaluate(&self.config.breaking, self.config.max_distance, &measurements)
            .map(|reason| self.request_break(BreakCause::Criterion, reason, frame, env))
    }

    // ─── Break path ──────────────────────────────────────────────

    /// External authored break.
    pub(crate) fn force_break(
        &mut self,
        label: &str,
        is_authored_physics: bool,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) -> BreakOutcome {
        let outcome = self.request_break(
            BreakCause::Forced {
                physics: is_authored_physics,
            },
            BreakReason::Forced,
            frame,
            env,
        );
        if outcome.severed() {
            info!(handle = %self.handle, label, "forced break");
        }
        outcome
    }

    /// Solver reported this tether's joint as broken.
    pub(crate) fn native_break(
        &mut self,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) -> BreakOutcome {
        self.request_break(BreakCause::Native, BreakReason::NativeForce, frame, env)
    }

    /// Single entry point for every break path.
    fn request_break(
        &mut self,
        cause: BreakCause,
        reason: BreakReason,
        frame: &mut Frame<'_>,
        env: &mut Environment<'_>,
    ) -> BreakOutcome {
        if !self.has_active_connection() {
            return BreakOutcome::Ignored;
        }
        if frame.suppressed {
            return BreakOutcome::Suppressed;
        }

        if cause == BreakCause::Native && self.in_grace(frame.now) {
            if self.startup_retries < self.config.timing.max_startup_retries {
                self.startup_retries += 1;
                let attempt = self.startup_retries;
                debug!(handle = %self.handle, attempt, "spurious startup break, rebuilding");
                frame.emit(self.handle, EventKind::StartupRetry { attempt });
                self.build(frame, env);
                return BreakOutcome::Retried { attempt };
            }
            warn!(
                handle = %self.handle,
                attempts = self.startup_retries,
                "startup retries exhausted, severing"
            );
            frame.emit(
                self.handle,
                EventKind::RetriesExhausted {
                    attempts: self.startup_retries,
                },
            );
        }

        let engaged = env.engagement.is_engaged(self.desc.entity);
        if !EngagementGate::allows(&self.config.engagement, cause, engaged) {
            return BreakOutcome::Gated;
        }

        let detach = cause.detach_reason();
        if env.session.suppress_detach_events() {
            return BreakOutcome::SessionSuppressed;
        }

        let published = self.publisher.write(detach, env.attachments);
        self.release_joint(env);
        self.lifecycle = Lifecycle::Broken;

        if published {
            let position = (self.readout.self_position + self.readout.other_position) * 0.5;
            self.publisher.play_feedback(position, env.feedback);
            info!(
                handle = %self.handle,
                entity = self.desc.entity.0,
                reason = %reason,
                detach = ?detach,
                "tether broke"
            );
        } else {
            debug!(handle = %self.handle, reason = %reason, "tether broke, entity already detached");
        }
        frame.emit(
            self.handle,
            EventKind::Broke {
                reason,
                detach,
                published,
            },
        );

        if published {
            BreakOutcome::Published { detach }
        } else {
            BreakOutcome::AlreadyDetached
        }
    }
}

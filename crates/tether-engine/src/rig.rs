//! Self-contained tether rig on the kinematic backend.
//!
//! Bundles a [`KinematicBackend`], in-memory collaborators and a
//! [`SuppressionRegistry`] so a scripted run can move bodies, step, and
//! inspect detach state without wiring an `Environment` by hand.

use tether_math::Vec3;
use tether_types::{BodyId, EntityId, TetherError, TetherHandle, TetherResult};

use crate::backend::NativeBreakListener;
use crate::collaborators::{
    AttachmentRecord, AttachmentTable, CountingFeedback, Environment, SessionFlags,
    StaticEngagement,
};
use crate::config::TetherConfig;
use crate::instance::{RetuneParams, TetherDesc, TetherInstance};
use crate::kinematic::KinematicBackend;
use crate::publisher::BreakOutcome;
use crate::registry::SuppressionRegistry;

pub struct TetherRig {
    pub backend: KinematicBackend,
    pub attachments: AttachmentTable,
    pub engagement: StaticEngagement,
    pub session: SessionFlags,
    pub feedback: CountingFeedback,
    pub registry: SuppressionRegistry,
}

impl TetherRig {
    /// Empty rig, engaged, no session suppression.
    pub fn new() -> Self {
        Self {
            backend: KinematicBackend::new(),
            attachments: AttachmentTable::new(),
            engagement: StaticEngagement::engaged(),
            session: SessionFlags::default(),
            feedback: CountingFeedback::default(),
            registry: SuppressionRegistry::new(),
        }
    }

    /// Borrows the registry alongside an environment over the other parts.
    pub fn parts(&mut self) -> (&mut SuppressionRegistry, Environment<'_>) {
        let env = Environment {
            physics: &mut self.backend,
            attachments: &mut self.attachments,
            engagement: &self.engagement,
            session: &self.session,
            feedback: &mut self.feedback,
        };
        (&mut self.registry, env)
    }

    pub fn add_body(&mut self, body: BodyId, position: Vec3) {
        self.backend.add_body(body, position);
    }

    pub fn move_body(&mut self, body: BodyId, position: Vec3) {
        self.backend.set_body_position(body, position);
    }

    /// Tethers `self_body` to `other_body` at their origins.
    pub fn spawn(
        &mut self,
        self_body: BodyId,
        other_body: Option<BodyId>,
        entity: EntityId,
        config: TetherConfig,
    ) -> TetherResult<TetherHandle> {
        let desc = TetherDesc {
            self_body,
            other_body,
            entity,
            anchor_self: Vec3::ZERO,
            anchor_other: Vec3::ZERO,
        };
        let (registry, mut env) = self.parts();
        registry.spawn(desc, config, &mut env)
    }

    /// Steps every tether, then lets the backend report force breaks.
    /// Returns how many tethers severed.
    pub fn step(&mut self, dt: f32) -> usize {
        let mut severed = {
            let (registry, mut env) = self.parts();
            registry.step_all(dt, &mut env)
        };
        self.backend.evaluate_forces();
        severed += self.dispatch_native_breaks();
        severed
    }

    /// Steps `n` times with a fixed `dt`.
    pub fn run(&mut self, n: u32, dt: f32) -> usize {
        (0..n).map(|_| self.step(dt)).sum()
    }

    fn dispatch_native_breaks(&mut self) -> usize {
        let mut severed = 0;
        for joint in self.backend.drain_native_breaks() {
            let (registry, mut env) = self.parts();
            if registry.on_native_break(joint, &mut env).severed() {
                severed += 1;
            }
        }
        severed
    }

    /// Makes the solver report the tether's joint as broken right now.
    pub fn native_break(&mut self, handle: TetherHandle) -> TetherResult<BreakOutcome> {
        let joint = self
            .registry
            .get(handle)
            .ok_or(TetherError::StaleHandle(handle))?
            .joint()
            .ok_or(TetherError::Broken(handle))?;
        self.backend.simulate_native_break(joint);
        self.backend.drain_native_breaks();
        let (registry, mut env) = self.parts();
        Ok(registry.on_native_break(joint, &mut env))
    }

    pub fn force_break(
        &mut self,
        handle: TetherHandle,
        label: &str,
        is_authored_physics: bool,
    ) -> TetherResult<BreakOutcome> {
        let (registry, mut env) = self.parts();
        registry.force_break(handle, label, is_authored_physics, &mut env)
    }

    pub fn set_suppressed(&mut self, suppressed: bool) {
        let (registry, mut env) = self.parts();
        registry.set_global_suppressed(suppressed, &mut env);
    }

    pub fn reconnect(&mut self, handle: TetherHandle, other: BodyId) -> TetherResult<()> {
        let (registry, mut env) = self.parts();
        registry.reconnect(handle, other, &mut env)
    }

    pub fn retune(&mut self, handle: TetherHandle, params: RetuneParams) -> TetherResult<()> {
        let (registry, mut env) = self.parts();
        registry.retune(handle, params, &mut env)
    }

    pub fn destroy(&mut self, handle: TetherHandle) -> TetherResult<()> {
        let (registry, mut env) = self.parts();
        registry.destroy(handle, &mut env)
    }

    pub fn tether(&self, handle: TetherHandle) -> Option<&TetherInstance> {
        self.registry.get(handle)
    }

    pub fn record(&self, entity: EntityId) -> AttachmentRecord {
        self.attachments.record(entity)
    }
}

impl Default for TetherRig {
    fn default() -> Self {
        Self::new()
    }
}

//! External collaborators consumed (not owned) by the engine.
//!
//! Each collaborator is a small trait so game code can plug in its own
//! state. Simple in-memory implementations are provided for tests,
//! tools and single-scene setups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tether_math::Vec3;
use tether_types::{DetachReason, EntityId};

use crate::backend::PhysicsBackend;

/// "Is this attachment being actively manipulated?"
pub trait EngagementState {
    fn is_engaged(&self, entity: EntityId) -> bool;

    /// Scales the passive drive multiplier. Defaults to 1.
    fn passive_intensity(&self) -> f32 {
        1.0
    }
}

/// Owner of the attached / permanently-detached flags.
///
/// Implementations must never let `is_attached` become true again once
/// `is_permanently_detached` is set.
pub trait AttachmentStore {
    fn is_attached(&self, entity: EntityId) -> bool;
    fn is_permanently_detached(&self, entity: EntityId) -> bool;
    fn mark_detached(&mut self, entity: EntityId, reason: DetachReason, permanent: bool);
}

/// Session-level switch that pauses detach state writes.
pub trait SessionContext {
    fn suppress_detach_events(&self) -> bool;
}

/// Fire-and-forget feedback played when a tether severs.
pub trait FeedbackSink {
    fn on_break_audio(&mut self, entity: EntityId, position: Vec3) {
        let _ = (entity, position);
    }

    fn on_break_fluid(&mut self, entity: EntityId, position: Vec3) {
        let _ = (entity, position);
    }
}

/// Borrowed collaborators for one engine call.
pub struct Environment<'a> {
    pub physics: &'a mut dyn PhysicsBackend,
    pub attachments: &'a mut dyn AttachmentStore,
    pub engagement: &'a dyn EngagementState,
    pub session: &'a dyn SessionContext,
    pub feedback: &'a mut dyn FeedbackSink,
}

// ─── In-memory implementations ───────────────────────────────

/// Fixed engagement answer for every entity.
#[derive(Debug, Clone, Copy)]
pub struct StaticEngagement {
    pub engaged: bool,
    pub passive_intensity: f32,
}

impl StaticEngagement {
    pub fn engaged() -> Self {
        Self {
            engaged: true,
            passive_intensity: 1.0,
        }
    }

    pub fn passive() -> Self {
        Self {
            engaged: false,
            passive_intensity: 1.0,
        }
    }
}

impl EngagementState for StaticEngagement {
    fn is_engaged(&self, _entity: EntityId) -> bool {
        self.engaged
    }

    fn passive_intensity(&self) -> f32 {
        self.passive_intensity
    }
}

/// Session flag held in a plain field.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFlags {
    pub suppress_detach_events: bool,
}

impl SessionContext for SessionFlags {
    fn suppress_detach_events(&self) -> bool {
        self.suppress_detach_events
    }
}

/// Feedback sink that counts calls.
#[derive(Debug, Default)]
pub struct CountingFeedback {
    pub audio: u32,
    pub fluid: u32,
}

impl FeedbackSink for CountingFeedback {
    fn on_break_audio(&mut self, _entity: EntityId, _position: Vec3) {
        self.audio += 1;
    }

    fn on_break_fluid(&mut self, _entity: EntityId, _position: Vec3) {
        self.fluid += 1;
    }
}

/// Detach state of one attachable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub is_attached: bool,
    pub is_permanently_detached: bool,
    pub last_detach_reason: Option<DetachReason>,
}

impl Default for AttachmentRecord {
    fn default() -> Self {
        Self {
            is_attached: true,
            is_permanently_detached: false,
            last_detach_reason: None,
        }
    }
}

/// In-memory attachment store. Unknown entities read as attached.
#[derive(Debug, Default)]
pub struct AttachmentTable {
    records: HashMap<EntityId, AttachmentRecord>,
    writes: u32,
}

impl AttachmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for an entity.
    pub fn record(&self, entity: EntityId) -> AttachmentRecord {
        self.records.get(&entity).copied().unwrap_or_default()
    }

    /// Re-attaches a temporarily detached entity.
    ///
    /// Returns false (and changes nothing) once the entity is
    /// permanently detached.
    pub fn attach(&mut self, entity: EntityId) -> bool {
        let record = self.records.entry(entity).or_default();
        if record.is_permanently_detached {
            return false;
        }
        record.is_attached = true;
        true
    }

    /// Number of state writes that changed something.
    pub fn write_count(&self) -> u32 {
        self.writes
    }
}

impl AttachmentStore for AttachmentTable {
    fn is_attached(&self, entity: EntityId) -> bool {
        self.record(entity).is_attached
    }

    fn is_permanently_detached(&self, entity: EntityId) -> bool {
        self.record(entity).is_permanently_detached
    }

    fn mark_detached(&mut self, entity: EntityId, reason: DetachReason, permanent: bool) {
        let record = self.records.entry(entity).or_default();
        if record.is_permanently_detached {
            return;
        }
        record.is_attached = false;
        record.is_permanently_detached = permanent;
        record.last_detach_reason = Some(reason);
        self.writes += 1;
    }
}

//! Authoritative, idempotent detach writes.
//!
//! Every break path ends here. The tether decides *whether* to publish
//! (suppression, startup retry, gating); the publisher performs the one
//! state write and fires feedback only on the attached → detached edge.

use tether_math::Vec3;
use tether_types::{DetachReason, EntityId};

use crate::collaborators::{AttachmentStore, FeedbackSink};

/// Who or what asked for the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakCause {
    /// The solver's break-force limit was exceeded.
    Native,
    /// One of the evaluator's criteria fired.
    Criterion,
    /// Pluck or release pop. `external` is true when the stretch was
    /// attributed to a disturbance outside the player's control.
    Dwell { external: bool },
    /// `force_break` from game code. `physics` marks a break the caller
    /// attributes to physical causes rather than direct manipulation.
    Forced { physics: bool },
}

impl BreakCause {
    /// Only direct manipulation counts as a player action.
    pub fn detach_reason(self) -> DetachReason {
        match self {
            BreakCause::Forced { physics: false } => DetachReason::PlayerAction,
            _ => DetachReason::PhysicsBreak,
        }
    }
}

/// Result of a break request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakOutcome {
    /// Global suppression is on; nothing happened.
    Suppressed,
    /// Native break inside the startup grace; the joint was rebuilt.
    Retried { attempt: u32 },
    /// Engagement gate refused the break.
    Gated,
    /// The session is pausing detach writes; nothing happened.
    SessionSuppressed,
    /// Detach written and feedback played.
    Published { detach: DetachReason },
    /// Entity was already permanently detached; tether severed silently.
    AlreadyDetached,
    /// The tether was already broken or has no connection.
    Ignored,
}

impl BreakOutcome {
    /// True when the tether is severed as a result of this request.
    pub fn severed(self) -> bool {
        matches!(self, BreakOutcome::Published { .. } | BreakOutcome::AlreadyDetached)
    }
}

/// Writes detach state for one attachable entity.
#[derive(Debug, Clone)]
pub struct DetachPublisher {
    entity: EntityId,
    feedback_fired: bool,
}

impl DetachPublisher {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            feedback_fired: false,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Marks the entity permanently detached.
    ///
    /// Returns true only on the attached → detached transition; a second
    /// call (or a call after another tether detached the same entity)
    /// changes nothing.
    pub fn write(&mut self, reason: DetachReason, attachments: &mut dyn AttachmentStore) -> bool {
        if attachments.is_permanently_detached(self.entity) {
            return false;
        }
        attachments.mark_detached(self.entity, reason, true);
        true
    }

    /// Plays audio and fluid feedback, at most once per publisher.
    pub fn play_feedback(&mut self, position: Vec3, feedback: &mut dyn FeedbackSink) {
        if self.feedback_fired {
            return;
        }
        self.feedback_fired = true;
        feedback.on_break_audio(self.entity, position);
        feedback.on_break_fluid(self.entity, position);
    }
}

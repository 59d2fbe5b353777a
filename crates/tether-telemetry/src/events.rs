//! Tether event types.
//!
//! Events are `Copy` value types with no heap payload, so emitting one
//! from inside a physics step never allocates.

use serde::{Deserialize, Serialize};
use tether_types::{BreakReason, DetachReason, SimTime, TetherHandle};

/// An event emitted by one tether instance (or the registry).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TetherEvent {
    /// Instance the event concerns.
    pub handle: TetherHandle,
    /// Simulation time at emission (seconds).
    pub time: SimTime,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// A native connection was (re)built and the rest separation captured.
    Constructed {
        /// Startup retry count at construction time (0 for the first build).
        retry: u32,
    },

    /// Startup grace elapsed; the native break-force limit is live.
    Armed {
        /// Whether a finite native break force was applied.
        native_force: bool,
    },

    /// Drive tension for this step (adaptive drive only).
    TensionChanged {
        /// Shaped tension in `[0, 1]`.
        tension: f32,
    },

    /// A spurious native break during startup was absorbed by rebuilding.
    StartupRetry {
        /// Retry attempt number (1-based).
        attempt: u32,
    },

    /// A native break arrived during startup with no retries left.
    RetriesExhausted {
        attempts: u32,
    },

    /// The tether severed.
    Broke {
        reason: BreakReason,
        detach: DetachReason,
        /// False when the entity was already permanently detached.
        published: bool,
    },

    /// Global suppression toggled. Emitted once per live instance.
    SuppressionChanged {
        suppressed: bool,
    },

    /// The other body vanished; the tether is quiescent.
    WentInert,

    /// A new other body was attached.
    Reconnected,

    /// Drive and distance parameters were rebuilt.
    Retuned,
}

impl TetherEvent {
    /// Creates a new event.
    pub fn new(handle: TetherHandle, time: SimTime, kind: EventKind) -> Self {
        Self { handle, time, kind }
    }
}

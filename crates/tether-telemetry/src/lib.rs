//! # tether-telemetry
//!
//! Structured events emitted by tether instances (tension, arming,
//! retries, breaks, suppression) and the listener registry that
//! delivers them synchronously inside the simulation step.

pub mod events;
pub mod listener;
pub mod sinks;

pub use events::{EventKind, TetherEvent};
pub use listener::{ListenerSet, TetherListener};
pub use sinks::{EventLog, RecordingListener, TracingListener};

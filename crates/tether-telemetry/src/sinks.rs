//! Ready-made listeners.

use std::cell::RefCell;
use std::rc::Rc;

use crate::events::TetherEvent;
use crate::listener::TetherListener;

/// Shared, inspectable event buffer filled by a [`RecordingListener`].
///
/// The engine is single-threaded, so a plain `Rc<RefCell<_>>` suffices.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<TetherEvent>>>,
}

impl EventLog {
    /// Copies out all recorded events.
    pub fn snapshot(&self) -> Vec<TetherEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Counts events matching `pred`.
    pub fn count(&self, pred: impl Fn(&TetherEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|&e| pred(e)).count()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// A listener that records every event, for tests and the CLI.
pub struct RecordingListener {
    log: EventLog,
}

impl RecordingListener {
    /// Creates a recorder and the log handle used to read it back.
    pub fn new() -> (Self, EventLog) {
        let log = EventLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl TetherListener for RecordingListener {
    fn on_event(&mut self, event: &TetherEvent) {
        self.log.events.borrow_mut().push(*event);
    }

    fn name(&self) -> &str {
        "recording_listener"
    }
}

/// A listener that logs events using the `tracing` crate.
///
/// Tension updates go to `trace` since they fire every step.
pub struct TracingListener;

impl TetherListener for TracingListener {
    fn on_tension_changed(&mut self, handle: tether_types::TetherHandle, tension: f32) {
        tracing::trace!(%handle, tension, "tension");
    }

    fn on_event(&mut self, event: &TetherEvent) {
        if matches!(event.kind, crate::events::EventKind::TensionChanged { .. }) {
            return;
        }
        tracing::info!(
            handle = %event.handle,
            time = event.time,
            event = ?event.kind,
            "tether_event"
        );
    }

    fn name(&self) -> &str {
        "tracing_listener"
    }
}

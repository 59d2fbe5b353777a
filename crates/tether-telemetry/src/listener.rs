//! Listener registration and synchronous dispatch.
//!
//! Listeners are called in registration order, on the simulation
//! thread, before the emitting call returns.

use tether_types::{BreakReason, TetherHandle};

use crate::events::{EventKind, TetherEvent};

/// Trait for tether event consumers.
///
/// All methods default to no-ops; implement only what you need.
///
/// # Ordering
///
/// ```text
/// per step, while adaptive drive is active:
///   on_tension_changed   (exactly once)
/// per instance lifetime:
///   on_broke             (at most once)
/// every event:
///   on_event             (after the specific hook)
/// ```
pub trait TetherListener {
    /// Called once per step with the shaped tension.
    fn on_tension_changed(&mut self, handle: TetherHandle, tension: f32) {
        let _ = (handle, tension);
    }

    /// Called when a tether severs.
    fn on_broke(&mut self, handle: TetherHandle, reason: BreakReason) {
        let _ = (handle, reason);
    }

    /// Called for every event, including the two above.
    fn on_event(&mut self, event: &TetherEvent) {
        let _ = event;
    }

    /// Returns a human-readable name for this listener.
    fn name(&self) -> &str;
}

/// Ordered set of registered listeners.
pub struct ListenerSet {
    listeners: Vec<Box<dyn TetherListener>>,
    /// Disabled set drops events silently.
    enabled: bool,
}

impl ListenerSet {
    /// Creates an empty listener set.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            enabled: true,
        }
    }

    /// Registers a listener.
    pub fn add(&mut self, listener: Box<dyn TetherListener>) {
        self.listeners.push(listener);
    }

    /// Enables or disables dispatch.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns true if dispatch is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Dispatches an event to every listener.
    pub fn emit(&mut self, event: TetherEvent) {
        if !self.enabled {
            return;
        }
        for listener in &mut self.listeners {
            match event.kind {
                EventKind::TensionChanged { tension } => {
                    listener.on_tension_changed(event.handle, tension)
                }
                EventKind::Broke { reason, .. } => listener.on_broke(event.handle, reason),
                _ => {}
            }
            listener.on_event(&event);
        }
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new()
    }
}

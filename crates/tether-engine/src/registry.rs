//! Registry of live tethers and the global suppression flag.
//!
//! The registry owns every [`TetherInstance`] in generational slots.
//! Callers hold [`TetherHandle`]s; a destroyed slot is reused with a
//! bumped generation, so a stale handle resolves to nothing instead of
//! to the slot's new occupant.
//!
//! Global suppression is a sweep over live instances. It runs when the
//! flag flips, not per step.

use tracing::{debug, info};

use tether_telemetry::{ListenerSet, TetherListener};
use tether_types::{BodyId, JointId, SimTime, TetherError, TetherHandle, TetherResult};

use crate::backend::NativeBreakListener;
use crate::collaborators::Environment;
use crate::config::TetherConfig;
use crate::instance::{Frame, Lifecycle, RetuneParams, TetherDesc, TetherInstance};
use crate::publisher::BreakOutcome;

struct Slot {
    generation: u32,
    instance: Option<TetherInstance>,
}

/// Owner of all live tethers.
pub struct SuppressionRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live handles in registration order.
    order: Vec<TetherHandle>,
    suppressed: bool,
    now: SimTime,
    listeners: ListenerSet,
}

impl SuppressionRegistry {
    /// Creates an empty registry at time zero.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            suppressed: false,
            now: 0.0,
            listeners: ListenerSet::new(),
        }
    }

    /// Current simulation time (seconds).
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Registers an event listener.
    pub fn add_listener(&mut self, listener: Box<dyn TetherListener>) {
        self.listeners.add(listener);
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerSet {
        &mut self.listeners
    }

    /// Number of registered (not destroyed) tethers, including broken
    /// and inert ones.
    pub fn live_count(&self) -> usize {
        self.order.len()
    }

    /// Live tethers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TetherInstance> + '_ {
        self.order.iter().filter_map(move |h| self.get(*h))
    }

    pub fn get(&self, handle: TetherHandle) -> Option<&TetherInstance> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.instance.as_ref()
    }

    fn slot_mut(&mut self, handle: TetherHandle) -> TetherResult<&mut TetherInstance> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_mut())
            .ok_or(TetherError::StaleHandle(handle))
    }

    /// Splits a mutable instance borrow from the per-call frame.
    fn instance_and_frame(
        &mut self,
        handle: TetherHandle,
    ) -> TetherResult<(&mut TetherInstance, Frame<'_>)> {
        let frame = Frame {
            now: self.now,
            suppressed: self.suppressed,
            events: &mut self.listeners,
        };
        let instance = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.instance.as_mut())
            .ok_or(TetherError::StaleHandle(handle))?;
        Ok((instance, frame))
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Validates `config`, constructs a tether and registers it.
    ///
    /// A missing other body or non-positive `max_distance` is not an
    /// error: the tether is registered inert.
    pub fn spawn(
        &mut self,
        desc: TetherDesc,
        config: TetherConfig,
        env: &mut Environment<'_>,
    ) -> TetherResult<TetherHandle> {
        config.validate()?;

        let handle = match self.free.pop() {
            Some(index) => TetherHandle {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| TetherError::InvalidConfig("tether slot space exhausted".into()))?;
                self.slots.push(Slot {
                    generation: 0,
                    instance: None,
                });
                TetherHandle { index, generation: 0 }
            }
        };

        let mut frame = Frame {
            now: self.now,
            suppressed: self.suppressed,
            events: &mut self.listeners,
        };
        let mut instance = TetherInstance::construct(handle, desc, config, &mut frame, env);
        if self.suppressed {
            instance.apply_suppression(&mut frame, env);
        }
        self.slots[handle.index()].instance = Some(instance);
        self.order.push(handle);
        Ok(handle)
    }

    /// Releases the tether's joint and frees its slot.
    pub fn destroy(&mut self, handle: TetherHandle, env: &mut Environment<'_>) -> TetherResult<()> {
        self.slot_mut(handle)?.destroy(env);
        let slot = &mut self.slots[handle.index()];
        slot.instance = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.order.retain(|&h| h != handle);
        debug!(%handle, "tether destroyed");
        Ok(())
    }

    /// Attaches a new other body and rebuilds the connection.
    pub fn reconnect(
        &mut self,
        handle: TetherHandle,
        other: BodyId,
        env: &mut Environment<'_>,
    ) -> TetherResult<()> {
        let (instance, mut frame) = self.instance_and_frame(handle)?;
        if instance.lifecycle() == Lifecycle::Broken {
            return Err(TetherError::Broken(handle));
        }
        instance.reconnect(other, &mut frame, env);
        if frame.suppressed {
            instance.apply_suppression(&mut frame, env);
        }
        Ok(())
    }

    /// Rebuilds the connection with new distance and drive parameters,
    /// resetting all accumulators.
    pub fn retune(
        &mut self,
        handle: TetherHandle,
        params: RetuneParams,
        env: &mut Environment<'_>,
    ) -> TetherResult<()> {
        let (instance, mut frame) = self.instance_and_frame(handle)?;
        if instance.lifecycle() == Lifecycle::Broken {
            return Err(TetherError::Broken(handle));
        }
        let mut candidate = instance.config().clone();
        candidate.max_distance = params.max_distance;
        candidate.drive.spring = params.spring;
        candidate.drive.damper = params.damper;
        candidate.drive.max_force = params.drive_max;
        candidate.validate()?;

        instance.retune(params, &mut frame, env);
        if frame.suppressed {
            instance.apply_suppression(&mut frame, env);
        }
        Ok(())
    }

    /// Authored break from game code.
    ///
    /// `is_authored_physics` marks the break as physically caused, which
    /// exempts it from engagement gating and records it as a physics break.
    pub fn force_break(
        &mut self,
        handle: TetherHandle,
        label: &str,
        is_authored_physics: bool,
        env: &mut Environment<'_>,
    ) -> TetherResult<BreakOutcome> {
        let (instance, mut frame) = self.instance_and_frame(handle)?;
        let outcome = instance.force_break(label, is_authored_physics, &mut frame, env);
        if outcome.severed() {
            self.disturb_neighbors(handle);
        }
        Ok(outcome)
    }

    /// False for stale handles, broken and inert tethers.
    pub fn has_active_connection(&self, handle: TetherHandle) -> bool {
        self.get(handle)
            .map(TetherInstance::has_active_connection)
            .unwrap_or(false)
    }

    /// Attributes the next stretch of this tether to an outside cause
    /// for the configured attribution window.
    pub fn notify_external_disturbance(&mut self, handle: TetherHandle) -> TetherResult<()> {
        let now = self.now;
        let instance = self.slot_mut(handle)?;
        let window = instance.config().engagement.external_attribution_window as SimTime;
        instance.mark_disturbed(now + window);
        Ok(())
    }

    /// Marks every other tether sharing a body with `source` as disturbed.
    fn disturb_neighbors(&mut self, source: TetherHandle) {
        let Some(desc) = self.get(source).map(|i| *i.desc()) else {
            return;
        };
        let now = self.now;
        for i in 0..self.order.len() {
            let handle = self.order[i];
            if handle == source {
                continue;
            }
            if let Some(instance) = self.slots[handle.index()].instance.as_mut() {
                let shares = instance.touches(desc.self_body)
                    || desc.other_body.is_some_and(|b| instance.touches(b));
                if shares {
                    let window = instance.config().engagement.external_attribution_window;
                    instance.mark_disturbed(now + window as SimTime);
                }
            }
        }
    }

    // ─── Suppression ─────────────────────────────────────────────

    /// Turns global suppression on or off.
    ///
    /// On: every live tether resets travel and dwell state and its
    /// native break force goes infinite. Off: break forces are
    /// recomputed from criteria and arming state. Setting the current
    /// value again is a no-op.
    pub fn set_global_suppressed(&mut self, suppressed: bool, env: &mut Environment<'_>) {
        if self.suppressed == suppressed {
            return;
        }
        self.suppressed = suppressed;
        info!(suppressed, tethers = self.order.len(), "global suppression changed");

        let mut frame = Frame {
            now: self.now,
            suppressed,
            events: &mut self.listeners,
        };
        for handle in &self.order {
            if let Some(instance) = self.slots[handle.index()].instance.as_mut() {
                instance.apply_suppression(&mut frame, env);
            }
        }
    }

    // ─── Step ────────────────────────────────────────────────────

    /// Advances the clock by `dt` and steps every live tether in
    /// registration order. Returns the number of tethers that severed.
    pub fn step_all(&mut self, dt: f32, env: &mut Environment<'_>) -> usize {
        self.now += dt.max(0.0) as SimTime;
        let mut severed = 0;
        for i in 0..self.order.len() {
            let handle = self.order[i];
            let outcome = {
                let Some(instance) = self.slots[handle.index()].instance.as_mut() else {
                    continue;
                };
                let mut frame = Frame {
                    now: self.now,
                    suppressed: self.suppressed,
                    events: &mut self.listeners,
                };
                instance.step(dt, &mut frame, env)
            };
            if outcome.is_some_and(BreakOutcome::severed) {
                severed += 1;
                self.disturb_neighbors(handle);
            }
        }
        severed
    }
}

impl Default for SuppressionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBreakListener for SuppressionRegistry {
    fn on_native_break(&mut self, joint: JointId, env: &mut Environment<'_>) -> BreakOutcome {
        let Some(handle) = self
            .iter()
            .find(|i| i.joint() == Some(joint))
            .map(TetherInstance::handle)
        else {
            return BreakOutcome::Ignored;
        };
        let Ok((instance, mut frame)) = self.instance_and_frame(handle) else {
            return BreakOutcome::Ignored;
        };
        let outcome = instance.native_break(&mut frame, env);
        if outcome.severed() {
            self.disturb_neighbors(handle);
        }
        outcome
    }
}

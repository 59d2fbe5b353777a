//! Physics backend seam.
//!
//! The engine never talks to a concrete solver. A backend adapter
//! implements [`PhysicsBackend`] for transforms and joint plumbing, and
//! forwards the solver's break notifications into a
//! [`NativeBreakListener`] (the registry).

use serde::{Deserialize, Serialize};

use tether_math::{Pose, Vec3};
use tether_types::{BodyId, JointId, TetherResult};

use crate::collaborators::Environment;
use crate::publisher::BreakOutcome;

/// Spring-damper drive parameters applied to a native joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveParams {
    pub spring: f32,
    pub damper: f32,
    pub max_force: f32,
}

/// Everything a backend needs to build one native joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDesc {
    pub self_body: BodyId,
    pub other_body: BodyId,
    /// Anchor in the self body's local frame.
    pub anchor_self: Vec3,
    /// Anchor in the other body's local frame.
    pub anchor_other: Vec3,
    /// World-space `other - self` anchor offset the drive holds.
    pub rest_offset: Vec3,
    pub drive: DriveParams,
    /// Initial break-force limit; infinite means unbreakable.
    pub break_force: f32,
}

/// Trait for rigid-body/constraint solvers.
///
/// # Implementations
///
/// - [`KinematicBackend`](crate::kinematic::KinematicBackend): in-memory reference backend
pub trait PhysicsBackend {
    /// World transform of a body, or `None` if it no longer exists.
    fn body_pose(&self, body: BodyId) -> Option<Pose>;

    /// Creates a native joint. The joint must stay alive until
    /// [`destroy_joint`](Self::destroy_joint), even after the solver
    /// reports it as broken.
    fn create_joint(&mut self, desc: &JointDesc) -> TetherResult<JointId>;

    /// Writes drive parameters. Called once per step.
    fn set_drive(&mut self, joint: JointId, drive: DriveParams);

    /// Sets the break-force limit (`f32::INFINITY` = never breaks).
    fn set_break_force(&mut self, joint: JointId, force: f32);

    /// Releases all solver resources held by the joint.
    fn destroy_joint(&mut self, joint: JointId);

    /// Returns the backend's name.
    fn name(&self) -> &str;
}

/// Receiver for solver-reported joint breaks.
///
/// The backend adapter calls this once per joint the solver reports as
/// broken. Implementors route it into the owning tether's break path.
pub trait NativeBreakListener {
    fn on_native_break(&mut self, joint: JointId, env: &mut Environment<'_>) -> BreakOutcome;
}

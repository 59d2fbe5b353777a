//! Kinematic reference backend.
//!
//! Bodies are placed directly by the caller; nothing is integrated.
//! Joints record the last drive and break force written to them, and
//! can report breaks either on demand (`simulate_native_break`) or from
//! a crude Hooke's-law force estimate (`evaluate_forces`).
//!
//! This backend exists to:
//! 1. Drive the engine deterministically in tests and the CLI
//! 2. Verify the `PhysicsBackend` seam carries everything the engine needs
//! 3. Observe what the engine writes to a joint

use std::collections::{BTreeMap, HashMap};

use tether_math::{Pose, Vec3};
use tether_types::{BodyId, JointId, TetherError, TetherResult};

use crate::backend::{DriveParams, JointDesc, PhysicsBackend};

/// State of one kinematic joint.
#[derive(Debug, Clone, Copy)]
pub struct JointRecord {
    pub desc: JointDesc,
    pub drive: DriveParams,
    pub break_force: f32,
    /// Set once a break has been reported; the joint stays allocated
    /// until the engine destroys it.
    pub reported_broken: bool,
}

/// In-memory body/joint table.
pub struct KinematicBackend {
    bodies: HashMap<BodyId, Pose>,
    /// Ordered by id so force breaks queue in creation order.
    joints: BTreeMap<JointId, JointRecord>,
    next_joint: u32,
    pending_breaks: Vec<JointId>,
    fail_next_create: bool,
    created_total: u32,
    destroyed_total: u32,
}

impl KinematicBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            joints: BTreeMap::new(),
            next_joint: 0,
            pending_breaks: Vec::new(),
            fail_next_create: false,
            created_total: 0,
            destroyed_total: 0,
        }
    }

    /// Adds (or replaces) a body at the given position.
    pub fn add_body(&mut self, body: BodyId, position: Vec3) {
        self.bodies.insert(body, Pose::from_translation(position));
    }

    /// Sets a body's full pose.
    pub fn set_body_pose(&mut self, body: BodyId, pose: Pose) {
        self.bodies.insert(body, pose);
    }

    /// Moves an existing body. Unknown bodies are ignored.
    pub fn set_body_position(&mut self, body: BodyId, position: Vec3) {
        if let Some(pose) = self.bodies.get_mut(&body) {
            pose.position = position;
        }
    }

    /// Removes a body, as if it were destroyed in the scene.
    pub fn remove_body(&mut self, body: BodyId) {
        self.bodies.remove(&body);
    }

    /// Makes the next `create_joint` call fail.
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    pub fn joint(&self, joint: JointId) -> Option<&JointRecord> {
        self.joints.get(&joint)
    }

    /// Number of live joints.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Total joints ever created.
    pub fn created_total(&self) -> u32 {
        self.created_total
    }

    /// Total joints ever destroyed.
    pub fn destroyed_total(&self) -> u32 {
        self.destroyed_total
    }

    /// Queues a break report for `joint`, regardless of force.
    pub fn simulate_native_break(&mut self, joint: JointId) {
        if let Some(record) = self.joints.get_mut(&joint) {
            if !record.reported_broken {
                record.reported_broken = true;
                self.pending_breaks.push(joint);
            }
        }
    }

    /// Estimates each joint's force as `spring * |offset - rest|` and
    /// queues a break for any that exceed their limit, in joint id order.
    pub fn evaluate_forces(&mut self) {
        for (&id, record) in self.joints.iter_mut() {
            if record.reported_broken || !record.break_force.is_finite() {
                continue;
            }
            let (Some(a), Some(b)) = (
                self.bodies.get(&record.desc.self_body),
                self.bodies.get(&record.desc.other_body),
            ) else {
                continue;
            };
            let offset = b.transform_point(record.desc.anchor_other)
                - a.transform_point(record.desc.anchor_self);
            let force = record.drive.spring * (offset - record.desc.rest_offset).length();
            if force > record.break_force {
                record.reported_broken = true;
                self.pending_breaks.push(id);
            }
        }
    }

    /// Takes all queued break reports, oldest first.
    pub fn drain_native_breaks(&mut self) -> Vec<JointId> {
        std::mem::take(&mut self.pending_breaks)
    }
}

impl Default for KinematicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for KinematicBackend {
    fn body_pose(&self, body: BodyId) -> Option<Pose> {
        self.bodies.get(&body).copied()
    }

    fn create_joint(&mut self, desc: &JointDesc) -> TetherResult<JointId> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(TetherError::Backend("joint creation rejected".into()));
        }
        if !self.bodies.contains_key(&desc.self_body) {
            return Err(TetherError::MissingBody(desc.self_body));
        }
        if !self.bodies.contains_key(&desc.other_body) {
            return Err(TetherError::MissingBody(desc.other_body));
        }
        let id = JointId(self.next_joint);
        self.next_joint += 1;
        self.created_total += 1;
        self.joints.insert(
            id,
            JointRecord {
                desc: *desc,
                drive: desc.drive,
                break_force: desc.break_force,
                reported_broken: false,
            },
        );
        Ok(id)
    }

    fn set_drive(&mut self, joint: JointId, drive: DriveParams) {
        if let Some(record) = self.joints.get_mut(&joint) {
            record.drive = drive;
        }
    }

    fn set_break_force(&mut self, joint: JointId, force: f32) {
        if let Some(record) = self.joints.get_mut(&joint) {
            record.break_force = force;
        }
    }

    fn destroy_joint(&mut self, joint: JointId) {
        if self.joints.remove(&joint).is_some() {
            self.destroyed_total += 1;
            self.pending_breaks.retain(|&j| j != joint);
        }
    }

    fn name(&self) -> &str {
        "kinematic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(other: BodyId) -> JointDesc {
        JointDesc {
            self_body: BodyId(0),
            other_body: other,
            anchor_self: Vec3::ZERO,
            anchor_other: Vec3::ZERO,
            rest_offset: Vec3::ZERO,
            drive: DriveParams {
                spring: 100.0,
                damper: 0.0,
                max_force: 100.0,
            },
            break_force: 10.0,
        }
    }

    #[test]
    fn force_breaks_queue_in_joint_order() {
        let mut backend = KinematicBackend::new();
        backend.add_body(BodyId(0), Vec3::ZERO);
        let mut created = Vec::new();
        for i in 1..=8 {
            backend.add_body(BodyId(i), Vec3::ZERO);
            created.push(backend.create_joint(&desc(BodyId(i))).unwrap());
        }
        for i in 1..=8 {
            backend.set_body_position(BodyId(i), Vec3::X);
        }

        backend.evaluate_forces();
        assert_eq!(backend.drain_native_breaks(), created);
        backend.evaluate_forces();
        assert!(backend.drain_native_breaks().is_empty());
    }

    #[test]
    fn infinite_limit_never_breaks() {
        let mut backend = KinematicBackend::new();
        backend.add_body(BodyId(0), Vec3::ZERO);
        backend.add_body(BodyId(1), Vec3::ZERO);
        let joint = backend.create_joint(&desc(BodyId(1))).unwrap();
        backend.set_break_force(joint, f32::INFINITY);
        backend.set_body_position(BodyId(1), Vec3::X * 100.0);

        backend.evaluate_forces();
        assert!(backend.drain_native_breaks().is_empty());
    }
}

//! Strongly-typed identifiers.
//!
//! Newtype wrappers prevent accidental mixing of body ids with
//! joint ids or attachable-entity ids.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rigid body known to the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Native joint (constraint) created by the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointId(pub u32);

/// External attachable entity whose detach state a tether publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Generational index of a tether slot in the registry.
///
/// A destroyed slot is reused with a bumped generation, so an old
/// handle can never resolve to the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TetherHandle {
    pub index: u32,
    pub generation: u32,
}

impl TetherHandle {
    /// Returns the slot index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for TetherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tether#{}v{}", self.index, self.generation)
    }
}

impl From<u32> for BodyId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for JointId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for EntityId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

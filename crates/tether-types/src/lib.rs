//! # tether-types
//!
//! Shared types, identifiers, error types, and constants
//! for the tether break engine.
//!
//! This crate has zero domain logic. It defines the vocabulary
//! that all other tether crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod reason;
pub mod scalar;

pub use error::{TetherError, TetherResult};
pub use ids::{BodyId, EntityId, JointId, TetherHandle};
pub use reason::{BreakReason, DetachReason};
pub use scalar::{Scalar, SimTime};

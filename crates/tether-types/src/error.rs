//! Error types for the tether engine.
//!
//! Fallible setup paths return `TetherResult<T>`. Break paths never
//! return errors; they report outcomes instead.

use thiserror::Error;

use crate::ids::{BodyId, TetherHandle};

/// Unified error type for the tether engine.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A referenced rigid body does not exist in the physics backend.
    #[error("Missing body: {0:?}")]
    MissingBody(BodyId),

    /// The handle refers to a destroyed (or never created) tether.
    #[error("Stale tether handle: {0}")]
    StaleHandle(TetherHandle),

    /// The tether already severed; a new attachment needs a new tether.
    #[error("Tether already broken: {0}")]
    Broken(TetherHandle),

    /// The physics backend refused an operation.
    #[error("Physics backend error: {0}")]
    Backend(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, TetherError>`.
pub type TetherResult<T> = Result<T, TetherError>;

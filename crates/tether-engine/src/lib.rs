//! # tether-engine
//!
//! Break logic for physically-simulated tethers between two rigid bodies.
//!
//! Each step a tether samples its anchors, accumulates travel, shapes
//! the joint drive from tension, and decides whether to break. Breaks
//! funnel through one idempotent publish path that writes detach state
//! exactly once.
//!
//! ## Key Types
//!
//! - [`SuppressionRegistry`]: owns all tethers, global suppression and the clock
//! - [`TetherInstance`]: one tether's lifecycle and per-step pipeline
//! - [`TetherConfig`]: every designer-facing tunable, loadable from TOML
//! - [`PhysicsBackend`]: seam to the rigid-body solver
//! - [`KinematicBackend`]: in-memory reference backend
//! - [`TetherRig`]: backend, collaborators and registry bundled for scripted runs

pub mod backend;
pub mod collaborators;
pub mod config;
pub mod dwell;
pub mod engagement;
pub mod evaluator;
pub mod instance;
pub mod kinematic;
pub mod publisher;
pub mod registry;
pub mod rig;
pub mod sampler;
pub mod scenarios;
pub mod tension;
pub mod travel;

pub use backend::{DriveParams, JointDesc, NativeBreakListener, PhysicsBackend};
pub use collaborators::{
    AttachmentStore, AttachmentTable, EngagementState, Environment, FeedbackSink, SessionContext,
};
pub use config::{CriteriaMask, Criterion, TetherConfig};
pub use instance::{Lifecycle, RetuneParams, TetherDesc, TetherInstance};
pub use kinematic::KinematicBackend;
pub use publisher::{BreakCause, BreakOutcome};
pub use registry::SuppressionRegistry;
pub use rig::TetherRig;
pub use scenarios::{ScenarioKind, ScenarioReport, ScenarioRunner};

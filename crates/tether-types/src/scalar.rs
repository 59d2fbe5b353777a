//! Scalar type alias for geometry and tuning values.
//!
//! Geometry is `f32` to match the physics backend's transforms.
//! Simulation time is tracked separately as `f64` (see [`SimTime`]).

/// The floating-point type used for positions, velocities and thresholds.
pub type Scalar = f32;

/// Absolute simulation time in seconds.
///
/// Kept in double precision so long sessions don't lose the
/// sub-millisecond resolution the arming and grace windows rely on.
pub type SimTime = f64;

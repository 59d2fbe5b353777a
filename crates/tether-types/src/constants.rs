//! Engine constants and tuning defaults.

/// Default fixed simulation timestep (seconds). 1/60th of a second.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Guard for divisions by `dt`, `max_distance` and smoothing windows.
pub const EPSILON: f32 = 1.0e-6;

/// Upper bound on startup reconstruction attempts.
pub const MAX_STARTUP_RETRIES: u32 = 5;

/// Default delay after construction before any break logic runs (seconds).
pub const DEFAULT_ARM_DELAY: f32 = 0.1;

/// Default startup grace window (seconds).
pub const DEFAULT_GRACE_SECONDS: f32 = 0.25;

/// Break-force value meaning "never breaks".
pub const UNBREAKABLE: f32 = f32::INFINITY;

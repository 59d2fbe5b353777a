//! Monotonic response curves mapping `[0, 1] → [0, 1]`.
//!
//! Curves are authored in config. Evaluation never allocates, so it is
//! safe to call from the per-step path.

use serde::{Deserialize, Serialize};

use crate::interp::{clamp01, lerp};

/// A monotonic non-decreasing curve over the unit interval.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseCurve {
    /// `y = x`.
    Linear,
    /// Hermite smoothstep `3x² - 2x³`.
    #[default]
    SmoothStep,
    /// `y = x^exponent`. Exponents above 1 ease in, below 1 ease out.
    Power { exponent: f32 },
    /// Piecewise-linear through `[x, y]` keys sorted by `x`.
    ///
    /// Inputs left of the first key take its `y`; right of the last
    /// key take the last `y`.
    Keyed { keys: Vec<[f32; 2]> },
}

impl ResponseCurve {
    /// Evaluates the curve at `x`, clamping input and output to `[0, 1]`.
    pub fn evaluate(&self, x: f32) -> f32 {
        let x = clamp01(x);
        let y = match self {
            ResponseCurve::Linear => x,
            ResponseCurve::SmoothStep => x * x * (3.0 - 2.0 * x),
            ResponseCurve::Power { exponent } => x.powf(exponent.max(0.0)),
            ResponseCurve::Keyed { keys } => evaluate_keys(keys, x),
        };
        clamp01(y)
    }

    /// Checks that the curve is non-decreasing and well-formed.
    ///
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        match self {
            ResponseCurve::Linear | ResponseCurve::SmoothStep => Ok(()),
            ResponseCurve::Power { exponent } => {
                if exponent.is_finite() && *exponent > 0.0 {
                    Ok(())
                } else {
                    Err(format!("power exponent must be positive, got {exponent}"))
                }
            }
            ResponseCurve::Keyed { keys } => {
                if keys.is_empty() {
                    return Err("keyed curve needs at least one key".into());
                }
                for pair in keys.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if b[0] < a[0] {
                        return Err(format!("keys not sorted by x at x={}", b[0]));
                    }
                    if b[1] < a[1] {
                        return Err(format!("curve decreases between x={} and x={}", a[0], b[0]));
                    }
                }
                Ok(())
            }
        }
    }
}

fn evaluate_keys(keys: &[[f32; 2]], x: f32) -> f32 {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return x,
    };
    if x <= first[0] {
        return first[1];
    }
    if x >= last[0] {
        return last[1];
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if x <= b[0] {
            let span = b[0] - a[0];
            if span <= f32::EPSILON {
                return b[1];
            }
            return lerp(a[1], b[1], (x - a[0]) / span);
        }
    }
    last[1]
}

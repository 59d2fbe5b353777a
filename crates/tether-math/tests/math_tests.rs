//! Integration tests for tether-math.

use proptest::prelude::*;
use tether_math::{clamp01, lerp, safe_div, Pose, Quat, ResponseCurve, SpaceMode, Vec3};

// ─── Interpolation Tests ──────────────────────────────────────

#[test]
fn clamp01_bounds() {
    assert_eq!(clamp01(-3.0), 0.0);
    assert_eq!(clamp01(0.25), 0.25);
    assert_eq!(clamp01(7.0), 1.0);
    assert_eq!(clamp01(f32::NAN), 0.0);
}

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
    assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
    assert!((lerp(2.0, 4.0, 0.5) - 3.0).abs() < 1e-6);
}

#[test]
fn safe_div_zero_denominator_is_finite() {
    let v = safe_div(1.0, 0.0);
    assert!(v.is_finite());
    assert!(v > 0.0);
}

// ─── Space Filter Tests ───────────────────────────────────────

#[test]
fn planar_xy_drops_z() {
    let v = Vec3::new(3.0, 4.0, 12.0);
    assert_eq!(SpaceMode::PlanarXy.filter(v), Vec3::new(3.0, 4.0, 0.0));
    assert!((SpaceMode::PlanarXy.length(v) - 5.0).abs() < 1e-6);
}

#[test]
fn full_keeps_all_axes() {
    let v = Vec3::new(3.0, 4.0, 12.0);
    assert!((SpaceMode::Full.length(v) - 13.0).abs() < 1e-5);
    assert!(!SpaceMode::Full.is_planar());
    assert!(SpaceMode::PlanarYz.is_planar());
}

#[test]
fn space_mode_serializes_snake_case() {
    let json = serde_json::to_string(&SpaceMode::PlanarXz).unwrap();
    assert_eq!(json, "\"planar_xz\"");
}

// ─── Response Curve Tests ─────────────────────────────────────

#[test]
fn smoothstep_midpoint() {
    let c = ResponseCurve::SmoothStep;
    assert!((c.evaluate(0.5) - 0.5).abs() < 1e-6);
    assert_eq!(c.evaluate(0.0), 0.0);
    assert_eq!(c.evaluate(1.0), 1.0);
}

#[test]
fn power_curve_eases_in() {
    let c = ResponseCurve::Power { exponent: 2.0 };
    assert!((c.evaluate(0.5) - 0.25).abs() < 1e-6);
}

#[test]
fn keyed_curve_interpolates_and_holds_ends() {
    let c = ResponseCurve::Keyed {
        keys: vec![[0.2, 0.0], [0.6, 0.8], [1.0, 1.0]],
    };
    assert_eq!(c.evaluate(0.1), 0.0);
    assert!((c.evaluate(0.4) - 0.4).abs() < 1e-6);
    assert!((c.evaluate(0.8) - 0.9).abs() < 1e-6);
    assert_eq!(c.evaluate(1.0), 1.0);
}

#[test]
fn keyed_curve_rejects_decreasing_keys() {
    let c = ResponseCurve::Keyed {
        keys: vec![[0.0, 0.5], [1.0, 0.2]],
    };
    assert!(c.check().is_err());
}

#[test]
fn keyed_curve_rejects_empty() {
    let c = ResponseCurve::Keyed { keys: vec![] };
    assert!(c.check().is_err());
}

#[test]
fn curve_from_toml() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        curve: ResponseCurve,
    }
    let w: Wrapper = toml::from_str("curve = { kind = \"power\", exponent = 3.0 }").unwrap();
    assert_eq!(w.curve, ResponseCurve::Power { exponent: 3.0 });
}

// ─── Pose Tests ───────────────────────────────────────────────

#[test]
fn pose_transforms_local_anchor() {
    let pose = Pose {
        position: Vec3::new(1.0, 0.0, 0.0),
        rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
    };
    let world = pose.transform_point(Vec3::new(1.0, 0.0, 0.0));
    assert!((world - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
}

// ─── Properties ───────────────────────────────────────────────

proptest! {
    #[test]
    fn curves_stay_in_unit_interval(x in -10.0f32..10.0, exponent in 0.1f32..6.0) {
        for curve in [
            ResponseCurve::Linear,
            ResponseCurve::SmoothStep,
            ResponseCurve::Power { exponent },
        ] {
            let y = curve.evaluate(x);
            prop_assert!((0.0..=1.0).contains(&y));
        }
    }

    #[test]
    fn smoothstep_is_monotonic(a in 0.0f32..1.0, b in 0.0f32..1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let c = ResponseCurve::SmoothStep;
        prop_assert!(c.evaluate(lo) <= c.evaluate(hi) + 1e-6);
    }
}

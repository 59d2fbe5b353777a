//! Integration tests for tether-engine: lifecycle, publishing,
//! attribution and configuration.

use proptest::prelude::*;
use tether_engine::collaborators::StaticEngagement;
use tether_engine::config::{CriteriaMask, Criterion, TetherConfig};
use tether_engine::tension::{normalized_stretch, stretch};
use tether_engine::travel::TravelAccumulator;
use tether_engine::{BreakOutcome, Lifecycle, RetuneParams, TetherRig};
use tether_math::{ResponseCurve, SpaceMode, Vec3};
use tether_telemetry::{EventKind, RecordingListener};
use tether_types::{BodyId, DetachReason, EntityId, TetherError};

const A: BodyId = BodyId(0);
const B: BodyId = BodyId(1);
const C: BodyId = BodyId(2);
const E: EntityId = EntityId(1);
const DT: f32 = 1.0 / 60.0;

fn rig() -> TetherRig {
    let mut rig = TetherRig::new();
    rig.add_body(A, Vec3::ZERO);
    rig.add_body(B, Vec3::ZERO);
    rig.add_body(C, Vec3::ZERO);
    rig
}

// ─── Lifecycle Tests ──────────────────────────────────────────

#[test]
fn missing_other_body_starts_inert_until_reconnected() {
    let mut rig = rig();
    let (recorder, log) = RecordingListener::new();
    rig.registry.add_listener(Box::new(recorder));

    let h = rig.spawn(A, None, E, TetherConfig::default()).unwrap();
    let t = rig.tether(h).unwrap();
    assert_eq!(t.lifecycle(), Lifecycle::Inert);
    assert!(t.joint().is_none());
    assert!(!rig.registry.has_active_connection(h));
    assert_eq!(rig.run(10, DT), 0);
    assert_eq!(rig.force_break(h, "x", true).unwrap(), BreakOutcome::Ignored);

    rig.reconnect(h, B).unwrap();
    assert_eq!(rig.tether(h).unwrap().lifecycle(), Lifecycle::ArmedPending);
    assert!(rig.registry.has_active_connection(h));
    assert_eq!(log.count(|e| matches!(e.kind, EventKind::WentInert)), 1);
    assert_eq!(log.count(|e| matches!(e.kind, EventKind::Reconnected)), 1);
}

#[test]
fn non_positive_max_distance_is_inert_not_an_error() {
    let mut rig = rig();
    let config = TetherConfig {
        max_distance: 0.0,
        ..Default::default()
    };
    let h = rig.spawn(A, Some(B), E, config).unwrap();
    assert_eq!(rig.tether(h).unwrap().lifecycle(), Lifecycle::Inert);
    assert_eq!(rig.backend.joint_count(), 0);
}

#[test]
fn vanished_body_makes_tether_inert() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.run(20, DT);

    rig.backend.remove_body(B);
    assert_eq!(rig.step(DT), 0);
    assert_eq!(rig.tether(h).unwrap().lifecycle(), Lifecycle::Inert);
    assert_eq!(rig.backend.joint_count(), 0);
    assert!(rig.record(E).is_attached);
}

#[test]
fn failed_joint_creation_leaves_tether_inert() {
    let mut rig = rig();
    rig.backend.fail_next_create();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    assert_eq!(rig.tether(h).unwrap().lifecycle(), Lifecycle::Inert);

    rig.reconnect(h, B).unwrap();
    assert!(rig.registry.has_active_connection(h));
}

#[test]
fn reconnect_recaptures_rest_separation() {
    let mut rig = rig();
    rig.move_body(C, Vec3::new(0.0, 2.0, 0.0));
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.run(20, DT);

    rig.reconnect(h, C).unwrap();
    let t = rig.tether(h).unwrap();
    assert_eq!(t.rest_separation(), Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(t.startup_retry_count(), 0);

    // 2m away, but that is the new rest: no stretch
    assert_eq!(rig.run(20, DT), 0);
    assert!(rig.tether(h).unwrap().stretch() < 1e-6);
}

#[test]
fn broken_tether_refuses_reconnect_and_retune() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.force_break(h, "cut", false).unwrap();

    assert!(matches!(rig.reconnect(h, C), Err(TetherError::Broken(_))));
    let params = RetuneParams {
        max_distance: 1.0,
        spring: 100.0,
        damper: 5.0,
        drive_max: 500.0,
    };
    assert!(matches!(rig.retune(h, params), Err(TetherError::Broken(_))));
    assert_eq!(
        rig.force_break(h, "again", false).unwrap(),
        BreakOutcome::Ignored
    );
}

#[test]
fn retune_resets_accumulators_and_rearms() {
    let mut rig = rig();
    let mut config = TetherConfig::default();
    config.breaking.criteria = CriteriaMask::of(&[Criterion::Distance, Criterion::AbsoluteTravel]);
    let h = rig.spawn(A, Some(B), E, config).unwrap();
    rig.run(20, DT);
    rig.move_body(A, Vec3::new(0.2, 0.0, 0.0));
    rig.step(DT);
    assert!(rig.tether(h).unwrap().absolute_travel() > 0.0);

    let params = RetuneParams {
        max_distance: 2.0,
        spring: 100.0,
        damper: 5.0,
        drive_max: 500.0,
    };
    rig.retune(h, params).unwrap();
    let t = rig.tether(h).unwrap();
    assert_eq!(t.lifecycle(), Lifecycle::ArmedPending);
    assert_eq!(t.absolute_travel(), 0.0);
    assert_eq!(t.config().max_distance, 2.0);
    let joint = t.joint().unwrap();
    assert_eq!(rig.backend.joint(joint).unwrap().drive.spring, 100.0);

    rig.run(20, DT);
    rig.move_body(B, Vec3::new(1.5, 0.0, 0.0));
    assert_eq!(rig.run(5, DT), 0);
}

#[test]
fn invalid_retune_is_rejected_without_side_effects() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    let joint = rig.tether(h).unwrap().joint();
    let params = RetuneParams {
        max_distance: 1.0,
        spring: -1.0,
        damper: 5.0,
        drive_max: 500.0,
    };
    assert!(matches!(rig.retune(h, params), Err(TetherError::InvalidConfig(_))));
    assert_eq!(rig.tether(h).unwrap().joint(), joint);
    assert_eq!(rig.tether(h).unwrap().config().drive.spring, 400.0);
}

#[test]
fn destroyed_handles_go_stale() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.destroy(h).unwrap();

    assert_eq!(rig.registry.live_count(), 0);
    assert_eq!(rig.backend.joint_count(), 0);
    assert!(rig.tether(h).is_none());
    assert!(!rig.registry.has_active_connection(h));
    assert!(matches!(rig.force_break(h, "x", false), Err(TetherError::StaleHandle(_))));
    assert!(matches!(rig.destroy(h), Err(TetherError::StaleHandle(_))));

    let h2 = rig.spawn(A, Some(C), E, TetherConfig::default()).unwrap();
    assert_eq!(h2.index, h.index);
    assert_ne!(h2.generation, h.generation);
    assert!(rig.tether(h).is_none());
    assert!(rig.tether(h2).is_some());
}

#[test]
fn invalid_config_is_rejected_at_spawn() {
    let mut rig = rig();
    let mut config = TetherConfig::default();
    config.drive.damper = -3.0;
    assert!(matches!(
        rig.spawn(A, Some(B), E, config),
        Err(TetherError::InvalidConfig(_))
    ));
    assert_eq!(rig.registry.live_count(), 0);
    assert_eq!(rig.backend.joint_count(), 0);
}

#[test]
fn spawning_while_suppressed_starts_unbreakable() {
    let mut rig = rig();
    rig.set_suppressed(true);
    let h = rig.spawn(A, Some(B), E, TetherConfig::rigid()).unwrap();
    rig.run(20, DT);

    let joint = rig.tether(h).unwrap().joint().unwrap();
    assert!(rig.backend.joint(joint).unwrap().break_force.is_infinite());
    assert!(rig.tether(h).unwrap().break_force_armed());
}

// ─── Publishing Tests ─────────────────────────────────────────

#[test]
fn shared_entity_detaches_once() {
    let mut rig = rig();
    let h1 = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    let h2 = rig.spawn(A, Some(C), E, TetherConfig::default()).unwrap();

    assert_eq!(
        rig.force_break(h1, "first", true).unwrap(),
        BreakOutcome::Published {
            detach: DetachReason::PhysicsBreak
        }
    );
    assert_eq!(
        rig.force_break(h2, "second", false).unwrap(),
        BreakOutcome::AlreadyDetached
    );
    assert_eq!(rig.attachments.write_count(), 1);
    assert_eq!(rig.feedback.audio, 1);
    assert_eq!(rig.record(E).last_detach_reason, Some(DetachReason::PhysicsBreak));
    assert_eq!(rig.tether(h2).unwrap().lifecycle(), Lifecycle::Broken);
}

#[test]
fn permanently_detached_entity_cannot_reattach() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.force_break(h, "cut", false).unwrap();
    assert!(!rig.attachments.attach(E));
    assert!(!rig.record(E).is_attached);
}

#[test]
fn session_suppression_keeps_tether_alive() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.run(20, DT);

    rig.session.suppress_detach_events = true;
    assert_eq!(
        rig.force_break(h, "load", false).unwrap(),
        BreakOutcome::SessionSuppressed
    );
    assert!(rig.registry.has_active_connection(h));
    assert_eq!(rig.attachments.write_count(), 0);
    assert_eq!(rig.feedback.audio, 0);

    rig.session.suppress_detach_events = false;
    assert!(rig.force_break(h, "load", false).unwrap().severed());
}

#[test]
fn listeners_see_break_events() {
    let mut rig = rig();
    let (recorder, log) = RecordingListener::new();
    rig.registry.add_listener(Box::new(recorder));
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.run(20, DT);
    rig.force_break(h, "cut", false).unwrap();

    assert_eq!(log.count(|e| matches!(e.kind, EventKind::Constructed { retry: 0 })), 1);
    assert_eq!(log.count(|e| matches!(e.kind, EventKind::Armed { native_force: false })), 1);
    assert_eq!(
        log.count(|e| matches!(
            e.kind,
            EventKind::Broke {
                detach: DetachReason::PlayerAction,
                published: true,
                ..
            }
        )),
        1
    );
    assert!(log.snapshot().iter().all(|e| e.handle == h));
}

#[test]
fn disabled_listeners_receive_nothing() {
    let mut rig = rig();
    let (recorder, log) = RecordingListener::new();
    rig.registry.add_listener(Box::new(recorder));
    rig.registry.listeners_mut().set_enabled(false);
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.force_break(h, "cut", false).unwrap();
    assert!(log.is_empty());
}

#[test]
fn adaptive_drive_tracks_tension() {
    let mut rig = rig();
    let mut config = TetherConfig {
        max_distance: 1.0,
        ..Default::default()
    };
    config.tension.adaptive = true;
    config.tension.curve = ResponseCurve::Linear;
    config.tension.soft_zone_fraction = 0.0;
    let h = rig.spawn(A, Some(B), E, config).unwrap();
    let joint = rig.tether(h).unwrap().joint().unwrap();

    rig.step(DT);
    let relaxed = rig.backend.joint(joint).unwrap().drive.spring;
    assert!((relaxed - 400.0 * 0.25).abs() < 1e-3);

    rig.move_body(B, Vec3::new(0.5, 0.0, 0.0));
    rig.step(DT);
    assert!((rig.tether(h).unwrap().readout().tension - 0.5).abs() < 1e-5);
    let taut = rig.backend.joint(joint).unwrap().drive.spring;
    assert!(taut > relaxed);
}

#[test]
fn passive_intensity_scales_drive() {
    let mut rig = rig();
    let mut config = TetherConfig::default();
    config.engagement.passive_multiplier = 0.5;
    rig.engagement = StaticEngagement {
        engaged: false,
        passive_intensity: 0.5,
    };
    let h = rig.spawn(A, Some(B), E, config).unwrap();
    rig.step(DT);
    let joint = rig.tether(h).unwrap().joint().unwrap();
    assert!((rig.backend.joint(joint).unwrap().drive.spring - 100.0).abs() < 1e-3);
}

// ─── Attribution Tests ────────────────────────────────────────

fn gated_pluck() -> TetherConfig {
    let mut config = TetherConfig {
        max_distance: 1.0,
        ..Default::default()
    };
    config.engagement.only_break_when_engaged = true;
    config.dwell.pluck_enabled = true;
    config
}

fn loose() -> TetherConfig {
    let mut config = TetherConfig::default();
    config.breaking.criteria = CriteriaMask::NONE;
    config
}

#[test]
fn neighbor_detach_attributes_pluck_to_external_cause() {
    let mut rig = rig();
    rig.engagement = StaticEngagement::passive();
    let h1 = rig.spawn(A, Some(B), EntityId(1), loose()).unwrap();
    let h2 = rig.spawn(C, Some(B), EntityId(2), gated_pluck()).unwrap();
    rig.run(20, DT);

    assert!(rig.force_break(h1, "snap", true).unwrap().severed());
    let now = rig.registry.now();
    assert!(rig.tether(h2).unwrap().is_disturbed(now));

    rig.move_body(B, Vec3::new(0.9, 0.0, 0.0));
    assert_eq!(rig.run(8, DT), 1);
    assert!(!rig.registry.has_active_connection(h2));
    assert_eq!(
        rig.record(EntityId(2)).last_detach_reason,
        Some(DetachReason::PhysicsBreak)
    );
}

#[test]
fn undisturbed_pluck_is_gated_while_passive() {
    let mut rig = rig();
    rig.engagement = StaticEngagement::passive();
    let _h1 = rig.spawn(A, Some(B), EntityId(1), loose()).unwrap();
    let h2 = rig.spawn(C, Some(B), EntityId(2), gated_pluck()).unwrap();
    rig.run(20, DT);

    rig.move_body(B, Vec3::new(0.9, 0.0, 0.0));
    assert_eq!(rig.run(30, DT), 0);
    assert!(rig.registry.has_active_connection(h2));
    assert!(rig.record(EntityId(2)).is_attached);
}

#[test]
fn gated_pluck_restarts_the_dwell() {
    let mut rig = rig();
    rig.engagement = StaticEngagement::passive();
    let h = rig.spawn(A, Some(B), E, gated_pluck()).unwrap();
    rig.run(20, DT);

    // 0.08s dwell at 60 Hz fires on the fifth step and is gated
    rig.move_body(B, Vec3::new(0.9, 0.0, 0.0));
    assert_eq!(rig.run(5, DT), 0);
    assert!(rig.tether(h).unwrap().pluck_timer() < 1e-6);

    rig.engagement = StaticEngagement::engaged();
    assert_eq!(rig.run(3, DT), 0);
    assert_eq!(rig.run(3, DT), 1);
    assert_eq!(
        rig.record(E).last_detach_reason,
        Some(DetachReason::PhysicsBreak)
    );
}

#[test]
fn external_disturbance_window_expires() {
    let mut rig = rig();
    let h = rig.spawn(A, Some(B), E, TetherConfig::default()).unwrap();
    rig.registry.notify_external_disturbance(h).unwrap();
    assert!(rig.tether(h).unwrap().is_disturbed(rig.registry.now()));

    rig.run(20, DT);
    assert!(!rig.tether(h).unwrap().is_disturbed(rig.registry.now()));

    rig.destroy(h).unwrap();
    assert!(rig.registry.notify_external_disturbance(h).is_err());
}

// ─── Configuration Tests ──────────────────────────────────────

#[test]
fn default_config_round_trips_through_toml() {
    let config = TetherConfig::planar_toy();
    let text = config.to_toml_string().unwrap();
    let back = TetherConfig::from_toml_str(&text).unwrap();
    assert_eq!(back.space, SpaceMode::PlanarXy);
    assert_eq!(back.max_distance, config.max_distance);
    assert_eq!(back.breaking.criteria, config.breaking.criteria);
    assert_eq!(back.tension.curve, config.tension.curve);
    assert!(back.dwell.pluck_enabled);
    assert_eq!(back.to_toml_string().unwrap(), text);
}

#[test]
fn partial_toml_fills_defaults() {
    let text = r#"
        max_distance = 1.5
        space = "planar_xz"

        [breaking]
        criteria = ["distance", "native_force"]
        break_force = 250.0

        [tension.curve]
        kind = "power"
        exponent = 2.0
    "#;
    let config = TetherConfig::from_toml_str(text).unwrap();
    assert_eq!(config.max_distance, 1.5);
    assert_eq!(config.space, SpaceMode::PlanarXz);
    assert!(config.breaking.criteria.contains(Criterion::NativeForce));
    assert!(!config.breaking.criteria.contains(Criterion::OwnSpeed));
    assert_eq!(config.native_break_force(), 250.0);
    assert_eq!(config.tension.curve, ResponseCurve::Power { exponent: 2.0 });
    assert_eq!(config.drive.spring, 400.0);
    assert_eq!(config.timing.max_startup_retries, 5);
}

#[test]
fn empty_toml_is_default() {
    let config = TetherConfig::from_toml_str("").unwrap();
    assert_eq!(config.max_distance, 0.75);
    assert_eq!(
        config.breaking.criteria,
        CriteriaMask::of(&[Criterion::Distance])
    );
    assert!(config.native_break_force().is_infinite());
}

#[test]
fn unknown_criterion_is_a_serialization_error() {
    let text = "[breaking]\ncriteria = [\"gravity\"]\n";
    assert!(matches!(
        TetherConfig::from_toml_str(text),
        Err(TetherError::Serialization(_))
    ));
}

#[test]
fn validation_rejects_nonsense() {
    let bad = [
        "[drive]\nspring = -1.0\n",
        "[tension]\nsoft_zone_fraction = 1.0\n",
        "[dwell]\npluck_threshold_fraction = 0.3\nrelease_pop_threshold_fraction = 0.5\n",
        "[breaking]\nbreak_force = 0.0\n",
        "[timing]\ngrace_seconds = -0.1\n",
        "max_distance = nan\n",
        "[tension.curve]\nkind = \"keyed\"\nkeys = []\n",
    ];
    for text in bad {
        assert!(
            matches!(
                TetherConfig::from_toml_str(text),
                Err(TetherError::InvalidConfig(_))
            ),
            "accepted: {text}"
        );
    }
}

#[test]
fn presets_are_valid() {
    TetherConfig::default().validate().unwrap();
    TetherConfig::planar_toy().validate().unwrap();
    TetherConfig::rigid().validate().unwrap();
    assert_eq!(TetherConfig::rigid().native_break_force(), 800.0);
}

#[test]
fn criteria_mask_serializes_as_names() {
    let mask = CriteriaMask::of(&[Criterion::OwnSpeed, Criterion::Distance]);
    let json = serde_json::to_string(&mask).unwrap();
    assert_eq!(json, r#"["distance","own_speed"]"#);
    let back: CriteriaMask = serde_json::from_str(&json).unwrap();
    assert_eq!(back, mask);
}

// ─── Property Tests ───────────────────────────────────────────

fn every_criterion() -> TetherConfig {
    let mut config = TetherConfig {
        max_distance: 0.5,
        ..Default::default()
    };
    config.breaking.criteria = CriteriaMask::of(&Criterion::ALL);
    config.dwell.pluck_enabled = true;
    config.dwell.release_pop_enabled = true;
    config
}

fn position() -> impl Strategy<Value = Vec3> {
    (-3.0f32..3.0, -3.0f32..3.0, -3.0f32..3.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn space() -> impl Strategy<Value = SpaceMode> {
    prop_oneof![
        Just(SpaceMode::Full),
        Just(SpaceMode::PlanarXy),
        Just(SpaceMode::PlanarXz),
        Just(SpaceMode::PlanarYz),
    ]
}

proptest! {
    #[test]
    fn prop_stretch_is_non_negative_and_normalizes(
        mode in space(),
        separation in position(),
        rest in position(),
        max_distance in -1.0f32..5.0,
    ) {
        let s = stretch(mode, separation, rest);
        prop_assert!(s >= 0.0);
        let n = normalized_stretch(s, max_distance);
        prop_assert!((0.0..=1.0).contains(&n));
    }

    #[test]
    fn prop_travel_is_monotonic(
        mode in space(),
        steps in prop::collection::vec((position(), position()), 1..50),
    ) {
        let mut travel = TravelAccumulator::new();
        let (mut abs, mut rel) = (0.0f32, 0.0f32);
        for (self_disp, rel_disp) in steps {
            travel.accumulate(mode, self_disp, rel_disp);
            prop_assert!(travel.absolute() >= abs);
            prop_assert!(travel.relative() >= rel);
            abs = travel.absolute();
            rel = travel.relative();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// While suppressed, no motion can write detach state.
    #[test]
    fn prop_suppressed_never_publishes(path in prop::collection::vec(position(), 1..40)) {
        let mut rig = rig();
        let h = rig.spawn(A, Some(B), E, every_criterion()).unwrap();
        rig.set_suppressed(true);
        for p in path {
            rig.move_body(B, p);
            rig.step(DT);
        }
        prop_assert_eq!(rig.attachments.write_count(), 0);
        prop_assert!(rig.record(E).is_attached);
        prop_assert!(rig.registry.has_active_connection(h));
        prop_assert_eq!(rig.tether(h).unwrap().absolute_travel(), 0.0);
    }

    /// However the bodies move, an entity is written at most once and
    /// feedback plays at most once.
    #[test]
    fn prop_entity_detaches_at_most_once(
        path in prop::collection::vec(position(), 1..60),
        cut_at in 0usize..60,
    ) {
        let mut rig = rig();
        let h1 = rig.spawn(A, Some(B), E, every_criterion()).unwrap();
        let h2 = rig.spawn(C, Some(B), E, every_criterion()).unwrap();
        for (i, p) in path.into_iter().enumerate() {
            rig.move_body(B, p);
            rig.step(DT);
            if i == cut_at {
                let _ = rig.force_break(h1, "cut", false);
                let _ = rig.force_break(h2, "cut", true);
            }
        }
        prop_assert!(rig.attachments.write_count() <= 1);
        prop_assert!(rig.feedback.audio <= 1);
        prop_assert_eq!(rig.feedback.audio, rig.attachments.write_count());
    }

    /// Readout stays normalized for any geometry.
    #[test]
    fn prop_readout_is_normalized(path in prop::collection::vec(position(), 1..30)) {
        let mut rig = rig();
        let mut config = every_criterion();
        config.breaking.criteria = CriteriaMask::NONE;
        config.dwell.pluck_enabled = false;
        config.dwell.release_pop_enabled = false;
        config.tension.adaptive = true;
        let h = rig.spawn(A, Some(B), E, config).unwrap();
        for p in path {
            rig.move_body(B, p);
            rig.step(DT);
            let r = *rig.tether(h).unwrap().readout();
            prop_assert!(r.stretch >= 0.0);
            prop_assert!((0.0..=1.0).contains(&r.normalized_stretch));
            prop_assert!((0.0..=1.0).contains(&r.tension));
        }
    }
}

//! End-to-end scenarios through the public engine API.

mod common;

use common::*;
use gesture_controller::gesture::{ActiveGesture, Category, DepthState, Gesture};
use gesture_controller::hand::LandmarkSnapshot;
use gesture_controller::{EngineConfig, FrameReport, GestureEngine};

fn run(engine: &mut GestureEngine, snapshot: &LandmarkSnapshot, from: f64, to: f64) -> FrameReport {
    let mut t = from;
    let mut last = engine.process_frame(snapshot, t);
    while t + FRAME <= to + 1e-9 {
        t += FRAME;
        last = engine.process_frame(snapshot, t);
    }
    last
}

fn calibrate_on(engine: &mut GestureEngine, snapshot: &LandmarkSnapshot) {
    engine.request_calibration();
    let need = engine.config().calibration.required_samples;
    for i in 0..need {
        engine.process_frame(snapshot, i as f64 * FRAME);
    }
    assert!(
        engine.calibration_store().depth_baseline().is_some(),
        "calibration completed after {} frames",
        need
    );
    engine.reset();
}

#[test]
fn test_open_hand_confirms_action_neutral() {
    let mut engine = GestureEngine::default();
    let report = run(&mut engine, &open_hand(), 0.0, 0.3);
    assert_eq!(report.detected().action, Gesture::Neutral);
    assert!(report.classification.baseline(Category::Action));
    assert_eq!(report.confirmed, ActiveGesture::new(Category::Action, Gesture::Neutral));
}

#[test]
fn test_navigation_ok_outranks_everything() {
    let mut engine = GestureEngine::default();
    let first = engine.process_frame(&peace_sign(), 0.0);
    assert_eq!(first.detected().navigation, Gesture::Ok);
    assert_eq!(first.active(), ActiveGesture::new(Category::Navigation, Gesture::Ok));

    let report = run(&mut engine, &peace_sign(), 0.0, 0.4);
    assert_eq!(report.confirmed, ActiveGesture::new(Category::Navigation, Gesture::Ok));
    assert_eq!(engine.confirmed_command(), Some("key-enter"));
}

#[test]
fn test_camera_outranks_movement() {
    let mut engine = GestureEngine::default();
    calibrate_on(&mut engine, &three_axis());
    let report = engine.process_frame(&pan_up_pose(), 0.0);
    assert_eq!(report.detected().camera, Gesture::PanUp);
    assert_eq!(report.active(), ActiveGesture::new(Category::Camera, Gesture::PanUp));
}

#[test]
fn test_debounce_minimum_hold() {
    let eps = 0.01;
    let mut engine = GestureEngine::default();
    engine.process_frame(&thumbs_down(), 1.0);
    let early = engine.process_frame(&thumbs_down(), 1.3 - eps);
    assert!(early.confirmed.is_neutral(), "held {:.2}s", 0.3 - eps);
    let late = engine.process_frame(&thumbs_down(), 1.3 + eps);
    assert_eq!(late.confirmed, ActiveGesture::new(Category::Navigation, Gesture::Esc));
}

#[test]
fn test_reengagement_gate_defers_switch() {
    let config = EngineConfig::from_sexp("(:gesture-duration 0.05 :reengagement-delay 0.2)")
        .expect("valid config");
    let mut engine = GestureEngine::new(config);
    engine.process_frame(&thumbs_down(), 0.0);
    let esc = engine.process_frame(&thumbs_down(), 0.05);
    assert_eq!(esc.confirmed.gesture, Gesture::Esc);

    engine.process_frame(&peace_sign(), 0.06);
    let deferred = engine.process_frame(&peace_sign(), 0.12);
    assert_eq!(deferred.confirmed.gesture, Gesture::Esc, "inside re-engagement delay");
    let switched = engine.process_frame(&peace_sign(), 0.26);
    assert_eq!(switched.confirmed.gesture, Gesture::Ok);
    assert!(switched.changed);
}

#[test]
fn test_calibration_gates_depth_and_pan() {
    let mut engine = GestureEngine::default();
    let poses = [
        open_hand(),
        fist(),
        three_axis(),
        pan_up_pose(),
        fist_at_ratio(1.3),
        fist_at_ratio(0.7),
    ];
    for (i, pose) in poses.iter().enumerate() {
        let report = run(&mut engine, pose, i as f64, i as f64 + 0.4);
        let detected = report.detected();
        assert!(
            !matches!(detected.movement, Gesture::Forward | Gesture::Backward),
            "pose {} gave {} before calibration",
            i,
            detected.movement
        );
        assert!(
            !matches!(
                detected.camera,
                Gesture::PanUp | Gesture::PanDown | Gesture::PanLeft | Gesture::PanRight
            ),
            "pose {} gave {} before calibration",
            i,
            detected.camera
        );
    }
}

#[test]
fn test_depth_ramp_enters_forward_once() {
    let mut engine = GestureEngine::default();
    calibrate_on(&mut engine, &fist());
    let neutral_area = engine.calibration().expect("baseline").neutral_area;
    let forward_enter = engine.config().depth.forward_enter;

    let mut transitions = 0;
    let mut previous = DepthState::Neutral;
    let mut t = 0.0;
    for step in 0..=20 {
        let ratio = 1.0 + step as f32 * 0.01;
        let report = engine.process_frame(&fist_at_ratio(ratio), t);
        t += FRAME;
        if previous == DepthState::Neutral && report.depth == DepthState::Forward {
            transitions += 1;
            let smoothed = engine
                .depth_estimator()
                .smoothed_area()
                .expect("history populated");
            assert!(
                smoothed / neutral_area >= forward_enter,
                "entered at smoothed ratio {}",
                smoothed / neutral_area
            );
        }
        assert_ne!(report.depth, DepthState::Backward);
        previous = report.depth;
    }
    // The smoothed ratio lags the raw ramp but reaches 1.18 by the last step.
    assert_eq!(transitions, 1, "NEUTRAL -> FORWARD exactly once");
    assert_eq!(previous, DepthState::Forward);
}

#[test]
fn test_forward_does_not_oscillate_inside_band() {
    let mut engine = GestureEngine::default();
    calibrate_on(&mut engine, &fist());
    let entered = run(&mut engine, &fist_at_ratio(1.2), 0.0, 0.3);
    assert_eq!(entered.depth, DepthState::Forward);

    let mut t = 0.4;
    for ratio in [1.12, 1.13, 1.11, 1.14, 1.12, 1.13, 1.11, 1.12] {
        let report = engine.process_frame(&fist_at_ratio(ratio), t);
        assert_eq!(report.depth, DepthState::Forward, "ratio {} inside band", ratio);
        assert_eq!(report.detected().movement, Gesture::Forward);
        t += FRAME;
    }

    let left = run(&mut engine, &fist_at_ratio(1.0), t, t + 0.3);
    assert_eq!(left.depth, DepthState::Neutral);
}

#[test]
fn test_disabled_category_never_detected() {
    let config = EngineConfig::from_sexp("(:navigation nil)").expect("valid config");
    let mut engine = GestureEngine::new(config);
    let report = run(&mut engine, &thumbs_down(), 0.0, 0.5);
    assert_eq!(report.detected().navigation, Gesture::Neutral);
    assert_ne!(report.confirmed.category, Category::Navigation);
}

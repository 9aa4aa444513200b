use gesture_core::geometry::fret_for_distance;
use gesture_core::landmark::{INDEX_TIP, MIDDLE_TIP, RING_TIP, THUMB_TIP};
use gesture_core::{
    detect_strumming_motion, plane_distance, DetectedFrame, FrameEvent, FramePipeline, GestureConfig,
    HandObservation, Handedness, Landmark, MotionResult, MotionSink, NullSink, PlaneAngle, StrumDirection,
    LANDMARK_COUNT,
};
use rstest::rstest;

// --- FIXTURES ---

/// Detector output for the player's right hand in a mirrored camera.
fn strumming_hand(x: f32, y: f32) -> HandObservation {
    HandObservation::new(Handedness::Left, 0.95, [Landmark::planar(x, y); LANDMARK_COUNT])
}

/// Detector output for the player's left hand in a mirrored camera.
/// `pinch` names the fingertip touching the thumb.
fn fretting_hand(x: f32, y: f32, pinch: Option<usize>) -> HandObservation {
    let mut kp = [Landmark::planar(x, y); LANDMARK_COUNT];
    kp[THUMB_TIP] = Landmark::planar(x, y - 120.0);
    for tip in [INDEX_TIP, MIDDLE_TIP, RING_TIP] {
        let gap = if Some(tip) == pinch { 8.0 } else { 80.0 };
        kp[tip] = Landmark::planar(x - gap, y - 120.0);
    }
    HandObservation::new(Handedness::Right, 0.95, kp)
}

fn frame(t: u64, hands: Vec<HandObservation>) -> FrameEvent {
    FrameEvent::Detected(DetectedFrame { timestamp_ms: t, hands })
}

#[derive(Default)]
struct Log {
    strums:  Vec<(u64, StrumDirection)>,
    changes: Vec<String>,
}

impl MotionSink for Log {
    fn on_strum(&mut self, r: &MotionResult) {
        self.strums.push((r.timestamp_ms, r.strum_direction.unwrap()));
    }
    fn on_chord_change(&mut self, chord: &str) {
        self.changes.push(chord.to_string());
    }
}

// --- STRUM DETECTION ---

#[rstest]
#[case(300.0, 270.0, Some((StrumDirection::Down, 0.6)))]
#[case(270.0, 300.0, Some((StrumDirection::Up, 0.6)))]
#[case(285.0, 270.0, None)] // exactly at threshold
#[case(285.5, 270.0, Some((StrumDirection::Down, 0.31)))]
#[case(500.0, 270.0, Some((StrumDirection::Down, 1.0)))]
#[case(270.0, 270.0, None)]
fn strum_decision_table(#[case] current: f32, #[case] previous: f32, #[case] expected: Option<(StrumDirection, f32)>) {
    let got = detect_strumming_motion(
        Some(&Landmark::planar(400.0, current)),
        Some(&Landmark::planar(400.0, previous)),
        15.0,
        50.0,
    );
    match (got, expected) {
        (None, None) => {}
        (Some(s), Some((dir, intensity))) => {
            assert_eq!(s.direction, dir);
            assert!((s.intensity - intensity).abs() < 1e-4, "intensity {}", s.intensity);
        }
        other => panic!("mismatch: {:?}", other),
    }
}

#[test]
fn missing_previous_wrist_never_strums() {
    for y in [0.0, 100.0, 10_000.0] {
        assert!(detect_strumming_motion(Some(&Landmark::planar(0.0, y)), None, 15.0, 50.0).is_none());
    }
}

// --- COOLDOWN ---

#[test]
fn suppressed_strum_does_not_restart_cooldown() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let mut log = Log::default();

    pipeline.process(frame(0, vec![strumming_hand(500.0, 200.0)]), &mut log);
    pipeline.process(frame(10, vec![strumming_hand(500.0, 240.0)]), &mut log); // accepted
    pipeline.process(frame(100, vec![strumming_hand(500.0, 200.0)]), &mut log); // suppressed
    pipeline.process(frame(131, vec![strumming_hand(500.0, 240.0)]), &mut log); // 121 ms after the first

    assert_eq!(log.strums, vec![(10, StrumDirection::Down), (131, StrumDirection::Down)]);
}

// --- CHORDS ---

#[test]
fn unknown_never_overwrites_known_chord() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let mut log = Log::default();

    pipeline.process(frame(0, vec![fretting_hand(150.0, 300.0, Some(INDEX_TIP))]), &mut log);
    pipeline.process(frame(33, vec![fretting_hand(150.0, 300.0, None)]), &mut log);
    let r = pipeline.process(frame(66, vec![]), &mut log).unwrap();

    assert_eq!(pipeline.aggregator().current_chord(), "C Major");
    assert_eq!(r.chord_type, "C Major");
    assert_eq!(log.changes, vec!["C Major".to_string()]);
}

#[test]
fn identical_geometry_does_not_signal_a_change() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let mut log = Log::default();
    for t in 0..5 {
        pipeline.process(frame(t * 33, vec![fretting_hand(150.0, 300.0, Some(RING_TIP))]), &mut log);
    }
    assert_eq!(log.changes, vec!["D Major".to_string()]);
}

#[test]
fn chord_change_sequence() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let mut log = Log::default();
    let shapes = [Some(INDEX_TIP), Some(MIDDLE_TIP), None, Some(MIDDLE_TIP), Some(RING_TIP)];
    for (i, pinch) in shapes.into_iter().enumerate() {
        pipeline.process(frame(i as u64 * 33, vec![fretting_hand(150.0, 300.0, pinch)]), &mut log);
    }
    assert_eq!(log.changes, vec!["C Major", "G Major", "D Major"]);
}

// --- FRET POSITION ---

#[test]
fn fret_example_two_hands() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let r = pipeline
        .process(
            frame(0, vec![fretting_hand(100.0, 200.0, None), strumming_hand(500.0, 200.0)]),
            &mut NullSink,
        )
        .unwrap();
    assert_eq!(r.fret_position, 3);
    assert!(r.strumming_visible && r.fretting_visible);
}

#[rstest]
#[case(0.0, 12)]
#[case(560.0, 0)]
#[case(800.0, 0)]
#[case(280.0, 6)]
#[case(400.0, 3)]
fn fret_mapping(#[case] distance: f32, #[case] fret: u8) {
    assert_eq!(fret_for_distance(distance, 560.0, 12), Some(fret));
}

#[test]
fn fret_held_while_strumming_hand_is_away() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    pipeline.process(
        frame(0, vec![fretting_hand(100.0, 200.0, None), strumming_hand(300.0, 200.0)]),
        &mut NullSink,
    );
    let before = pipeline.aggregator().fret_position();
    let r = pipeline.process(frame(33, vec![fretting_hand(100.0, 200.0, None)]), &mut NullSink).unwrap();
    assert_eq!(r.fret_position, before);
}

#[test]
fn plane_angle_changes_fret_reading() {
    // hands offset vertically as well as horizontally; tilting the plane
    // changes the measured spacing
    let hands = || vec![fretting_hand(100.0, 400.0, None), strumming_hand(400.0, 200.0)];
    let mut flat = FramePipeline::new(GestureConfig::default());
    let mut tilted = FramePipeline::new(GestureConfig::default());
    tilted.aggregator_mut().set_plane_angle(45.0);

    let a = flat.process(frame(0, hands()), &mut NullSink).unwrap();
    let b = tilted.process(frame(0, hands()), &mut NullSink).unwrap();
    assert_ne!(a.fret_position, b.fret_position);
}

// --- GEOMETRY ---

#[test]
fn untilted_distance_is_plain_euclidean() {
    let a = Landmark::planar(100.0, 200.0);
    let b = Landmark::planar(500.0, 200.0);
    assert_eq!(plane_distance(&a, &b, PlaneAngle::new(90.0)), 400.0);
}

// --- FAILURES ---

#[test]
fn nan_landmarks_never_abort_the_pipeline() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let mut bad = fretting_hand(100.0, 200.0, Some(INDEX_TIP));
    bad.keypoints[THUMB_TIP] = Landmark::planar(f32::NAN, f32::NAN);
    let r = pipeline
        .process(frame(0, vec![bad, strumming_hand(f32::NAN, f32::NAN)]), &mut NullSink)
        .unwrap();
    assert_eq!(r.chord_type, "Unknown");
    assert_eq!(r.fret_position, 0);
    assert!(!r.strum_detected);
}

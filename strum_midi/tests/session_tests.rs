use gesture_core::landmark::{INDEX_TIP, MIDDLE_TIP, RING_TIP, THUMB_TIP};
use gesture_core::{
    DetectedFrame, FrameEvent, FramePipeline, GestureConfig, HandObservation, Handedness, Landmark,
    MotionResult, LANDMARK_COUNT,
};
use strum_midi::{SessionRecorder, StrumMapper};

fn frame(t: u64, strum_y: f32, pinch: usize) -> FrameEvent {
    let strumming = HandObservation::new(Handedness::Left, 0.9, [Landmark::planar(450.0, strum_y); LANDMARK_COUNT]);
    let mut kp = [Landmark::planar(150.0, 300.0); LANDMARK_COUNT];
    kp[THUMB_TIP] = Landmark::planar(150.0, 200.0);
    for tip in [INDEX_TIP, MIDDLE_TIP, RING_TIP] {
        let gap = if tip == pinch { 6.0 } else { 90.0 };
        kp[tip] = Landmark::planar(150.0 + gap, 200.0);
    }
    let fretting = HandObservation::new(Handedness::Right, 0.9, kp);
    FrameEvent::Detected(DetectedFrame { timestamp_ms: t, hands: vec![strumming, fretting] })
}

#[test]
fn gestures_to_midi_file() {
    let mut pipeline = FramePipeline::new(GestureConfig::default());
    let mapper = StrumMapper::default();
    let mut recorder = SessionRecorder::new().description("integration");

    let mut sink = |r: &MotionResult| recorder.record(r.timestamp_ms, &mapper.notes_for(r));
    pipeline.process(frame(0, 200.0, INDEX_TIP), &mut sink);
    pipeline.process(frame(200, 250.0, INDEX_TIP), &mut sink); // down, C Major
    pipeline.process(frame(400, 200.0, MIDDLE_TIP), &mut sink); // up, G Major
    pipeline.process(frame(450, 250.0, MIDDLE_TIP), &mut sink); // cooling down

    assert_eq!(recorder.strum_count(), 2);
    let track = recorder.to_track();
    // five strings of C plus six of G
    assert_eq!(track.notes.len(), 11);
    assert!(track.notes.iter().all(|n| n.velocity == 120));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.mid");
    track.write_file(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], b"MThd");
    assert_eq!(bytes.len(), track.to_bytes().len());
}

use std::io::Write;

use air_guitar::app::{run, AppConfig, SourceKind};
use gesture_core::landmark::{INDEX_TIP, MIDDLE_TIP, RING_TIP, THUMB_TIP};
use gesture_core::{DetectedFrame, HandObservation, Handedness, Landmark, LANDMARK_COUNT};

fn hands(strum_y: f32, pinch: usize) -> Vec<HandObservation> {
    let strumming = HandObservation::new(Handedness::Left, 0.9, [Landmark::planar(480.0, strum_y); LANDMARK_COUNT]);
    let mut kp = [Landmark::planar(160.0, 300.0); LANDMARK_COUNT];
    kp[THUMB_TIP] = Landmark::planar(160.0, 210.0);
    for tip in [INDEX_TIP, MIDDLE_TIP, RING_TIP] {
        let gap = if tip == pinch { 5.0 } else { 80.0 };
        kp[tip] = Landmark::planar(160.0 + gap, 210.0);
    }
    vec![strumming, HandObservation::new(Handedness::Right, 0.9, kp)]
}

fn line(t: u64, strum_y: f32, pinch: usize) -> String {
    serde_json::to_string(&DetectedFrame { timestamp_ms: t, hands: hands(strum_y, pinch) }).unwrap()
}

fn quiet(path: std::path::PathBuf) -> AppConfig {
    AppConfig {
        source: SourceKind::Replay,
        replay: Some(path),
        live_midi: false,
        realtime: false,
        ..Default::default()
    }
}

#[test]
fn replayed_session_with_detector_glitches() {
    let mut log = tempfile::NamedTempFile::new().unwrap();
    writeln!(log, "{}", line(0, 200.0, INDEX_TIP)).unwrap();
    writeln!(log, "{}", line(33, 240.0, INDEX_TIP)).unwrap(); // strum, C Major
    writeln!(log, r#"{{"error": "inference timeout"}}"#).unwrap();
    writeln!(log).unwrap();
    writeln!(log, "{{ truncated").unwrap();
    writeln!(log, "{}", line(20, 200.0, INDEX_TIP)).unwrap(); // stale timestamp
    writeln!(log, "{}", line(300, 200.0, MIDDLE_TIP)).unwrap(); // strum up, G Major
    writeln!(log, "{}", line(333, 200.0, RING_TIP)).unwrap(); // D Major, no movement
    log.flush().unwrap();

    let summary = run(quiet(log.path().to_path_buf())).unwrap();
    assert_eq!(summary.stats.processed, 4);
    assert_eq!(summary.stats.failed, 2);
    assert_eq!(summary.stats.stale, 1);
    assert_eq!(summary.stats.strums, 2);
    assert_eq!(summary.chord_changes, 3);
    assert_eq!(summary.final_chord, "D Major");
}

#[test]
fn replay_records_midi() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("frames.jsonl");
    let mid_path = dir.path().join("take.mid");
    let mut f = std::fs::File::create(&log_path).unwrap();
    writeln!(f, "{}", line(0, 200.0, MIDDLE_TIP)).unwrap();
    writeln!(f, "{}", line(33, 250.0, MIDDLE_TIP)).unwrap();
    drop(f);

    let cfg = AppConfig { record: Some(mid_path.clone()), ..quiet(log_path) };
    let summary = run(cfg).unwrap();
    assert_eq!(summary.recorded.as_deref(), Some(mid_path.as_path()));

    let bytes = std::fs::read(&mid_path).unwrap();
    assert_eq!(&bytes[0..4], b"MThd");
    // G Major sounds all six strings: six note-ons on channel 0
    let note_ons = bytes.windows(2).filter(|w| w[0] == 0x90).count();
    assert_eq!(note_ons, 6);
}

#[test]
fn missing_replay_file_is_a_config_error() {
    let cfg = quiet("/definitely/not/here.jsonl".into());
    assert!(matches!(run(cfg), Err(gesture_core::GestureError::Config(_))));
}

//! Top-level application loop.
//!
//! `AppState` owns the `Player`, the `StrumMapper` and the optional
//! `SessionRecorder`. It is the pipeline's [`MotionSink`]; [`run`] feeds it
//! one frame event at a time from whichever source was selected.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use clap::ValueEnum;
use gesture_core::{
    FrameEvent, FramePipeline, GestureConfig, GestureError, GestureResult, MotionResult, MotionSink, PipelineStats,
};
use strum_midi::{GeneralMidi, SessionRecorder, StrumMapper};
use tracing::{debug, info};

use crate::player::{NullOut, Player};
#[cfg(feature = "leap")]
use crate::source::LeapFrameSource;
use crate::source::{spawn_frame_source, ReplayFrameSource, SimFrameSource};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Synthetic hands
    Sim,
    /// JSON-lines detector log
    Replay,
    /// LeapMotion controller (needs the `leap` feature)
    Leap,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub gesture:          GestureConfig,
    pub source:           SourceKind,
    /// Required for [`SourceKind::Replay`].
    pub replay:           Option<PathBuf>,
    /// Write the session to this `.mid` file on exit.
    pub record:           Option<PathBuf>,
    pub instrument:       u8,
    pub channel:          u8,
    /// How long each string rings, live and in the recording.
    pub note_ms:          u32,
    /// Stop after this many frame events.
    pub max_frames:       Option<u64>,
    /// How long to wait for the first frame before giving up.
    pub detector_timeout: Duration,
    /// Pace simulated and replayed frames in real time.
    pub realtime:         bool,
    /// Send notes to a MIDI port; when false notes are discarded.
    pub live_midi:        bool,
    pub midi_port:        Option<String>,
    pub mapper:           StrumMapper,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            gesture:          GestureConfig::default(),
            source:           SourceKind::Sim,
            replay:           None,
            record:           None,
            instrument:       GeneralMidi::AcousticGuitarSteel.program(),
            channel:          0,
            note_ms:          400,
            max_frames:       None,
            detector_timeout: Duration::from_secs(5),
            realtime:         true,
            live_midi:        true,
            midi_port:        None,
            mapper:           StrumMapper::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    player:   Player,
    mapper:   StrumMapper,
    recorder: Option<SessionRecorder>,
    pub status: String,
    chord_changes: u64,
}

impl AppState {
    pub fn new(cfg: &AppConfig, player: Player) -> Self {
        let recorder = cfg.record.as_ref().map(|_| {
            SessionRecorder::new()
                .instrument_raw(cfg.instrument)
                .channel(cfg.channel)
                .note_ms(cfg.note_ms)
                .description("air_guitar session")
        });
        AppState {
            player,
            mapper: cfg.mapper.clone(),
            recorder,
            status: "Ready".to_string(),
            chord_changes: 0,
        }
    }

    pub fn recorder(&self) -> Option<&SessionRecorder> {
        self.recorder.as_ref()
    }

    pub fn chord_changes(&self) -> u64 {
        self.chord_changes
    }

    /// Stop the player and hand back the recording, if any.
    pub fn finish(self) -> Option<SessionRecorder> {
        self.player.quit();
        self.recorder
    }
}

impl MotionSink for AppState {
    fn on_motion(&mut self, r: &MotionResult) {
        self.status = format!(
            "{:<8} fret {:>2}  hands {}{}",
            r.chord_type,
            r.fret_position,
            if r.fretting_visible { 'F' } else { '-' },
            if r.strumming_visible { 'S' } else { '-' },
        );
    }

    fn on_strum(&mut self, r: &MotionResult) {
        let notes = self.mapper.notes_for(r);
        debug!(
            t = r.timestamp_ms,
            direction = ?r.strum_direction,
            intensity = r.strum_intensity,
            notes = notes.len(),
            "strum"
        );
        if let Some(rec) = self.recorder.as_mut() {
            rec.record(r.timestamp_ms, &notes);
        }
        self.player.strum(notes);
    }

    fn on_chord_change(&mut self, chord: &str) {
        self.chord_changes += 1;
        info!(chord = %chord, "chord");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// What a finished session did.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub stats:         PipelineStats,
    pub chord_changes: u64,
    pub final_chord:   String,
    pub final_fret:    u8,
    pub recorded:      Option<PathBuf>,
}

/// Run the full application: open the configured frame source and MIDI
/// output, then process frames until the source ends or `max_frames` is
/// reached.
pub fn run(cfg: AppConfig) -> GestureResult<SessionSummary> {
    cfg.gesture.validate()?;

    let rx = match cfg.source {
        SourceKind::Sim => spawn_frame_source(SimFrameSource::new(&cfg.gesture).realtime(cfg.realtime)),
        SourceKind::Replay => {
            let path = cfg
                .replay
                .clone()
                .ok_or_else(|| GestureError::Config("replay source needs a file".to_string()))?;
            if !path.is_file() {
                return Err(GestureError::Config(format!("replay file not found: {}", path.display())));
            }
            spawn_frame_source(ReplayFrameSource::new(path).realtime(cfg.realtime))
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => {
            if cfg.gesture.mirrored {
                tracing::warn!("LeapMotion reports anatomical handedness; consider --mirrored false");
            }
            spawn_frame_source(LeapFrameSource::new(&cfg.gesture))
        }
        #[cfg(not(feature = "leap"))]
        SourceKind::Leap => {
            return Err(GestureError::Config("built without the `leap` feature".to_string()));
        }
    };

    let player = if cfg.live_midi {
        Player::spawn(cfg.instrument, cfg.channel, u64::from(cfg.note_ms), cfg.midi_port.clone())
    } else {
        Player::spawn_with(Box::new(NullOut), cfg.instrument, cfg.channel, u64::from(cfg.note_ms))
    };

    run_with(cfg, rx, player)
}

/// The frame loop over an already-running source and player.
pub fn run_with(cfg: AppConfig, rx: Receiver<FrameEvent>, player: Player) -> GestureResult<SessionSummary> {
    let mut pipeline = FramePipeline::new(cfg.gesture.clone());
    let mut app = AppState::new(&cfg, player);

    // ── first frame: bounded wait ─────────────────────────────────────────
    let first = match rx.recv_timeout(cfg.detector_timeout) {
        Ok(event) => event,
        Err(RecvTimeoutError::Timeout) => {
            app.finish();
            return Err(GestureError::DetectorTimeout(cfg.detector_timeout));
        }
        Err(RecvTimeoutError::Disconnected) => {
            app.finish();
            return Err(GestureError::SourceDisconnected);
        }
    };
    info!("first frame received");

    // ── main loop ─────────────────────────────────────────────────────────
    let mut events = 0u64;
    let mut next = Some(first);
    while let Some(event) = next.take() {
        pipeline.process(event, &mut app);
        events += 1;
        if events % 30 == 0 {
            debug!(status = %app.status, "status");
        }
        if cfg.max_frames.is_some_and(|max| events >= max) {
            debug!(events = events, "frame limit reached");
            break;
        }
        next = rx.recv().ok();
    }

    pipeline.stop();
    drop(rx);

    let stats = pipeline.stats();
    let chord_changes = app.chord_changes();
    info!(
        processed = stats.processed,
        failed = stats.failed,
        stale = stats.stale,
        strums = stats.strums,
        "session finished"
    );

    // ── recording ─────────────────────────────────────────────────────────
    let recording = app.finish();
    let recorded = match (recording, cfg.record) {
        (Some(rec), Some(path)) => {
            rec.to_track().write_file(&path)?;
            info!(path = %path.display(), strums = rec.strum_count(), "session written");
            Some(path)
        }
        _ => None,
    };

    Ok(SessionSummary {
        stats,
        chord_changes,
        final_chord: pipeline.aggregator().current_chord().to_string(),
        final_fret: pipeline.aggregator().fret_position(),
        recorded,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::{DetectedFrame, HandObservation, Handedness, Landmark, LANDMARK_COUNT};
    use std::sync::mpsc;

    fn quiet() -> AppConfig {
        AppConfig { live_midi: false, realtime: false, ..Default::default() }
    }

    fn null_player() -> Player {
        Player::spawn_with(Box::new(NullOut), 25, 0, 10)
    }

    fn strum_frame(t: u64, y: f32) -> FrameEvent {
        let hand = HandObservation::new(Handedness::Left, 0.9, [Landmark::planar(500.0, y); LANDMARK_COUNT]);
        FrameEvent::Detected(DetectedFrame { timestamp_ms: t, hands: vec![hand] })
    }

    #[test]
    fn silent_detector_times_out() {
        let (_tx, rx) = mpsc::channel::<FrameEvent>();
        let cfg = AppConfig { detector_timeout: Duration::from_millis(20), ..quiet() };
        let err = run_with(cfg, rx, null_player()).unwrap_err();
        assert!(matches!(err, GestureError::DetectorTimeout(_)));
    }

    #[test]
    fn closed_source_before_first_frame() {
        let (tx, rx) = mpsc::channel::<FrameEvent>();
        drop(tx);
        let err = run_with(quiet(), rx, null_player()).unwrap_err();
        assert!(matches!(err, GestureError::SourceDisconnected));
    }

    #[test]
    fn processes_until_disconnect() {
        let (tx, rx) = mpsc::channel();
        for (t, y) in [(0, 200.0), (33, 240.0), (66, 200.0), (200, 240.0)] {
            tx.send(strum_frame(t, y)).unwrap();
        }
        tx.send(FrameEvent::Failed("blink".into())).unwrap();
        drop(tx);

        let summary = run_with(quiet(), rx, null_player()).unwrap();
        assert_eq!(summary.stats.processed, 4);
        assert_eq!(summary.stats.failed, 1);
        assert_eq!(summary.stats.strums, 2);
        assert_eq!(summary.recorded, None);
    }

    #[test]
    fn frame_limit_stops_early() {
        let (tx, rx) = mpsc::channel();
        for t in 0..10 {
            tx.send(strum_frame(t * 33, 200.0)).unwrap();
        }
        let cfg = AppConfig { max_frames: Some(3), ..quiet() };
        let summary = run_with(cfg, rx, null_player()).unwrap();
        assert_eq!(summary.stats.processed, 3);
    }

    #[test]
    fn records_session_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.mid");
        let (tx, rx) = mpsc::channel();
        tx.send(strum_frame(0, 200.0)).unwrap();
        tx.send(strum_frame(33, 260.0)).unwrap();
        drop(tx);

        let cfg = AppConfig { record: Some(path.clone()), ..quiet() };
        let summary = run_with(cfg, rx, null_player()).unwrap();
        assert_eq!(summary.recorded.as_deref(), Some(path.as_path()));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"MThd");
    }

    #[test]
    fn long_ring_time_reaches_recording() {
        let cfg = AppConfig { record: Some("unused.mid".into()), note_ms: u32::MAX, ..quiet() };
        let mut app = AppState::new(&cfg, null_player());
        let mut pipeline = FramePipeline::new(cfg.gesture.clone());
        pipeline.process(strum_frame(0, 200.0), &mut app);
        pipeline.process(strum_frame(33, 260.0), &mut app);

        let track = app.finish().unwrap().to_track();
        assert!(!track.notes.is_empty());
        let expected = strum_midi::ms_to_ticks(u64::from(u32::MAX), 120, 480);
        assert!(track.notes.iter().all(|n| n.duration == expected));
    }

    #[test]
    fn replay_source_requires_path() {
        let cfg = AppConfig { source: SourceKind::Replay, ..quiet() };
        assert!(matches!(run(cfg), Err(GestureError::Config(_))));
    }

    #[test]
    fn sim_source_end_to_end() {
        let cfg = AppConfig { max_frames: Some(300), ..quiet() };
        let summary = run(cfg).unwrap();
        assert_eq!(summary.stats.processed, 300);
        assert!(summary.stats.strums > 0);
        assert!(summary.chord_changes >= 2);
        assert_ne!(summary.final_chord, "Unknown");
    }
}

//! Frame sources: simulated hands, replayed detector logs, and (with the
//! `leap` feature) a LeapMotion controller.
//!
//! The public interface is [`FrameEvent`] delivered over a bounded `mpsc`
//! channel. A source blocks (or, for live hardware, drops frames) until the
//! pipeline has taken the previous frame. The pipeline does not know which
//! source produced a frame.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::Duration;

use gesture_core::landmark::{INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP};
use gesture_core::{DetectedFrame, FrameEvent, GestureConfig, HandObservation, Handedness, Landmark, LANDMARK_COUNT};
use serde::Deserialize;
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`FrameEvent`]s over a channel. Returning from
/// `run` drops the sender, which the consumer sees as a disconnect.
pub trait FrameSource: Send + 'static {
    fn run(self: Box<Self>, tx: SyncSender<FrameEvent>);
}

/// Frames a source may have queued ahead of the pipeline.
pub const FRAME_QUEUE_DEPTH: usize = 1;

/// Spawn a frame source on its own thread and return the receiving end.
pub fn spawn_frame_source<S: FrameSource>(source: S) -> Receiver<FrameEvent> {
    let (tx, rx) = mpsc::sync_channel(FRAME_QUEUE_DEPTH);
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource — synthetic hands (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Synthetic player for demos and tests.
///
/// * Strumming wrist swings up and down with a 600 ms period.
/// * Fretting hand pinches index, middle, ring in turn, two seconds each.
/// * Fretting wrist drifts toward and away from the strumming hand over
///   eight seconds, sweeping the fret position.
///
/// Labels are emitted the way a detector would report them for the
/// configured camera mirroring.
pub struct SimFrameSource {
    frame_ms: u64,
    frames:   Option<u64>,
    realtime: bool,
    width:    f32,
    height:   f32,
    mirrored: bool,
}

const STRUM_PERIOD_MS: f32 = 600.0;
const CHORD_HOLD_MS:   u64 = 2_000;
const DRIFT_PERIOD_MS: f32 = 8_000.0;

impl SimFrameSource {
    /// 30 fps, endless, paced in real time.
    pub fn new(config: &GestureConfig) -> Self {
        SimFrameSource {
            frame_ms: 33,
            frames:   None,
            realtime: true,
            width:    config.frame_width,
            height:   config.frame_height,
            mirrored: config.mirrored,
        }
    }

    /// Stop after `n` frames.
    pub fn frames(mut self, n: u64) -> Self {
        self.frames = Some(n);
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.frame_ms = (1_000 / fps.max(1) as u64).max(1);
        self
    }

    /// When false, frames are produced as fast as the consumer takes them.
    pub fn realtime(mut self, on: bool) -> Self {
        self.realtime = on;
        self
    }

    /// The synthetic frame at index `i`.
    pub fn frame_at(&self, i: u64) -> DetectedFrame {
        let t = i * self.frame_ms;
        let tau = std::f32::consts::TAU;

        let strum_x = self.width * 0.7;
        let strum_y = self.height * (0.5 + 0.2 * (tau * t as f32 / STRUM_PERIOD_MS).sin());

        let fret_x = self.width * (0.25 + 0.15 * (tau * t as f32 / DRIFT_PERIOD_MS).sin());
        let fret_y = self.height * 0.55;
        let pinch = [INDEX_TIP, MIDDLE_TIP, RING_TIP][((t / CHORD_HOLD_MS) % 3) as usize];

        // anatomical right strums; a mirrored camera reports it as "Left"
        let strum_label = if self.mirrored { Handedness::Left } else { Handedness::Right };

        DetectedFrame {
            timestamp_ms: t,
            hands: vec![
                HandObservation::new(strum_label, 0.95, fist(strum_x, strum_y)),
                HandObservation::new(strum_label.opposite(), 0.95, chord_hand(fret_x, fret_y, pinch)),
            ],
        }
    }
}

impl FrameSource for SimFrameSource {
    fn run(self: Box<Self>, tx: SyncSender<FrameEvent>) {
        info!(frame_ms = self.frame_ms, frames = ?self.frames, "simulated hands started");
        let mut i = 0u64;
        while self.frames.map_or(true, |n| i < n) {
            if tx.send(FrameEvent::Detected(self.frame_at(i))).is_err() {
                return;
            }
            i += 1;
            if self.realtime {
                thread::sleep(Duration::from_millis(self.frame_ms));
            }
        }
        debug!(frames = i, "simulated hands finished");
    }
}

/// Closed hand: every keypoint at the wrist.
fn fist(x: f32, y: f32) -> [Landmark; LANDMARK_COUNT] {
    [Landmark::planar(x, y); LANDMARK_COUNT]
}

/// Fretting hand with `pinch` touching the thumb and the other fingertips
/// spread well clear of it.
fn chord_hand(x: f32, y: f32, pinch: usize) -> [Landmark; LANDMARK_COUNT] {
    let mut kp = fist(x, y);
    let (tx, ty) = (x, y - 90.0);
    kp[THUMB_TIP] = Landmark::planar(tx, ty);
    for (k, tip) in [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP].into_iter().enumerate() {
        let gap = if tip == pinch { 8.0 } else { 70.0 + 15.0 * k as f32 };
        kp[tip] = Landmark::planar(tx + gap, ty);
    }
    kp
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayFrameSource — JSON lines
// ════════════════════════════════════════════════════════════════════════════

/// Replays a detector log, one JSON object per line: either a
/// [`DetectedFrame`] or `{"error": "..."}` for a frame the detector failed
/// on. Blank lines are skipped; unparseable lines become failed frames.
pub struct ReplayFrameSource {
    path:     PathBuf,
    realtime: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Error { error: String },
    Frame(DetectedFrame),
}

/// Parse one line of a replay log.
pub fn parse_replay_line(line: &str) -> FrameEvent {
    match serde_json::from_str::<ReplayLine>(line) {
        Ok(ReplayLine::Frame(frame)) => FrameEvent::Detected(frame),
        Ok(ReplayLine::Error { error }) => FrameEvent::Failed(error),
        Err(e) => FrameEvent::Failed(format!("malformed frame: {}", e)),
    }
}

impl ReplayFrameSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        ReplayFrameSource { path: path.into(), realtime: false }
    }

    /// Sleep between frames according to their timestamps.
    pub fn realtime(mut self, on: bool) -> Self {
        self.realtime = on;
        self
    }
}

impl FrameSource for ReplayFrameSource {
    fn run(self: Box<Self>, tx: SyncSender<FrameEvent>) {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot open replay");
                return;
            }
        };
        info!(path = %self.path.display(), "replaying frames");

        let mut last_ts: Option<u64> = None;
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(line = n + 1, error = %e, "replay read failed");
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let event = parse_replay_line(&line);
            if let FrameEvent::Detected(frame) = &event {
                if self.realtime {
                    if let Some(prev) = last_ts {
                        thread::sleep(Duration::from_millis(frame.timestamp_ms.saturating_sub(prev)));
                    }
                }
                last_ts = Some(frame.timestamp_ms);
            }
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapFrameSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Frame source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Leap joints are in millimetres above the device. They are projected onto
/// a virtual camera image the size of the configured frame: x is centred,
/// height above the device maps to rows counted from the bottom. Leap
/// reports anatomical handedness, so run with `--mirrored false`.
#[cfg(feature = "leap")]
pub struct LeapFrameSource {
    width:     f32,
    height:    f32,
    px_per_mm: f32,
}

#[cfg(feature = "leap")]
impl LeapFrameSource {
    pub fn new(config: &GestureConfig) -> Self {
        LeapFrameSource {
            width:     config.frame_width,
            height:    config.frame_height,
            // ~500 mm of tracking height fills the frame
            px_per_mm: config.frame_height / 500.0,
        }
    }

    fn project(&self, x: f32, y: f32, z: f32) -> Landmark {
        Landmark::new(self.width / 2.0 + x * self.px_per_mm, self.height - y * self.px_per_mm, z * self.px_per_mm)
    }

    /// 21-point layout: wrist, then four joints per digit from thumb to
    /// pinky (base of proximal, base of intermediate, base of distal, tip).
    fn observation(&self, hand: &leaprs::Hand) -> HandObservation {
        let mut image = [Landmark::default(); LANDMARK_COUNT];
        let mut world = [Landmark::default(); LANDMARK_COUNT];

        let palm = hand.palm().position();
        let mut wrist = (palm.x, palm.y, palm.z);

        for (d, digit) in hand.digits().enumerate().take(5) {
            if d == 2 {
                let base = digit.metacarpal().prev_joint();
                wrist = (base.x, base.y, base.z);
            }
            let joints = [
                digit.proximal().prev_joint(),
                digit.intermediate().prev_joint(),
                digit.distal().prev_joint(),
                digit.distal().next_joint(),
            ];
            for (j, p) in joints.iter().enumerate() {
                let i = 1 + d * 4 + j;
                image[i] = self.project(p.x, p.y, p.z);
                world[i] = Landmark::new(p.x, p.y, p.z);
            }
        }
        image[0] = self.project(wrist.0, wrist.1, wrist.2);
        world[0] = Landmark::new(wrist.0, wrist.1, wrist.2);

        let handedness = match hand.hand_type() {
            leaprs::HandType::Left => Handedness::Left,
            _ => Handedness::Right,
        };
        HandObservation { handedness, score: 1.0, keypoints: image, keypoints_3d: world }
    }
}

#[cfg(feature = "leap")]
impl FrameSource for LeapFrameSource {
    fn run(self: Box<Self>, tx: SyncSender<FrameEvent>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = ?e, "failed to create LeapC connection");
                return;
            }
        };
        if let Err(e) = connection.open() {
            warn!(error = ?e, "failed to open LeapMotion device");
            return;
        }
        info!("LeapMotion connected");

        let start = std::time::Instant::now();
        loop {
            let msg = match connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<HandObservation> = frame.hands().map(|h| self.observation(&h)).collect();
                let frame = DetectedFrame { timestamp_ms: start.elapsed().as_millis() as u64, hands };
                match tx.try_send(FrameEvent::Detected(frame)) {
                    Ok(()) => {}
                    Err(mpsc::TrySendError::Full(_)) => debug!("pipeline busy, dropping LeapMotion frame"),
                    Err(mpsc::TrySendError::Disconnected(_)) => return,
                }
            }
        }
    }
}

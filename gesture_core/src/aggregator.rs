//! Motion Aggregator — the only holder of cross-frame state.
//!
//! Turns per-frame extractor signals into one debounced [`MotionResult`]:
//!
//! * **Fret** — smoothed inter-wrist distance mapped onto `0..=max_fret`;
//!   carried forward whenever either hand is missing.
//! * **Strum** — forwarded only when the cooldown since the last accepted
//!   strum has elapsed. Suppressed strums leave the timer alone.
//! * **Chord** — the last known chord; `Unknown` never replaces it.
//!
//! One aggregator serves one session. [`MotionAggregator::reset`] returns it
//! to the freshly-constructed state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chord::ChordClassification;
use crate::config::GestureConfig;
use crate::extractor::{GestureExtractor, HandOrientation, StrumDirection, StrumEvent};
use crate::geometry::{fret_for_distance, try_plane_distance, MovingAverage, PlaneAngle};
use crate::hands::FrameHandsSnapshot;
use crate::landmark::{HandObservation, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// MotionResult
// ════════════════════════════════════════════════════════════════════════════

/// The per-frame output record. Every field is always populated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionResult {
    pub timestamp_ms:     u64,
    pub strum_detected:   bool,
    pub strum_direction:  Option<StrumDirection>,
    /// 0.0 when no strum fired this frame.
    pub strum_intensity:  f32,
    pub fret_position:    u8,
    pub chord_type:       String,
    pub chord_confidence: f32,
    /// True only on the frame the cached chord changed.
    pub chord_changed:    bool,
    pub strumming_visible: bool,
    pub fretting_visible:  bool,
    /// Fretting palm orientation, when that hand is visible.
    pub palm:             Option<HandOrientation>,
}

impl MotionResult {
    pub fn strum(&self) -> Option<StrumEvent> {
        match (self.strum_detected, self.strum_direction) {
            (true, Some(direction)) => Some(StrumEvent { direction, intensity: self.strum_intensity }),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionAggregator
// ════════════════════════════════════════════════════════════════════════════

pub struct MotionAggregator {
    config:        GestureConfig,
    extractor:     GestureExtractor,
    previous:      Option<FrameHandsSnapshot>,
    strum_wrist:   MovingAverage,
    fret_wrist:    MovingAverage,
    last_fret:     u8,
    current_chord: ChordClassification,
    last_strum_ms: Option<u64>,
}

impl MotionAggregator {
    pub fn new(config: GestureConfig) -> Self {
        let extractor = GestureExtractor::new(&config);
        let window = config.smoothing_window;
        MotionAggregator {
            config,
            extractor,
            previous:      None,
            strum_wrist:   MovingAverage::new(window),
            fret_wrist:    MovingAverage::new(window),
            last_fret:     0,
            current_chord: ChordClassification::unknown(),
            last_strum_ms: None,
        }
    }

    /// Drop all history. The plane angle keeps its current value.
    pub fn reset(&mut self) {
        let plane = self.extractor.plane();
        *self = MotionAggregator::new(self.config.clone());
        self.extractor.set_plane(plane);
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &GestureConfig { &self.config }
    pub fn current_chord(&self) -> &str { &self.current_chord.name }
    pub fn fret_position(&self) -> u8 { self.last_fret }
    pub fn plane_angle(&self) -> PlaneAngle { self.extractor.plane() }
    pub fn last_strum_ms(&self) -> Option<u64> { self.last_strum_ms }

    /// Change the guitar-plane angle (clamped). Takes effect on the next frame.
    pub fn set_plane_angle(&mut self, degrees: f32) {
        let plane = PlaneAngle::new(degrees);
        self.config.plane_angle_deg = plane.degrees();
        self.extractor.set_plane(plane);
    }

    // ── per-frame ────────────────────────────────────────────────────────

    /// Process one frame and emit its result.
    pub fn process(&mut self, snapshot: FrameHandsSnapshot) -> MotionResult {
        let now = snapshot.timestamp_ms;
        let signals = self.extractor.extract(&snapshot, self.previous.as_ref());

        let strum = signals.strum.filter(|s| self.admit_strum(now, s));
        let fret_position = self.update_fret(&snapshot);
        let chord_changed = signals.chord.map_or(false, |c| self.update_chord(c));

        let result = MotionResult {
            timestamp_ms:      now,
            strum_detected:    strum.is_some(),
            strum_direction:   strum.map(|s| s.direction),
            strum_intensity:   strum.map_or(0.0, |s| s.intensity),
            fret_position,
            chord_type:        self.current_chord.name.clone(),
            chord_confidence:  self.current_chord.confidence,
            chord_changed,
            strumming_visible: snapshot.strumming.is_some(),
            fretting_visible:  snapshot.fretting.is_some(),
            palm:              signals.palm,
        };

        self.previous = Some(snapshot);
        result
    }

    /// Cooldown gate. Armed when nothing has been accepted yet or the
    /// cooldown has fully elapsed; only an admitted strum restarts it.
    fn admit_strum(&mut self, now: u64, strum: &StrumEvent) -> bool {
        let armed = match self.last_strum_ms {
            None => true,
            Some(last) => now.saturating_sub(last) > self.config.strum_cooldown_ms,
        };
        if armed {
            self.last_strum_ms = Some(now);
        } else {
            debug!(now = now, direction = ?strum.direction, "strum suppressed by cooldown");
        }
        armed
    }

    fn update_fret(&mut self, snapshot: &FrameHandsSnapshot) -> u8 {
        let strum = smooth(&mut self.strum_wrist, snapshot.strumming.as_ref());
        let fret  = smooth(&mut self.fret_wrist, snapshot.fretting.as_ref());

        let (Some(strum), Some(fret)) = (strum, fret) else {
            return self.last_fret;
        };
        let computed = try_plane_distance(&strum, &fret, self.extractor.plane())
            .and_then(|d| fret_for_distance(d, self.config.open_distance(), self.config.max_fret));

        match computed {
            Some(position) => self.last_fret = position,
            None => debug!("unreliable hand spacing, keeping fret {}", self.last_fret),
        }
        self.last_fret
    }

    /// Returns true if the cached chord changed.
    fn update_chord(&mut self, incoming: ChordClassification) -> bool {
        if incoming.is_unknown() {
            return false;
        }
        let changed = incoming.name != self.current_chord.name;
        if changed {
            debug!(from = %self.current_chord.name, to = %incoming.name, "chord change");
        }
        self.current_chord = incoming;
        changed
    }
}

/// Feed a visible hand's wrist into its window, or clear the window when the
/// hand is gone so a returning hand starts fresh.
fn smooth(window: &mut MovingAverage, hand: Option<&HandObservation>) -> Option<Landmark> {
    match hand {
        Some(h) => window.push(*h.wrist()),
        None => {
            window.clear();
            None
        }
    }
}

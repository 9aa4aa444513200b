//! Strum → notes.
//!
//! A down strum sounds the strings low to high, an up strum high to low.
//! Each string after the first is delayed by `spread_ms` so the chord rolls
//! the way a pick crossing the strings does.

use gesture_core::{MotionResult, StrumDirection};
use tracing::trace;

use crate::voicing::{StandardTuning, Voicing};

/// One string of a strum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrumNote {
    /// MIDI note number (0–127).
    pub pitch:    u8,
    /// MIDI velocity (1–127).
    pub velocity: u8,
    /// Offset from the strum onset.
    pub delay_ms: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrumMapper {
    pub tuning:         StandardTuning,
    /// Velocity of the softest strum.
    pub base_velocity:  u8,
    /// Added on top of `base_velocity` at intensity 1.0.
    pub velocity_range: u8,
    pub spread_ms:      u32,
}

impl Default for StrumMapper {
    /// Standard tuning, velocity 60–120, 12 ms between strings.
    fn default() -> Self {
        StrumMapper {
            tuning:         StandardTuning::EADGBE,
            base_velocity:  60,
            velocity_range: 60,
            spread_ms:      12,
        }
    }
}

impl StrumMapper {
    // ── setters (builder pattern) ─────────────────────────────────────────

    pub fn tuning(mut self, tuning: StandardTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn velocity(mut self, base: u8, range: u8) -> Self {
        self.base_velocity = base.min(127);
        self.velocity_range = range.min(127);
        self
    }

    pub fn spread_ms(mut self, ms: u32) -> Self {
        self.spread_ms = ms;
        self
    }

    // ── mapping ───────────────────────────────────────────────────────────

    /// Velocity for an intensity in [0, 1]. Out-of-range or NaN intensities
    /// are clamped; the result is never 0 (which would be a note-off).
    pub fn velocity_for(&self, intensity: f32) -> u8 {
        let i = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
        let v = self.base_velocity as f32 + i * self.velocity_range as f32;
        v.round().clamp(1.0, 127.0) as u8
    }

    /// Notes to play for one frame's result; empty unless a strum was
    /// accepted on that frame.
    pub fn notes_for(&self, result: &MotionResult) -> Vec<StrumNote> {
        let Some(strum) = result.strum() else {
            return Vec::new();
        };
        let voicing = Voicing::for_chord(&result.chord_type);
        let mut pitches: Vec<u8> = voicing
            .pitches(&self.tuning, result.fret_position)
            .into_iter()
            .flatten()
            .collect();
        if strum.direction == StrumDirection::Up {
            pitches.reverse();
        }

        let velocity = self.velocity_for(strum.intensity);
        trace!(
            chord = %result.chord_type,
            fret = result.fret_position,
            direction = ?strum.direction,
            velocity = velocity,
            "strum mapped"
        );
        pitches
            .into_iter()
            .enumerate()
            .map(|(i, pitch)| StrumNote { pitch, velocity, delay_ms: i as u32 * self.spread_ms })
            .collect()
    }
}

//! Session recording: strums captured as they are played, written out as a
//! [`MidiTrack`] when the session ends.

use tracing::debug;

use crate::mapper::StrumNote;
use crate::track::{ms_to_ticks, MidiTrack, TimedNote};
use crate::GeneralMidi;

/// Accumulates strums against wall-clock frame timestamps.
///
/// The first recorded strum defines time zero, so a take never starts with
/// a long silence.
#[derive(Clone, Debug)]
pub struct SessionRecorder {
    strums:      Vec<(u64, Vec<StrumNote>)>,
    tempo_bpm:   u32,
    tpq:         u16,
    instrument:  u8,
    channel:     u8,
    note_ms:     u32,
    description: String,
}

impl Default for SessionRecorder {
    fn default() -> Self { SessionRecorder::new() }
}

impl SessionRecorder {
    /// Defaults: 120 BPM, 480 ticks/quarter, steel-string acoustic, channel
    /// 0, each string rings for 400 ms.
    pub fn new() -> Self {
        SessionRecorder {
            strums:      Vec::new(),
            tempo_bpm:   120,
            tpq:         480,
            instrument:  GeneralMidi::AcousticGuitarSteel.program(),
            channel:     0,
            note_ms:     400,
            description: "air_guitar".to_string(),
        }
    }

    // ── setters (builder pattern) ─────────────────────────────────────────

    /// Tempo written to the file; ticks are derived from it. Clamped to 1–300.
    pub fn tempo(mut self, bpm: u32) -> Self {
        self.tempo_bpm = bpm.clamp(1, 300);
        self
    }

    pub fn instrument(mut self, gm: GeneralMidi) -> Self {
        self.instrument = gm.program();
        self
    }

    /// Any MIDI program number (0–127).
    pub fn instrument_raw(mut self, program: u8) -> Self {
        self.instrument = program.min(127);
        self
    }

    pub fn channel(mut self, ch: u8) -> Self {
        self.channel = ch & 0x0F;
        self
    }

    /// How long each string rings.
    pub fn note_ms(mut self, ms: u32) -> Self {
        self.note_ms = ms.max(1);
        self
    }

    pub fn ticks_per_quarter(mut self, tpq: u16) -> Self {
        self.tpq = tpq.max(1);
        self
    }

    pub fn description(mut self, s: &str) -> Self {
        self.description = s.to_string();
        self
    }

    // ── recording ─────────────────────────────────────────────────────────

    /// Record one strum at frame time `timestamp_ms`. Empty note lists are
    /// ignored.
    pub fn record(&mut self, timestamp_ms: u64, notes: &[StrumNote]) {
        if notes.is_empty() {
            return;
        }
        self.strums.push((timestamp_ms, notes.to_vec()));
    }

    pub fn strum_count(&self) -> usize { self.strums.len() }
    pub fn is_empty(&self) -> bool { self.strums.is_empty() }

    pub fn clear(&mut self) {
        self.strums.clear();
    }

    /// Resolve the recorded strums into a track.
    pub fn to_track(&self) -> MidiTrack {
        let origin = self.strums.iter().map(|(t, _)| *t).min().unwrap_or(0);
        let duration = ms_to_ticks(self.note_ms as u64, self.tempo_bpm, self.tpq).max(1);

        let notes: Vec<TimedNote> = self
            .strums
            .iter()
            .flat_map(|(t, notes)| {
                notes.iter().map(move |n| TimedNote {
                    start: ms_to_ticks(t - origin + n.delay_ms as u64, self.tempo_bpm, self.tpq),
                    duration,
                    pitch: n.pitch,
                    velocity: n.velocity,
                })
            })
            .collect();

        debug!(strums = self.strums.len(), notes = notes.len(), "session resolved to track");
        MidiTrack {
            notes,
            ticks_per_quarter: self.tpq,
            tempo_bpm:         self.tempo_bpm,
            instrument:        self.instrument,
            channel:           self.channel,
            description:       self.description.clone(),
        }
    }
}

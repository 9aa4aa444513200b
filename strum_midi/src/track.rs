//! Standard MIDI file serialisation (Type 0, one track).

use std::io::Write;
use std::path::Path;

/// Convert a wall-clock offset to ticks at the given tempo and resolution.
///
/// ticks = ms × tpq × bpm / 60 000, rounded to the nearest tick.
pub fn ms_to_ticks(ms: u64, tempo_bpm: u32, ticks_per_quarter: u16) -> u32 {
    let scaled = ms as u128 * ticks_per_quarter as u128 * tempo_bpm.max(1) as u128;
    ((scaled + 30_000) / 60_000).min(u32::MAX as u128) as u32
}

// ════════════════════════════════════════════════════════════════════════════
// TimedNote
// ════════════════════════════════════════════════════════════════════════════

/// A note placed at an absolute tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedNote {
    pub start:    u32,
    /// Length in ticks.
    pub duration: u32,
    pub pitch:    u8,
    pub velocity: u8,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiTrack
// ════════════════════════════════════════════════════════════════════════════

/// Notes plus the track-level settings needed to write a file.
///
/// Produced by [`crate::SessionRecorder::to_track`]. Notes may overlap and
/// need not be sorted.
#[derive(Clone, Debug)]
pub struct MidiTrack {
    pub notes:             Vec<TimedNote>,
    pub ticks_per_quarter: u16,
    pub tempo_bpm:         u32,
    pub instrument:        u8,
    pub channel:           u8,
    /// Embedded as the track name.
    pub description:       String,
}

impl MidiTrack {
    /// Serialise to a standard MIDI Type-0 file and write to `path`.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let bytes = self.to_bytes();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&bytes)
    }

    /// Serialise to a `Vec<u8>` containing a valid MIDI Type-0 file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();
        let mut out = Vec::with_capacity(track.len() + 22);

        // ── Header chunk ──────────────────────────────────────────────────
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        // ── Track chunk ───────────────────────────────────────────────────
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    /// Last tick at which anything sounds.
    pub fn end_tick(&self) -> u32 {
        self.notes.iter().map(|n| n.start.saturating_add(n.duration)).max().unwrap_or(0)
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();
        let ch = self.channel & 0x0F;

        // ── Tempo meta-event ──────────────────────────────────────────────
        let micros = 60_000_000u32 / self.tempo_bpm.max(1);
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.push(((micros >> 16) & 0xFF) as u8);
        t.push(((micros >>  8) & 0xFF) as u8);
        t.push(( micros        & 0xFF) as u8);

        // ── Track name meta-event ─────────────────────────────────────────
        let name = self.description.as_bytes();
        t.extend_from_slice(&[0x00, 0xFF, 0x03]);
        write_vlq(&mut t, name.len() as u32);
        t.extend_from_slice(name);

        // ── Program Change ────────────────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xC0 | ch, self.instrument & 0x7F]);

        // ── Note events, absolute → delta ─────────────────────────────────
        // (tick, is_on, pitch, velocity); offs sort before ons at the same
        // tick so a repeated pitch is released before it is struck again.
        let mut events: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(self.notes.len() * 2);
        for n in &self.notes {
            events.push((n.start, true, n.pitch & 0x7F, n.velocity.clamp(1, 127)));
            events.push((n.start.saturating_add(n.duration), false, n.pitch & 0x7F, 0));
        }
        events.sort_by_key(|&(tick, is_on, pitch, _)| (tick, is_on, pitch));

        let mut now = 0u32;
        for (tick, is_on, pitch, velocity) in events {
            write_vlq(&mut t, tick - now);
            now = tick;
            if is_on {
                t.extend_from_slice(&[0x90 | ch, pitch, velocity]);
            } else {
                t.extend_from_slice(&[0x80 | ch, pitch, 0x00]);
            }
        }

        // ── End of Track meta-event ───────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }
}

/// Write a MIDI variable-length quantity (VLQ). Values above 0x0FFF_FFFF
/// are clamped to the largest representable quantity.
fn write_vlq(buf: &mut Vec<u8>, value: u32) {
    let mut value = value.min(0x0FFF_FFFF);
    let mut bytes = [0u8; 4];
    let mut i = 3;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

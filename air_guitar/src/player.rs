//! Real-time MIDI playback thread.
//!
//! Strums arrive as note lists with per-string delays. The thread schedules
//! each note-on at its delay and the matching note-off `note_ms` later, so
//! the caller never blocks on timing.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use strum_midi::StrumNote;
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerCommand {
    /// Sound one strum, starting now.
    Strum(Vec<StrumNote>),
    /// Change instrument (MIDI program 0–127).
    SetInstrument(u8),
    /// Release everything and terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        self.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
}

impl MidirOut {
    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.conn.send(msg) {
            debug!(error = %e, "MIDI send failed");
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;

impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8) {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8) {}
    fn note_off(&mut self, _ch: u8, _n: u8) {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output — enumerate ports and pick one
// ════════════════════════════════════════════════════════════════════════════

/// Open a MIDI output port. A port whose name contains `hint` wins;
/// otherwise a softsynth is preferred, then the first port. Falls back to
/// [`NullOut`] with a warning if nothing can be opened.
pub fn open_midi_output(hint: Option<&str>) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("air_guitar") {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "MIDI init failed, using null output");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found, using null output (try `timidity -iA` or `fluidsynth`)");
        return Box::new(NullOut);
    }

    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    let wanted = |n: &str| match hint {
        Some(h) => n.to_lowercase().contains(&h.to_lowercase()),
        None => ["fluid", "timidity", "microsoft", "gm", "synth"]
            .iter()
            .any(|s| n.to_lowercase().contains(s)),
    };
    let port_idx = names.iter().position(|n| wanted(n.as_str())).unwrap_or(0);
    info!(port = %names[port_idx], "opening MIDI port");

    match midi_out.connect(&ports[port_idx], "air-guitar-out") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!(error = %e, "failed to connect MIDI port, using null output");
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player — the playback thread
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the MIDI playback thread.
pub struct Player {
    cmd_tx: Sender<PlayerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Spawn the playback thread on the best available MIDI port.
    pub fn spawn(instrument: u8, channel: u8, note_ms: u64, port_hint: Option<String>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let out = open_midi_output(port_hint.as_deref());
            player_thread(out, instrument, channel, note_ms, cmd_rx);
        });
        Player { cmd_tx, handle: Some(handle) }
    }

    /// Spawn the playback thread on a caller-supplied output.
    pub fn spawn_with(out: Box<dyn MidiOut>, instrument: u8, channel: u8, note_ms: u64) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let handle = thread::spawn(move || player_thread(out, instrument, channel, note_ms, cmd_rx));
        Player { cmd_tx, handle: Some(handle) }
    }

    pub fn strum(&self, notes: Vec<StrumNote>) {
        if notes.is_empty() {
            return;
        }
        let _ = self.cmd_tx.send(PlayerCommand::Strum(notes));
    }

    pub fn set_instrument(&self, program: u8) {
        let _ = self.cmd_tx.send(PlayerCommand::SetInstrument(program));
    }

    /// Stop the thread, releasing any sounding notes, and wait for it.
    pub fn quit(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("player thread panicked");
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    at:       Instant,
    on:       bool,
    pitch:    u8,
    velocity: u8,
}

fn player_thread(
    mut midi:       Box<dyn MidiOut>,
    mut instrument: u8,
    channel:        u8,
    note_ms:        u64,
    cmd_rx:         Receiver<PlayerCommand>,
) {
    let mut pending: Vec<Scheduled> = Vec::new();
    let mut sounding: Vec<u8> = Vec::new();
    let ring = Duration::from_millis(note_ms.max(1));

    midi.program_change(channel, instrument);

    loop {
        // ── fire everything that is due ───────────────────────────────────
        let now = Instant::now();
        pending.sort_by_key(|s| (s.at, s.on));
        let due = pending.iter().take_while(|s| s.at <= now).count();
        for s in pending.drain(..due) {
            if s.on {
                midi.note_on(channel, s.pitch, s.velocity);
                sounding.push(s.pitch);
            } else {
                midi.note_off(channel, s.pitch);
                if let Some(i) = sounding.iter().position(|&p| p == s.pitch) {
                    sounding.swap_remove(i);
                }
            }
        }

        // ── wait for the next deadline or command ─────────────────────────
        let cmd = match pending.first() {
            Some(next) => match cmd_rx.recv_timeout(next.at.saturating_duration_since(Instant::now())) {
                Ok(cmd) => cmd,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => PlayerCommand::Quit,
            },
            None => cmd_rx.recv().unwrap_or(PlayerCommand::Quit),
        };

        match cmd {
            PlayerCommand::Strum(notes) => {
                let onset = Instant::now();
                for n in notes {
                    let at = onset + Duration::from_millis(n.delay_ms as u64);
                    pending.push(Scheduled { at, on: true, pitch: n.pitch, velocity: n.velocity });
                    pending.push(Scheduled { at: at + ring, on: false, pitch: n.pitch, velocity: 0 });
                }
            }
            PlayerCommand::SetInstrument(p) => {
                instrument = p.min(127);
                midi.program_change(channel, instrument);
                debug!(program = instrument, "instrument changed");
            }
            PlayerCommand::Quit => {
                for pitch in sounding.drain(..) {
                    midi.note_off(channel, pitch);
                }
                debug!(dropped = pending.len(), "player stopped");
                return;
            }
        }
    }
}

//! # strum_midi
//!
//! The sound side of the air guitar. Turns accepted strums from
//! [`gesture_core`] into guitar notes and records a session as a standard
//! MIDI file (Type 0, single track).
//!
//! * **Chord** → per-string fret shape ([`Voicing`])
//! * **Fret position** → capo-style offset added to every string
//! * **Strum direction** → string order (down = low E first)
//! * **Strum intensity** → note velocity
//!
//! MIDI bytes are written directly; no external MIDI crate is needed for
//! file output.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use strum_midi::{GeneralMidi, SessionRecorder, StrumMapper};
//! # fn results() -> Vec<gesture_core::MotionResult> { Vec::new() }
//!
//! let mapper = StrumMapper::default();
//! let mut recorder = SessionRecorder::new()
//!     .instrument(GeneralMidi::AcousticGuitarSteel)
//!     .description("air guitar take 1");
//!
//! for result in results() {
//!     let notes = mapper.notes_for(&result);
//!     recorder.record(result.timestamp_ms, &notes);
//! }
//!
//! recorder.to_track().write_file("take1.mid").unwrap();
//! ```

pub mod mapper;
pub mod recorder;
pub mod track;
pub mod voicing;

pub use mapper::{StrumMapper, StrumNote};
pub use recorder::SessionRecorder;
pub use track::{ms_to_ticks, MidiTrack, TimedNote};
pub use voicing::{StandardTuning, Voicing, STRING_COUNT};

// ════════════════════════════════════════════════════════════════════════════
// General MIDI guitar family (Program 24–39)
// ════════════════════════════════════════════════════════════════════════════

/// General MIDI guitar and bass programs (0-indexed, as sent in Program
/// Change).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GeneralMidi {
    // Guitar
    AcousticGuitarNylon  = 24,
    AcousticGuitarSteel  = 25,
    ElectricGuitarJazz   = 26,
    ElectricGuitarClean  = 27,
    ElectricGuitarMuted  = 28,
    OverdrivenGuitar     = 29,
    DistortionGuitar     = 30,
    GuitarHarmonics      = 31,
    // Bass
    AcousticBass         = 32,
    ElectricBassFinger   = 33,
    ElectricBassPick     = 34,
    FretlessBass         = 35,
    SlapBass1            = 36,
    SlapBass2            = 37,
    SynthBass1           = 38,
    SynthBass2           = 39,
}

impl GeneralMidi {
    pub const ALL: [GeneralMidi; 16] = [
        GeneralMidi::AcousticGuitarNylon,
        GeneralMidi::AcousticGuitarSteel,
        GeneralMidi::ElectricGuitarJazz,
        GeneralMidi::ElectricGuitarClean,
        GeneralMidi::ElectricGuitarMuted,
        GeneralMidi::OverdrivenGuitar,
        GeneralMidi::DistortionGuitar,
        GeneralMidi::GuitarHarmonics,
        GeneralMidi::AcousticBass,
        GeneralMidi::ElectricBassFinger,
        GeneralMidi::ElectricBassPick,
        GeneralMidi::FretlessBass,
        GeneralMidi::SlapBass1,
        GeneralMidi::SlapBass2,
        GeneralMidi::SynthBass1,
        GeneralMidi::SynthBass2,
    ];

    /// Raw MIDI program number.
    pub fn program(self) -> u8 { self as u8 }

    /// Look up a program number; `None` outside the guitar family.
    pub fn from_program(program: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|gm| gm.program() == program)
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            GeneralMidi::AcousticGuitarNylon => "Acoustic Guitar (nylon)",
            GeneralMidi::AcousticGuitarSteel => "Acoustic Guitar (steel)",
            GeneralMidi::ElectricGuitarJazz  => "Electric Guitar (jazz)",
            GeneralMidi::ElectricGuitarClean => "Electric Guitar (clean)",
            GeneralMidi::ElectricGuitarMuted => "Electric Guitar (muted)",
            GeneralMidi::OverdrivenGuitar    => "Overdriven Guitar",
            GeneralMidi::DistortionGuitar    => "Distortion Guitar",
            GeneralMidi::GuitarHarmonics     => "Guitar Harmonics",
            GeneralMidi::AcousticBass        => "Acoustic Bass",
            GeneralMidi::ElectricBassFinger  => "Electric Bass (finger)",
            GeneralMidi::ElectricBassPick    => "Electric Bass (pick)",
            GeneralMidi::FretlessBass        => "Fretless Bass",
            GeneralMidi::SlapBass1           => "Slap Bass 1",
            GeneralMidi::SlapBass2           => "Slap Bass 2",
            GeneralMidi::SynthBass1          => "Synth Bass 1",
            GeneralMidi::SynthBass2          => "Synth Bass 2",
        }
    }
}

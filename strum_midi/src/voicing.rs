//! Six-string tuning and open-position chord shapes.
//!
//! Strings are indexed low to high: 0 = low E, 5 = high E.

pub const STRING_COUNT: usize = 6;

// ════════════════════════════════════════════════════════════════════════════
// StandardTuning
// ════════════════════════════════════════════════════════════════════════════

/// Open-string MIDI note numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StandardTuning {
    pub open: [u8; STRING_COUNT],
}

impl StandardTuning {
    /// E2 A2 D3 G3 B3 E4.
    pub const EADGBE: StandardTuning = StandardTuning { open: [40, 45, 50, 55, 59, 64] };

    /// Drop D: the low string tuned down a whole tone.
    pub const DROP_D: StandardTuning = StandardTuning { open: [38, 45, 50, 55, 59, 64] };

    /// Every string shifted by `semitones`, saturating at 0 and 127.
    pub fn transposed(self, semitones: i8) -> Self {
        let open = self.open.map(|n| (n as i16 + semitones as i16).clamp(0, 127) as u8);
        StandardTuning { open }
    }
}

impl Default for StandardTuning {
    fn default() -> Self { StandardTuning::EADGBE }
}

// ════════════════════════════════════════════════════════════════════════════
// Voicing
// ════════════════════════════════════════════════════════════════════════════

/// Fret offset per string; `None` is a muted string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voicing {
    pub frets: [Option<u8>; STRING_COUNT],
    pub name:  &'static str,
}

const X: Option<u8> = None;
const fn f(n: u8) -> Option<u8> { Some(n) }

const SHAPES: [Voicing; 7] = [
    Voicing { name: "C Major", frets: [X,    f(3), f(2), f(0), f(1), f(0)] },
    Voicing { name: "G Major", frets: [f(3), f(2), f(0), f(0), f(0), f(3)] },
    Voicing { name: "D Major", frets: [X,    X,    f(0), f(2), f(3), f(2)] },
    Voicing { name: "A Minor", frets: [X,    f(0), f(2), f(2), f(1), f(0)] },
    Voicing { name: "E Minor", frets: [f(0), f(2), f(2), f(0), f(0), f(0)] },
    Voicing { name: "E Major", frets: [f(0), f(2), f(2), f(1), f(0), f(0)] },
    Voicing { name: "A Major", frets: [X,    f(0), f(2), f(2), f(2), f(0)] },
];

impl Voicing {
    pub const OPEN: Voicing = Voicing { frets: [f(0); STRING_COUNT], name: "Open" };

    /// Open-position shape for a chord name. Names without a shape voice as
    /// open strings, which the fret position turns into a barre.
    pub fn for_chord(name: &str) -> Voicing {
        SHAPES
            .iter()
            .find(|v| v.name == name)
            .copied()
            .unwrap_or(Voicing::OPEN)
    }

    /// Number of strings that sound.
    pub fn sounding(&self) -> usize {
        self.frets.iter().filter(|f| f.is_some()).count()
    }

    /// Pitch of each string with the shape moved up `position` frets.
    /// Muted strings stay `None`; pitches clamp to 127.
    pub fn pitches(&self, tuning: &StandardTuning, position: u8) -> [Option<u8>; STRING_COUNT] {
        let mut out = [None; STRING_COUNT];
        for (i, fret) in self.frets.iter().enumerate() {
            out[i] = fret.map(|fr| (tuning.open[i] as u16 + fr as u16 + position as u16).min(127) as u8);
        }
        out
    }
}

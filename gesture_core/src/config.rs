//! Gesture configuration.
//!
//! Every value is exposed as a `--long` CLI flag and can also be loaded from a
//! JSON file; missing JSON fields take the defaults below.

use std::path::Path;
use std::time::Duration;

use clap::parser::ValueSource;
use clap::{ArgMatches, Args};
use serde::{Deserialize, Serialize};

use crate::chord::ChordTable;
use crate::error::{GestureError, GestureResult};
use crate::geometry::PlaneAngle;

pub const DEFAULT_PLANE_ANGLE_DEG: f32 = 90.0;
/// Vertical wrist travel between frames that counts as a strum, px.
/// Tuning history ranged 12–25 px; 15 is canonical.
pub const DEFAULT_STRUM_THRESHOLD_PX: f32 = 15.0;
/// Wrist travel that maps to full strum intensity, px.
pub const DEFAULT_STRUM_NORMALIZATION_PX: f32 = 50.0;
/// Minimum gap between accepted strums. Tuning history ranged 80–400 ms.
pub const DEFAULT_STRUM_COOLDOWN_MS: u64 = 120;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;
pub const DEFAULT_FRAME_WIDTH: f32 = 640.0;
pub const DEFAULT_FRAME_HEIGHT: f32 = 480.0;
/// Fraction of the frame diagonal treated as fully open hands (fret 0).
pub const DEFAULT_OPEN_HAND_FRACTION: f32 = 0.7;
pub const DEFAULT_MAX_FRET: u8 = 12;
pub const DEFAULT_MIN_HAND_SCORE: f32 = 0.5;

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Guitar-plane inclination in degrees (35–90, 90 = untilted)
    #[arg(long, default_value_t = DEFAULT_PLANE_ANGLE_DEG)]
    pub plane_angle_deg: f32,

    /// Camera image is mirrored (selfie view)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub mirrored: bool,

    #[arg(long, default_value_t = DEFAULT_STRUM_THRESHOLD_PX)]
    pub strum_threshold_px: f32,

    #[arg(long, default_value_t = DEFAULT_STRUM_NORMALIZATION_PX)]
    pub strum_normalization_px: f32,

    #[arg(long, default_value_t = DEFAULT_STRUM_COOLDOWN_MS)]
    pub strum_cooldown_ms: u64,

    /// Frames averaged per wrist before measuring hand spacing
    #[arg(long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    pub smoothing_window: usize,

    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    pub frame_width: f32,

    #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT)]
    pub frame_height: f32,

    #[arg(long, default_value_t = DEFAULT_OPEN_HAND_FRACTION)]
    pub open_hand_fraction: f32,

    #[arg(long, default_value_t = DEFAULT_MAX_FRET)]
    pub max_fret: u8,

    /// Detector confidence below which a hand is ignored
    #[arg(long, default_value_t = DEFAULT_MIN_HAND_SCORE)]
    pub min_hand_score: f32,

    #[arg(skip)]
    pub chords: ChordTable,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            plane_angle_deg:        DEFAULT_PLANE_ANGLE_DEG,
            mirrored:               true,
            strum_threshold_px:     DEFAULT_STRUM_THRESHOLD_PX,
            strum_normalization_px: DEFAULT_STRUM_NORMALIZATION_PX,
            strum_cooldown_ms:      DEFAULT_STRUM_COOLDOWN_MS,
            smoothing_window:       DEFAULT_SMOOTHING_WINDOW,
            frame_width:            DEFAULT_FRAME_WIDTH,
            frame_height:           DEFAULT_FRAME_HEIGHT,
            open_hand_fraction:     DEFAULT_OPEN_HAND_FRACTION,
            max_fret:               DEFAULT_MAX_FRET,
            min_hand_score:         DEFAULT_MIN_HAND_SCORE,
            chords:                 ChordTable::default(),
        }
    }
}

impl GestureConfig {
    /// Load a JSON config file and validate it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GestureResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: GestureConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GestureResult<()> {
        fn positive(name: &str, v: f32) -> GestureResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(GestureError::Config(format!("{} must be a positive number, got {}", name, v)))
            }
        }

        if !self.plane_angle_deg.is_finite() {
            return Err(GestureError::Config("plane_angle_deg must be finite".to_string()));
        }
        positive("strum_threshold_px", self.strum_threshold_px)?;
        positive("strum_normalization_px", self.strum_normalization_px)?;
        positive("frame_width", self.frame_width)?;
        positive("frame_height", self.frame_height)?;
        positive("chords.touch_threshold_px", self.chords.touch_threshold_px)?;

        if !(self.open_hand_fraction > 0.0 && self.open_hand_fraction <= 1.0) {
            return Err(GestureError::Config(format!(
                "open_hand_fraction must be in (0, 1], got {}",
                self.open_hand_fraction
            )));
        }
        if self.smoothing_window == 0 {
            return Err(GestureError::Config("smoothing_window must be at least 1".to_string()));
        }
        if !(1..=24).contains(&self.max_fret) {
            return Err(GestureError::Config(format!("max_fret must be 1–24, got {}", self.max_fret)));
        }
        if !(0.0..=1.0).contains(&self.min_hand_score) {
            return Err(GestureError::Config(format!(
                "min_hand_score must be 0–1, got {}",
                self.min_hand_score
            )));
        }
        if let Some(rule) = self.chords.rules.iter().find(|r| !(0.0..=1.0).contains(&r.confidence)) {
            return Err(GestureError::Config(format!(
                "chord rule '{}' confidence must be 0–1, got {}",
                rule.name, rule.confidence
            )));
        }
        Ok(())
    }

    /// Overwrite fields that were given explicitly on the command line.
    /// Values that clap filled in from defaults leave `self` alone, so a
    /// config file keeps precedence over flag defaults.
    pub fn merge_from_cli(&mut self, cli: &GestureConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($($field:ident),* $(,)?) => {$(
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field;
                }
            )*};
        }

        update_if_present!(
            plane_angle_deg,
            mirrored,
            strum_threshold_px,
            strum_normalization_px,
            strum_cooldown_ms,
            smoothing_window,
            frame_width,
            frame_height,
            open_hand_fraction,
            max_fret,
            min_hand_score,
        );
    }

    /// Configured plane angle, clamped.
    pub fn plane_angle(&self) -> PlaneAngle {
        PlaneAngle::new(self.plane_angle_deg)
    }

    pub fn frame_diagonal(&self) -> f32 {
        (self.frame_width * self.frame_width + self.frame_height * self.frame_height).sqrt()
    }

    /// Hand spacing that maps to fret 0.
    pub fn open_distance(&self) -> f32 {
        self.frame_diagonal() * self.open_hand_fraction
    }

    pub fn strum_cooldown(&self) -> Duration {
        Duration::from_millis(self.strum_cooldown_ms)
    }
}

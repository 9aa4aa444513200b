//! Gesture Extractor — raw, context-free signals from a pair of frames.
//!
//! Given the current and previous [`FrameHandsSnapshot`], produce:
//!
//! * a strum from the strumming wrist's vertical movement,
//! * a chord classification from the fretting hand's fingertips,
//! * the fretting palm's orientation.
//!
//! Nothing here remembers anything between calls; debouncing and chord
//! caching belong to the aggregator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chord::{classify_chord, ChordClassification, ChordTable};
use crate::config::GestureConfig;
use crate::geometry::{rad_to_deg, PlaneAngle};
use crate::hands::FrameHandsSnapshot;
use crate::landmark::{HandObservation, Landmark, INDEX_MCP, PINKY_MCP, WRIST};

// ════════════════════════════════════════════════════════════════════════════
// Strum
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrumDirection {
    Up,
    Down,
}

/// A strum candidate. `intensity` is 0.0–1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrumEvent {
    pub direction: StrumDirection,
    pub intensity: f32,
}

/// Compare two wrist positions of the strumming hand.
///
/// A strum fires only when the vertical movement exceeds `threshold_px`
/// strictly. Downward movement (y grows) is [`StrumDirection::Down`].
/// Intensity is `|dy| / normalization_px`, clamped to 1. A missing or
/// malformed wrist on either side yields `None`, never a zero-strength strum.
pub fn detect_strumming_motion(
    current:          Option<&Landmark>,
    previous:         Option<&Landmark>,
    threshold_px:     f32,
    normalization_px: f32,
) -> Option<StrumEvent> {
    let (current, previous) = (current?, previous?);
    if !current.y.is_finite() || !previous.y.is_finite() {
        debug!("malformed wrist, no strum");
        return None;
    }

    let y_movement = current.y - previous.y;
    if y_movement.abs() <= threshold_px {
        return None;
    }

    let direction = if y_movement > 0.0 { StrumDirection::Down } else { StrumDirection::Up };
    let intensity = if normalization_px > 0.0 {
        (y_movement.abs() / normalization_px).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Some(StrumEvent { direction, intensity })
}

// ════════════════════════════════════════════════════════════════════════════
// Palm orientation
// ════════════════════════════════════════════════════════════════════════════

/// Palm orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandOrientation {
    pub pitch: f32,
    pub roll:  f32,
    pub yaw:   f32,
}

impl HandOrientation {
    pub const NEUTRAL: HandOrientation = HandOrientation { pitch: 0.0, roll: 0.0, yaw: 0.0 };
}

/// Palm orientation from the 3-D wrist, index base and pinky base.
///
/// The palm normal is `(index − wrist) × (pinky − wrist)`, taken after the
/// plane transform. Collinear or malformed landmarks give
/// [`HandOrientation::NEUTRAL`].
pub fn hand_orientation(hand: &HandObservation, plane: PlaneAngle) -> HandOrientation {
    let wrist = plane.apply(&hand.keypoints_3d[WRIST]);
    let index = plane.apply(&hand.keypoints_3d[INDEX_MCP]);
    let pinky = plane.apply(&hand.keypoints_3d[PINKY_MCP]);
    if !wrist.is_finite() || !index.is_finite() || !pinky.is_finite() {
        debug!("malformed palm landmarks, neutral orientation");
        return HandOrientation::NEUTRAL;
    }

    let v1 = [index.x - wrist.x, index.y - wrist.y, index.z - wrist.z];
    let v2 = [pinky.x - wrist.x, pinky.y - wrist.y, pinky.z - wrist.z];
    let n = [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if !(len > 1e-6) {
        return HandOrientation::NEUTRAL;
    }
    let (nx, ny, nz) = (n[0] / len, n[1] / len, n[2] / len);

    HandOrientation {
        pitch: rad_to_deg(ny.atan2(nz)),
        roll:  rad_to_deg(nx.atan2(nz)),
        yaw:   rad_to_deg(ny.atan2(nx)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureExtractor
// ════════════════════════════════════════════════════════════════════════════

/// Signals extracted from one frame transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureSignals {
    pub strum: Option<StrumEvent>,
    /// `None` when the fretting hand is not visible.
    pub chord: Option<ChordClassification>,
    pub palm:  Option<HandOrientation>,
}

/// Thresholds and tables the extractor reads; no per-frame state.
#[derive(Clone, Debug)]
pub struct GestureExtractor {
    strum_threshold_px:     f32,
    strum_normalization_px: f32,
    chords:                 ChordTable,
    plane:                  PlaneAngle,
}

impl GestureExtractor {
    pub fn new(config: &GestureConfig) -> Self {
        GestureExtractor {
            strum_threshold_px:     config.strum_threshold_px,
            strum_normalization_px: config.strum_normalization_px,
            chords:                 config.chords.clone(),
            plane:                  config.plane_angle(),
        }
    }

    pub fn plane(&self) -> PlaneAngle {
        self.plane
    }

    pub fn set_plane(&mut self, plane: PlaneAngle) {
        self.plane = plane;
    }

    pub fn chords(&self) -> &ChordTable {
        &self.chords
    }

    pub fn extract(&self, current: &FrameHandsSnapshot, previous: Option<&FrameHandsSnapshot>) -> GestureSignals {
        let previous_wrist = previous
            .and_then(|p| p.strumming.as_ref())
            .map(HandObservation::wrist);
        let current_wrist = current.strumming.as_ref().map(HandObservation::wrist);

        let strum = detect_strumming_motion(
            current_wrist,
            previous_wrist,
            self.strum_threshold_px,
            self.strum_normalization_px,
        );

        let fretting = current.fretting.as_ref();
        GestureSignals {
            strum,
            chord: fretting.map(|h| classify_chord(h, &self.chords, self.plane)),
            palm:  fretting.map(|h| hand_orientation(h, self.plane)),
        }
    }
}

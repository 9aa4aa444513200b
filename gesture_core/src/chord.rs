//! Chord-shape classification from fretting-hand fingertips.
//!
//! This is a coarse rule table, not a trained classifier. Each rule states
//! whether the index, middle and ring fingertips touch the thumb tip; the
//! first matching rule names the chord. Anything else is [`UNKNOWN_CHORD`]
//! with [`UNKNOWN_CONFIDENCE`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{try_plane_distance, PlaneAngle};
use crate::landmark::{HandObservation, INDEX_TIP, MIDDLE_TIP, RING_TIP, THUMB_TIP};

/// Name reported when no rule matches.
pub const UNKNOWN_CHORD: &str = "Unknown";

/// Confidence attached to [`UNKNOWN_CHORD`].
pub const UNKNOWN_CONFIDENCE: f32 = 0.1;

/// Fingertip-to-thumb spacing below which a finger counts as touching, px.
pub const DEFAULT_TOUCH_THRESHOLD_PX: f32 = 40.0;

// ════════════════════════════════════════════════════════════════════════════
// Rule table
// ════════════════════════════════════════════════════════════════════════════

/// Whether a fingertip is pinched against the thumb tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    Touching,
    Apart,
}

impl Contact {
    fn from_distance(distance: f32, threshold: f32) -> Self {
        if distance < threshold { Contact::Touching } else { Contact::Apart }
    }
}

/// One row of the chord table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChordRule {
    pub name:       String,
    pub index:      Contact,
    pub middle:     Contact,
    pub ring:       Contact,
    pub confidence: f32,
}

impl ChordRule {
    pub fn new(name: &str, index: Contact, middle: Contact, ring: Contact, confidence: f32) -> Self {
        ChordRule { name: name.to_string(), index, middle, ring, confidence }
    }

    fn matches(&self, shape: &FingerShape) -> bool {
        self.index == shape.index && self.middle == shape.middle && self.ring == shape.ring
    }
}

/// Ordered rule table plus the touch threshold it is read against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChordTable {
    pub touch_threshold_px: f32,
    pub rules: Vec<ChordRule>,
}

impl Default for ChordTable {
    fn default() -> Self {
        use Contact::*;
        ChordTable {
            touch_threshold_px: DEFAULT_TOUCH_THRESHOLD_PX,
            rules: vec![
                ChordRule::new("C Major", Touching, Apart,    Apart,    0.8),
                ChordRule::new("G Major", Apart,    Touching, Apart,    0.8),
                ChordRule::new("D Major", Apart,    Apart,    Touching, 0.75),
            ],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classification
// ════════════════════════════════════════════════════════════════════════════

/// Result of classifying one hand shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChordClassification {
    pub name:       String,
    pub confidence: f32,
}

impl ChordClassification {
    pub fn unknown() -> Self {
        ChordClassification {
            name:       UNKNOWN_CHORD.to_string(),
            confidence: UNKNOWN_CONFIDENCE,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_CHORD
    }
}

/// Contact state of the three classified fingers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerShape {
    pub index:  Contact,
    pub middle: Contact,
    pub ring:   Contact,
}

/// Read the finger contacts off a hand, or `None` if any tip is malformed.
pub fn finger_shape(hand: &HandObservation, threshold_px: f32, plane: PlaneAngle) -> Option<FingerShape> {
    let thumb = &hand.keypoints[THUMB_TIP];
    let index  = try_plane_distance(&hand.keypoints[INDEX_TIP], thumb, plane)?;
    let middle = try_plane_distance(&hand.keypoints[MIDDLE_TIP], thumb, plane)?;
    let ring   = try_plane_distance(&hand.keypoints[RING_TIP], thumb, plane)?;
    Some(FingerShape {
        index:  Contact::from_distance(index, threshold_px),
        middle: Contact::from_distance(middle, threshold_px),
        ring:   Contact::from_distance(ring, threshold_px),
    })
}

/// Classify the fretting hand's shape against `table`.
pub fn classify_chord(hand: &HandObservation, table: &ChordTable, plane: PlaneAngle) -> ChordClassification {
    let Some(shape) = finger_shape(hand, table.touch_threshold_px, plane) else {
        debug!("malformed fingertips, chord unknown");
        return ChordClassification::unknown();
    };
    table
        .rules
        .iter()
        .find(|rule| rule.matches(&shape))
        .map(|rule| ChordClassification {
            name:       rule.name.clone(),
            confidence: rule.confidence,
        })
        .unwrap_or_else(ChordClassification::unknown)
}

//! Hand-role resolution.
//!
//! The detector labels hands in its own unmirrored frame. The application
//! works in roles instead: the player's right hand strums, the left hand
//! frets. Roles are resolved once per frame so nothing downstream has to
//! reason about which "left" a label means.

use tracing::debug;

use crate::landmark::{DetectedFrame, HandObservation, Handedness};

/// What a hand does on the virtual guitar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandRole {
    /// Rhythm hand; its wrist trajectory produces strums.
    Strumming,
    /// Chord hand; its fingertip shape selects the chord.
    Fretting,
}

impl HandRole {
    /// Resolve a detector label to a role.
    ///
    /// With `mirrored` set (selfie view) the detector sees the player's right
    /// hand as "Left", so the label is flipped before mapping.
    pub fn resolve(handedness: Handedness, mirrored: bool) -> Self {
        let anatomical = if mirrored { handedness.opposite() } else { handedness };
        match anatomical {
            Handedness::Right => HandRole::Strumming,
            Handedness::Left  => HandRole::Fretting,
        }
    }
}

/// The hands of one frame, keyed by role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameHandsSnapshot {
    pub timestamp_ms: u64,
    pub strumming:    Option<HandObservation>,
    pub fretting:     Option<HandObservation>,
}

impl FrameHandsSnapshot {
    pub fn empty(timestamp_ms: u64) -> Self {
        FrameHandsSnapshot { timestamp_ms, strumming: None, fretting: None }
    }

    /// Assign each detected hand a role.
    ///
    /// Hands scoring below `min_score` are ignored. If two hands resolve to
    /// the same role, the higher-scoring one keeps it.
    pub fn from_frame(frame: &DetectedFrame, mirrored: bool, min_score: f32) -> Self {
        let mut snapshot = FrameHandsSnapshot::empty(frame.timestamp_ms);

        for hand in frame.hands.iter().take(2) {
            if !(hand.score >= min_score) {
                debug!(score = hand.score, min_score = min_score, "ignoring low-confidence hand");
                continue;
            }
            let slot = match HandRole::resolve(hand.handedness, mirrored) {
                HandRole::Strumming => &mut snapshot.strumming,
                HandRole::Fretting  => &mut snapshot.fretting,
            };
            let keep_existing = slot
                .as_ref()
                .is_some_and(|existing| existing.score >= hand.score);
            if keep_existing {
                debug!(handedness = ?hand.handedness, "duplicate role, keeping higher score");
            } else {
                *slot = Some(hand.clone());
            }
        }
        snapshot
    }

    pub fn hand(&self, role: HandRole) -> Option<&HandObservation> {
        match role {
            HandRole::Strumming => self.strumming.as_ref(),
            HandRole::Fretting  => self.fretting.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strumming.is_none() && self.fretting.is_none()
    }
}

//! Raw detector output: landmarks, handedness, and per-frame hand observations.
//!
//! Everything here is produced fresh by the external hand detector each frame
//! and lives only for the duration of one frame's processing.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Hand landmark indices (21-point hand model)
// ════════════════════════════════════════════════════════════════════════════

/// Number of keypoints per hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// A tracked point in frame-pixel space.
///
/// `x` grows to the right, `y` grows downward, `z` is relative depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Point on the image plane (`z = 0`).
    pub const fn planar(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }

    /// False if any coordinate is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// Detector-reported hand label, in the detector's own (unmirrored) frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn opposite(self) -> Self {
        match self {
            Handedness::Left  => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

fn zero_keypoints() -> [Landmark; LANDMARK_COUNT] {
    [Landmark::default(); LANDMARK_COUNT]
}

/// One detected hand in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub handedness: Handedness,
    /// Detector confidence, 0.0–1.0.
    pub score: f32,
    /// Image-space keypoints (pixels).
    pub keypoints: [Landmark; LANDMARK_COUNT],
    /// World-space keypoints. Detectors that do not supply them leave zeros,
    /// which orientation math treats as degenerate.
    #[serde(rename = "keypoints3D", default = "zero_keypoints")]
    pub keypoints_3d: [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    pub fn new(handedness: Handedness, score: f32, keypoints: [Landmark; LANDMARK_COUNT]) -> Self {
        HandObservation {
            handedness,
            score,
            keypoints,
            keypoints_3d: zero_keypoints(),
        }
    }

    pub fn wrist(&self) -> &Landmark {
        &self.keypoints[WRIST]
    }

    pub fn keypoint(&self, index: usize) -> Option<&Landmark> {
        self.keypoints.get(index)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectedFrame
// ════════════════════════════════════════════════════════════════════════════

/// Everything the detector reported for one video frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedFrame {
    /// Capture time in milliseconds on a monotonic session clock.
    pub timestamp_ms: u64,
    /// Zero, one, or two hands. Anything past the second is ignored.
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_landmark_is_not_finite() {
        assert!(Landmark::planar(1.0, 2.0).is_finite());
        assert!(!Landmark::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Landmark::new(0.0, f32::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn handedness_opposite_round_trips() {
        assert_eq!(Handedness::Left.opposite(), Handedness::Right);
        assert_eq!(Handedness::Right.opposite().opposite(), Handedness::Right);
    }

    #[test]
    fn frame_json_without_3d_keypoints() {
        let points: Vec<String> = (0..LANDMARK_COUNT)
            .map(|i| format!(r#"{{"x":{}.0,"y":1.0,"z":0.0}}"#, i))
            .collect();
        let json = format!(
            r#"{{"timestamp_ms":33,"hands":[{{"handedness":"Left","score":0.9,"keypoints":[{}]}}]}}"#,
            points.join(",")
        );
        let frame: DetectedFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame.timestamp_ms, 33);
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].keypoints[THUMB_TIP].x, 4.0);
        assert_eq!(frame.hands[0].keypoints_3d[WRIST], Landmark::default());
    }

    #[test]
    fn planar_keypoints_without_depth() {
        let p: Landmark = serde_json::from_str(r#"{"x":12.5,"y":40.0,"name":"wrist"}"#).unwrap();
        assert_eq!(p, Landmark::planar(12.5, 40.0));

        let points = vec![r#"{"x":3.0,"y":4.0}"#; LANDMARK_COUNT].join(",");
        let json = format!(
            r#"{{"timestamp_ms":1,"hands":[{{"handedness":"Right","score":0.8,"keypoints":[{}]}}]}}"#,
            points
        );
        let frame: DetectedFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(*frame.hands[0].wrist(), Landmark::planar(3.0, 4.0));
    }
}

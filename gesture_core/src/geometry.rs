//! Shared geometry: the guitar-plane transform, plane-adjusted distances,
//! moving-average smoothing, and the distance → fret mapping.
//!
//! All functions are pure. Malformed (non-finite) input never panics; it
//! produces a neutral value and a `tracing` diagnostic, and callers must read
//! that neutral value as "no reliable signal".

use std::collections::VecDeque;

use tracing::warn;

use crate::landmark::Landmark;

// ════════════════════════════════════════════════════════════════════════════
// Angles
// ════════════════════════════════════════════════════════════════════════════

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * 180.0 / std::f32::consts::PI
}

/// Lowest selectable guitar-plane angle, degrees.
pub const MIN_PLANE_ANGLE_DEG: f32 = 35.0;
/// Highest selectable guitar-plane angle; 90° means an untilted plane.
pub const MAX_PLANE_ANGLE_DEG: f32 = 90.0;

// ════════════════════════════════════════════════════════════════════════════
// PlaneAngle
// ════════════════════════════════════════════════════════════════════════════

/// Inclination of the virtual guitar plane.
///
/// Every distance and orientation computation first shears each point with
/// `y' = y + x · tan(θ − 90°)`, so at θ = 90° points pass through unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneAngle {
    degrees: f32,
    slope:   f32,
}

impl PlaneAngle {
    /// Build from degrees, clamped to
    /// [`MIN_PLANE_ANGLE_DEG`]..=[`MAX_PLANE_ANGLE_DEG`].
    pub fn new(degrees: f32) -> Self {
        let degrees = if degrees.is_finite() {
            degrees.clamp(MIN_PLANE_ANGLE_DEG, MAX_PLANE_ANGLE_DEG)
        } else {
            warn!(degrees = degrees, "non-finite plane angle, falling back to untilted");
            MAX_PLANE_ANGLE_DEG
        };
        PlaneAngle {
            degrees,
            slope: deg_to_rad(degrees - 90.0).tan(),
        }
    }

    /// The untilted plane (θ = 90°).
    pub fn untilted() -> Self {
        PlaneAngle::new(MAX_PLANE_ANGLE_DEG)
    }

    pub fn degrees(&self) -> f32 {
        self.degrees
    }

    /// `tan(θ − 90°)`.
    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// Shear one point into the tilted plane.
    pub fn apply(&self, p: &Landmark) -> Landmark {
        Landmark {
            x: p.x,
            y: p.y + p.x * self.slope,
            z: p.z,
        }
    }
}

impl Default for PlaneAngle {
    fn default() -> Self {
        PlaneAngle::untilted()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Distances
// ════════════════════════════════════════════════════════════════════════════

/// Image-plane distance between two points after the plane transform, or
/// `None` if either point is malformed.
pub fn try_plane_distance(a: &Landmark, b: &Landmark, plane: PlaneAngle) -> Option<f32> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let a = plane.apply(a);
    let b = plane.apply(b);
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let d = (dx * dx + dy * dy).sqrt();
    d.is_finite().then_some(d)
}

/// Image-plane distance after the plane transform. Malformed input yields
/// `0.0`, which is not a real zero distance.
pub fn plane_distance(a: &Landmark, b: &Landmark, plane: PlaneAngle) -> f32 {
    match try_plane_distance(a, b, plane) {
        Some(d) => d,
        None => {
            warn!(?a, ?b, "malformed landmark in distance computation");
            0.0
        }
    }
}

/// Full 3-D distance after the plane transform; `0.0` on malformed input.
pub fn plane_distance_3d(a: &Landmark, b: &Landmark, plane: PlaneAngle) -> f32 {
    if !a.is_finite() || !b.is_finite() {
        warn!(?a, ?b, "malformed landmark in 3-D distance computation");
        return 0.0;
    }
    let a = plane.apply(a);
    let b = plane.apply(b);
    let (dx, dy, dz) = (a.x - b.x, a.y - b.y, a.z - b.z);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ════════════════════════════════════════════════════════════════════════════
// MovingAverage
// ════════════════════════════════════════════════════════════════════════════

/// Arithmetic mean over the last `window` landmarks.
#[derive(Clone, Debug)]
pub struct MovingAverage {
    samples: VecDeque<Landmark>,
    window:  usize,
}

impl MovingAverage {
    /// A window of 0 is treated as 1 (no smoothing).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        MovingAverage {
            samples: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    /// Add a sample and return the mean of the retained window.
    ///
    /// Non-finite samples are dropped; the mean of what is already buffered is
    /// returned instead (`None` if nothing is buffered).
    pub fn push(&mut self, sample: Landmark) -> Option<Landmark> {
        if !sample.is_finite() {
            warn!(?sample, "dropping malformed sample from smoothing window");
            return self.mean();
        }
        self.samples.push_back(sample);
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
        self.mean()
    }

    pub fn mean(&self) -> Option<Landmark> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f32;
        let (sx, sy, sz) = self.samples.iter().fold((0.0, 0.0, 0.0), |acc, p| {
            (acc.0 + p.x, acc.1 + p.y, acc.2 + p.z)
        });
        Some(Landmark::new(sx / n, sy / n, sz / n))
    }

    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    pub fn window(&self) -> usize { self.window }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fret mapping
// ════════════════════════════════════════════════════════════════════════════

/// Map an inter-hand distance onto `0..=max_fret`, closer hands giving higher
/// frets.
///
/// `open_distance` is the spacing treated as fully open (fret 0). Returns
/// `None` for a malformed distance or a non-positive `open_distance`.
pub fn fret_for_distance(distance: f32, open_distance: f32, max_fret: u8) -> Option<u8> {
    if !distance.is_finite() || !open_distance.is_finite() || open_distance <= 0.0 {
        return None;
    }
    let normalized = (distance / open_distance).clamp(0.0, 1.0);
    let fret = ((1.0 - normalized) * max_fret as f32).round();
    Some(fret.clamp(0.0, max_fret as f32) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_radians_round_trip() {
        assert!((deg_to_rad(180.0) - std::f32::consts::PI).abs() < 1e-6);
        assert!((rad_to_deg(deg_to_rad(37.5)) - 37.5).abs() < 1e-4);
    }

    #[test]
    fn plane_angle_is_clamped() {
        assert_eq!(PlaneAngle::new(10.0).degrees(), MIN_PLANE_ANGLE_DEG);
        assert_eq!(PlaneAngle::new(120.0).degrees(), MAX_PLANE_ANGLE_DEG);
        assert_eq!(PlaneAngle::new(f32::NAN).degrees(), MAX_PLANE_ANGLE_DEG);
    }

    #[test]
    fn untilted_plane_leaves_points_alone() {
        let p = Landmark::new(123.0, 45.0, -2.0);
        assert_eq!(PlaneAngle::untilted().apply(&p), p);
    }

    #[test]
    fn tilted_plane_shears_y_by_x() {
        // θ = 45° → tan(−45°) = −1 → y' = y − x
        let plane = PlaneAngle::new(45.0);
        let p = plane.apply(&Landmark::planar(10.0, 30.0));
        assert!((p.y - 20.0).abs() < 1e-4);
        assert_eq!(p.x, 10.0);
    }

    #[test]
    fn malformed_distance_is_neutral() {
        let a = Landmark::planar(f32::NAN, 0.0);
        let b = Landmark::planar(3.0, 4.0);
        assert_eq!(plane_distance(&a, &b, PlaneAngle::untilted()), 0.0);
        assert_eq!(try_plane_distance(&a, &b, PlaneAngle::untilted()), None);
    }

    #[test]
    fn distance_3d_includes_depth() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(2.0, 3.0, 6.0);
        assert!((plane_distance_3d(&a, &b, PlaneAngle::untilted()) - 7.0).abs() < 1e-5);
    }

    #[test]
    fn moving_average_evicts_oldest() {
        let mut ma = MovingAverage::new(3);
        ma.push(Landmark::planar(0.0, 0.0));
        ma.push(Landmark::planar(3.0, 3.0));
        ma.push(Landmark::planar(6.0, 6.0));
        let m = ma.push(Landmark::planar(9.0, 9.0)).unwrap();
        assert_eq!(ma.len(), 3);
        assert!((m.x - 6.0).abs() < 1e-6);
    }

    #[test]
    fn moving_average_skips_nan() {
        let mut ma = MovingAverage::new(3);
        assert_eq!(ma.push(Landmark::planar(f32::NAN, 1.0)), None);
        ma.push(Landmark::planar(4.0, 4.0));
        let m = ma.push(Landmark::planar(f32::NAN, 1.0)).unwrap();
        assert_eq!(m, Landmark::planar(4.0, 4.0));
        assert_eq!(ma.len(), 1);
    }

    #[test]
    fn zero_window_means_no_smoothing() {
        let mut ma = MovingAverage::new(0);
        ma.push(Landmark::planar(1.0, 1.0));
        let m = ma.push(Landmark::planar(5.0, 5.0)).unwrap();
        assert_eq!(m, Landmark::planar(5.0, 5.0));
    }

    #[test]
    fn fret_endpoints() {
        assert_eq!(fret_for_distance(0.0, 560.0, 12), Some(12));
        assert_eq!(fret_for_distance(560.0, 560.0, 12), Some(0));
        assert_eq!(fret_for_distance(9000.0, 560.0, 12), Some(0));
        assert_eq!(fret_for_distance(f32::NAN, 560.0, 12), None);
        assert_eq!(fret_for_distance(10.0, 0.0, 12), None);
    }
}

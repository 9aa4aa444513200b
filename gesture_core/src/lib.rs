//! # gesture_core
//!
//! Turns per-frame hand landmarks into guitar events.
//!
//! ```text
//!  DetectedFrame ──► FrameHandsSnapshot ──► GestureExtractor ──► MotionAggregator ──► MotionResult
//!   (detector)        (role resolution)      (strum / chord /      (cooldown, chord      (sink)
//!                                             palm signals)         cache, fret)
//! ```
//!
//! ## Gesture → music mapping
//!
//! | Gesture | Hand | Result |
//! |---|---|---|
//! | Wrist moves down more than the threshold between frames | Strumming | Down strum, intensity ∝ travel |
//! | Wrist moves up more than the threshold | Strumming | Up strum |
//! | Index tip pinched to thumb | Fretting | C Major |
//! | Middle tip pinched to thumb | Fretting | G Major |
//! | Ring tip pinched to thumb | Fretting | D Major |
//! | Hands closer together | Both | Higher fret (0–12) |
//!
//! ## Quick start
//!
//! ```rust
//! use gesture_core::{FramePipeline, FrameEvent, DetectedFrame, GestureConfig, NullSink};
//!
//! let mut pipeline = FramePipeline::new(GestureConfig::default());
//! let result = pipeline
//!     .process(FrameEvent::Detected(DetectedFrame::default()), &mut NullSink)
//!     .unwrap();
//! assert!(!result.strum_detected);
//! assert_eq!(result.chord_type, "Unknown");
//! ```

pub mod aggregator;
pub mod chord;
pub mod config;
pub mod error;
pub mod extractor;
pub mod geometry;
pub mod hands;
pub mod landmark;
pub mod pipeline;

pub use aggregator::{MotionAggregator, MotionResult};
pub use chord::{classify_chord, ChordClassification, ChordRule, ChordTable, Contact, UNKNOWN_CHORD};
pub use config::GestureConfig;
pub use error::{GestureError, GestureResult};
pub use extractor::{
    detect_strumming_motion, hand_orientation, GestureExtractor, GestureSignals, HandOrientation,
    StrumDirection, StrumEvent,
};
pub use geometry::{plane_distance, MovingAverage, PlaneAngle};
pub use hands::{FrameHandsSnapshot, HandRole};
pub use landmark::{DetectedFrame, HandObservation, Handedness, Landmark, LANDMARK_COUNT};
pub use pipeline::{FrameEvent, FramePipeline, MotionSink, NullSink, PipelineState, PipelineStats};

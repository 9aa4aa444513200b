//! Frame pipeline — the boundary between a frame source and the aggregator.
//!
//! Events are processed strictly one at a time, in arrival order. A failed
//! detector frame is skipped; a frame arriving after [`FramePipeline::stop`]
//! or carrying a timestamp no newer than the last processed frame is stale
//! and dropped without touching aggregator state.

use tracing::{debug, info, warn};

use crate::aggregator::{MotionAggregator, MotionResult};
use crate::config::GestureConfig;
use crate::hands::FrameHandsSnapshot;
use crate::landmark::DetectedFrame;

// ════════════════════════════════════════════════════════════════════════════
// FrameEvent
// ════════════════════════════════════════════════════════════════════════════

/// What a frame source delivers for each captured frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameEvent {
    Detected(DetectedFrame),
    /// The detector failed on this frame (threw, timed out, bad data).
    Failed(String),
}

// ════════════════════════════════════════════════════════════════════════════
// MotionSink
// ════════════════════════════════════════════════════════════════════════════

/// Consumer of pipeline output (sound mapper, UI, recorder).
pub trait MotionSink {
    /// Every processed frame.
    fn on_motion(&mut self, _result: &MotionResult) {}

    /// Once per accepted strum.
    fn on_strum(&mut self, _result: &MotionResult) {}

    /// When the cached chord changes to a new known chord.
    fn on_chord_change(&mut self, _chord: &str) {}
}

/// Sink that ignores everything.
pub struct NullSink;

impl MotionSink for NullSink {}

impl<F: FnMut(&MotionResult)> MotionSink for F {
    fn on_strum(&mut self, result: &MotionResult) {
        self(result)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FramePipeline
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Stopped,
}

/// Per-frame counters, for status lines and shutdown logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub failed:    u64,
    pub stale:     u64,
    pub strums:    u64,
}

pub struct FramePipeline {
    aggregator:     MotionAggregator,
    state:          PipelineState,
    last_timestamp: Option<u64>,
    stats:          PipelineStats,
}

impl FramePipeline {
    pub fn new(config: GestureConfig) -> Self {
        FramePipeline {
            aggregator:     MotionAggregator::new(config),
            state:          PipelineState::Running,
            last_timestamp: None,
            stats:          PipelineStats::default(),
        }
    }

    pub fn state(&self) -> PipelineState { self.state }
    pub fn stats(&self) -> PipelineStats { self.stats }
    pub fn aggregator(&self) -> &MotionAggregator { &self.aggregator }

    /// Mutable access for user controls such as the plane angle.
    pub fn aggregator_mut(&mut self) -> &mut MotionAggregator { &mut self.aggregator }

    /// Stop accepting frames. Anything still in flight is discarded.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Running {
            info!(processed = self.stats.processed, strums = self.stats.strums, "pipeline stopped");
        }
        self.state = PipelineState::Stopped;
    }

    pub fn resume(&mut self) {
        self.state = PipelineState::Running;
    }

    /// Clear aggregator history and the stale-frame watermark.
    pub fn reset(&mut self) {
        self.aggregator.reset();
        self.last_timestamp = None;
        self.stats = PipelineStats::default();
    }

    /// Handle one event. Returns the frame's result, or `None` when the frame
    /// was skipped.
    pub fn process<S: MotionSink + ?Sized>(&mut self, event: FrameEvent, sink: &mut S) -> Option<MotionResult> {
        if self.state == PipelineState::Stopped {
            debug!("pipeline stopped, discarding late frame");
            self.stats.stale += 1;
            return None;
        }

        let frame = match event {
            FrameEvent::Detected(frame) => frame,
            FrameEvent::Failed(reason) => {
                warn!(%reason, "hand detector failed, skipping frame");
                self.stats.failed += 1;
                return None;
            }
        };

        if self.last_timestamp.is_some_and(|last| frame.timestamp_ms <= last) {
            debug!(timestamp_ms = frame.timestamp_ms, "stale frame discarded");
            self.stats.stale += 1;
            return None;
        }
        self.last_timestamp = Some(frame.timestamp_ms);

        let config = self.aggregator.config();
        let snapshot = FrameHandsSnapshot::from_frame(&frame, config.mirrored, config.min_hand_score);
        let result = self.aggregator.process(snapshot);
        self.stats.processed += 1;

        sink.on_motion(&result);
        if result.chord_changed {
            sink.on_chord_change(&result.chord_type);
        }
        if result.strum_detected {
            self.stats.strums += 1;
            sink.on_strum(&result);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{HandObservation, Handedness, Landmark, LANDMARK_COUNT};

    /// Mirrored "Left" label = player's right hand = strumming.
    fn strum_frame(t: u64, y: f32) -> FrameEvent {
        let hand = HandObservation::new(Handedness::Left, 0.9, [Landmark::planar(500.0, y); LANDMARK_COUNT]);
        FrameEvent::Detected(DetectedFrame { timestamp_ms: t, hands: vec![hand] })
    }

    #[derive(Default)]
    struct Recording {
        motions: usize,
        strums:  Vec<u64>,
    }

    impl MotionSink for Recording {
        fn on_motion(&mut self, _r: &MotionResult) { self.motions += 1; }
        fn on_strum(&mut self, r: &MotionResult) { self.strums.push(r.timestamp_ms); }
    }

    #[test]
    fn one_result_per_frame_and_one_callback_per_strum() {
        let mut p = FramePipeline::new(GestureConfig::default());
        let mut sink = Recording::default();
        p.process(strum_frame(0, 200.0), &mut sink);
        p.process(strum_frame(33, 240.0), &mut sink);
        p.process(strum_frame(66, 280.0), &mut sink);
        assert_eq!(sink.motions, 3);
        assert_eq!(sink.strums, vec![33]);
        assert_eq!(p.stats().strums, 1);
    }

    #[test]
    fn detector_failure_skips_frame() {
        let mut p = FramePipeline::new(GestureConfig::default());
        assert!(p.process(FrameEvent::Failed("inference timeout".into()), &mut NullSink).is_none());
        assert!(p.process(strum_frame(0, 200.0), &mut NullSink).is_some());
        assert_eq!(p.stats().failed, 1);
    }

    #[test]
    fn stale_and_post_stop_frames_are_discarded() {
        let mut p = FramePipeline::new(GestureConfig::default());
        p.process(strum_frame(100, 200.0), &mut NullSink);
        assert!(p.process(strum_frame(100, 260.0), &mut NullSink).is_none());
        assert!(p.process(strum_frame(50, 260.0), &mut NullSink).is_none());
        p.stop();
        assert!(p.process(strum_frame(200, 260.0), &mut NullSink).is_none());
        assert_eq!(p.stats().stale, 3);
        assert_eq!(p.aggregator().last_strum_ms(), None);
    }

    #[test]
    fn closure_sink_sees_strums() {
        let mut p = FramePipeline::new(GestureConfig::default());
        let mut seen = Vec::new();
        let mut sink = |r: &MotionResult| seen.push(r.strum_direction);
        p.process(strum_frame(0, 300.0), &mut sink);
        p.process(strum_frame(40, 250.0), &mut sink);
        assert_eq!(seen, vec![Some(crate::extractor::StrumDirection::Up)]);
    }
}

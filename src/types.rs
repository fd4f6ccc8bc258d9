//! Core types for the Ocustream engine
//!
//! This module defines the data that flows through the engine: per-frame
//! measurements on the way in, blink events internally, and classified
//! frame results on the way out.

use serde::{Deserialize, Serialize};

/// One per-frame eye-openness measurement supplied by the host.
///
/// `timestamp` is monotonic seconds from an arbitrary epoch (the host's
/// capture clock). `openness` is the eye aspect ratio (EAR) or any
/// equivalent non-negative scalar where lower means more closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Monotonic capture time in seconds
    pub timestamp: f64,
    /// Eye-openness scalar (EAR); lower = more closed
    pub openness: f64,
}

impl Measurement {
    pub fn new(timestamp: f64, openness: f64) -> Self {
        Self { timestamp, openness }
    }
}

/// A debounced blink: a sustained closure followed by re-opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Timestamp of the frame on which the eye re-opened
    pub timestamp: f64,
}

/// Result of feeding one measurement to the blink detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkUpdate {
    /// A blink completed on this frame
    pub blinked: bool,
    /// Continuous eye-closed time after this frame (seconds)
    pub closed_duration_secs: f64,
}

/// Tiered alertness classification, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueState {
    Normal,
    Fatigued,
    Drowsy,
}

impl FatigueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatigueState::Normal => "normal",
            FatigueState::Fatigued => "fatigued",
            FatigueState::Drowsy => "drowsy",
        }
    }
}

/// Per-frame output of the stream controller.
///
/// During calibration `threshold` is `None` and `calibrating` is true; the
/// first frame that carries `Some(threshold)` is the calibration frame
/// itself, which is never evaluated for blinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Timestamp of the measurement this result was derived from
    pub timestamp: f64,
    /// The raw openness value, echoed for host-side export
    pub ear: f64,
    /// Detection threshold, once calibration has fixed it
    pub threshold: Option<f64>,
    /// True while the engine is still collecting calibration samples
    pub calibrating: bool,
    /// Total blinks emitted since the start of the run
    pub blink_count: u64,
    /// Blinks within the trailing rate window
    pub blink_rate: u32,
    /// Alertness tier for this frame
    pub state: FatigueState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fatigue_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&FatigueState::Drowsy).unwrap(),
            "\"drowsy\""
        );
        assert_eq!(FatigueState::Fatigued.as_str(), "fatigued");
    }

    #[test]
    fn frame_result_round_trips_through_json() {
        let result = FrameResult {
            timestamp: 12.5,
            ear: 0.31,
            threshold: Some(0.24),
            calibrating: false,
            blink_count: 4,
            blink_rate: 4,
            state: FatigueState::Normal,
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: FrameResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}

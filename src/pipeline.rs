//! Stream orchestration
//!
//! This module provides the public API of Ocustream. A [`StreamController`]
//! owns the calibration, blink-detection, and rate-tracking state for one
//! subject and exposes a single entry point: one measurement in, one
//! classified frame result out.

use crate::calibrator::Calibrator;
use crate::classifier::classify;
use crate::config::StreamConfig;
use crate::detector::BlinkDetector;
use crate::error::StreamError;
use crate::rate::RateTracker;
use crate::types::{FatigueState, FrameResult, Measurement};
use serde::{Deserialize, Serialize};

/// Run phase. The transition to `Operational` happens exactly once per run
/// and is irreversible; the calibrator is consumed by it, so the threshold
/// can never be recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Phase {
    Calibrating(Calibrator),
    Operational { threshold: f64 },
}

/// Running counters for the session report.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Total frames processed, calibration included
    pub frames: u64,
    /// Frames consumed by calibration
    pub calibration_frames: u64,
    /// Frames classified Normal
    pub normal_frames: u64,
    /// Frames classified Fatigued
    pub fatigued_frames: u64,
    /// Frames classified Drowsy
    pub drowsy_frames: u64,
    /// Sum of finite openness values (for the mean)
    ear_sum: f64,
    /// Count of finite openness values
    ear_count: u64,
    /// Smallest finite openness seen
    pub ear_min: Option<f64>,
    /// Largest finite openness seen
    pub ear_max: Option<f64>,
}

impl SessionStats {
    fn absorb(&mut self, result: &FrameResult) {
        self.frames += 1;
        if result.calibrating {
            self.calibration_frames += 1;
        } else {
            match result.state {
                FatigueState::Normal => self.normal_frames += 1,
                FatigueState::Fatigued => self.fatigued_frames += 1,
                FatigueState::Drowsy => self.drowsy_frames += 1,
            }
        }
        if result.ear.is_finite() {
            self.ear_sum += result.ear;
            self.ear_count += 1;
            self.ear_min = Some(self.ear_min.map_or(result.ear, |m| m.min(result.ear)));
            self.ear_max = Some(self.ear_max.map_or(result.ear, |m| m.max(result.ear)));
        }
    }

    /// Mean of the finite openness values seen so far
    pub fn ear_mean(&self) -> Option<f64> {
        if self.ear_count == 0 {
            return None;
        }
        Some(self.ear_sum / self.ear_count as f64)
    }
}

/// Stateful per-subject ocular state engine.
///
/// Single-threaded and synchronous: the controller holds no locks and owns
/// no shared state, so run one instance per independent stream and do not
/// share an instance across concurrent callers without external
/// synchronization. Timestamps fed to [`process_frame`](Self::process_frame)
/// must be non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamController {
    config: StreamConfig,
    phase: Phase,
    detector: BlinkDetector,
    tracker: RateTracker,
    blink_count: u64,
    start_ts: Option<f64>,
    last_ts: Option<f64>,
    stats: SessionStats,
    last_result: Option<FrameResult>,
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamController {
    /// Create a controller with default settings
    pub fn new() -> Self {
        let config = StreamConfig::default();
        Self {
            phase: Phase::Calibrating(Calibrator::new(
                config.calibration_secs,
                config.calibration_factor,
            )),
            detector: BlinkDetector::new(),
            tracker: RateTracker::new(),
            blink_count: 0,
            start_ts: None,
            last_ts: None,
            stats: SessionStats::default(),
            last_result: None,
            config,
        }
    }

    /// Create a controller with a specific configuration
    pub fn with_config(config: StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self {
            phase: Phase::Calibrating(Calibrator::new(
                config.calibration_secs,
                config.calibration_factor,
            )),
            detector: BlinkDetector::new(),
            tracker: RateTracker::new(),
            blink_count: 0,
            start_ts: None,
            last_ts: None,
            stats: SessionStats::default(),
            last_result: None,
            config,
        })
    }

    /// Process one measurement and classify the frame.
    ///
    /// The first `calibration_secs` of the stream feed the calibrator; those
    /// frames report `calibrating: true` and are never evaluated for blinks,
    /// including the frame on which the threshold is fixed. A decreasing or
    /// non-finite timestamp fails fast with [`StreamError::Ordering`] and
    /// leaves the engine state untouched.
    pub fn process_frame(&mut self, measurement: Measurement) -> Result<FrameResult, StreamError> {
        let ts = measurement.timestamp;
        // NaN comparisons are all false, so the non-finite check must be explicit.
        if !ts.is_finite() || self.last_ts.is_some_and(|last| ts < last) {
            return Err(StreamError::Ordering {
                last: self.last_ts.unwrap_or(f64::NAN),
                got: ts,
            });
        }

        let start = *self.start_ts.get_or_insert(ts);
        self.last_ts = Some(ts);
        let elapsed = ts - start;

        let result = match &mut self.phase {
            Phase::Calibrating(calibrator) => {
                let threshold = calibrator.observe(measurement.openness, elapsed)?;
                if let Some(threshold) = threshold {
                    self.phase = Phase::Operational { threshold };
                }
                FrameResult {
                    timestamp: ts,
                    ear: measurement.openness,
                    threshold,
                    calibrating: true,
                    blink_count: 0,
                    blink_rate: 0,
                    state: FatigueState::Normal,
                }
            }
            Phase::Operational { threshold } => {
                let threshold = *threshold;
                let update = self.detector.update(
                    measurement.openness,
                    threshold,
                    self.config.consec_frames,
                    self.config.frame_dt,
                );
                if update.blinked {
                    self.tracker.record(ts, self.config.window_secs);
                    self.blink_count += 1;
                }
                let rate = self.tracker.rate(ts, self.config.window_secs);
                let state = classify(
                    rate,
                    update.closed_duration_secs,
                    self.config.rate_threshold,
                    self.config.drowsy_secs,
                );
                FrameResult {
                    timestamp: ts,
                    ear: measurement.openness,
                    threshold: Some(threshold),
                    calibrating: false,
                    blink_count: self.blink_count,
                    blink_rate: rate,
                    state,
                }
            }
        };

        self.stats.absorb(&result);
        self.last_result = Some(result);
        Ok(result)
    }

    /// The fixed detection threshold, once calibration is complete
    pub fn threshold(&self) -> Option<f64> {
        match self.phase {
            Phase::Calibrating(_) => None,
            Phase::Operational { threshold } => Some(threshold),
        }
    }

    /// True while the engine is still collecting calibration samples
    pub fn is_calibrating(&self) -> bool {
        matches!(self.phase, Phase::Calibrating(_))
    }

    /// Total blinks emitted since the start of the run
    pub fn blink_count(&self) -> u64 {
        self.blink_count
    }

    /// Running session counters
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The most recent frame result, if any
    pub fn last_result(&self) -> Option<&FrameResult> {
        self.last_result.as_ref()
    }

    /// The configuration this controller was built with
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Serialize the full engine state to JSON so a host can resume a
    /// session after a restart
    pub fn save_state(&self) -> Result<String, StreamError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore an engine from a [`save_state`](Self::save_state) snapshot
    pub fn load_state(json: &str) -> Result<Self, StreamError> {
        let controller: Self = serde_json::from_str(json)?;
        controller.config.validate()?;
        Ok(controller)
    }
}

/// Classify a complete measurement series in one call (stateless).
///
/// Convenience wrapper for hosts that have the whole series in memory;
/// equivalent to feeding each measurement to a fresh [`StreamController`].
pub fn classify_series(
    measurements: &[Measurement],
    config: &StreamConfig,
) -> Result<Vec<FrameResult>, StreamError> {
    let mut controller = StreamController::with_config(*config)?;
    measurements
        .iter()
        .map(|m| controller.process_frame(*m))
        .collect()
}

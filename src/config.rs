//! Engine configuration
//!
//! All tunables of the calibration, blink-detection, and classification
//! stages live here, with defaults matching a 30 fps capture pipeline.

use crate::error::StreamError;
use serde::{Deserialize, Serialize};

/// Default calibration window (seconds of presumed eyes-open footage)
pub const DEFAULT_CALIBRATION_SECS: f64 = 5.0;

/// Default fraction of the mean open-eye EAR used as the closed threshold
pub const DEFAULT_CALIBRATION_FACTOR: f64 = 0.75;

/// Default consecutive closed frames required before a closure counts
pub const DEFAULT_CONSEC_FRAMES: u32 = 3;

/// Default trailing window for the blink rate (seconds)
pub const DEFAULT_WINDOW_SECS: f64 = 60.0;

/// Default blink rate above which a subject is considered fatigued
pub const DEFAULT_RATE_THRESHOLD: f64 = 25.0;

/// Default continuous closure duration that indicates drowsiness (seconds)
pub const DEFAULT_DROWSY_SECS: f64 = 1.5;

/// Default nominal frame period (30 fps capture)
pub const DEFAULT_FRAME_DT: f64 = 1.0 / 30.0;

/// Configuration for a [`StreamController`](crate::pipeline::StreamController).
///
/// Closed-eye time is accumulated in steps of `frame_dt` rather than measured
/// wall-clock deltas: the upstream capture loop runs at a fixed cadence, so
/// under dropped frames the drowsiness clock undercounts instead of spiking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Length of the initial calibration window (seconds)
    pub calibration_secs: f64,
    /// Threshold = mean(calibration samples) * this factor
    pub calibration_factor: f64,
    /// Closed frames required for a closure to count as a blink
    pub consec_frames: u32,
    /// Trailing window for the blink-rate statistic (seconds)
    pub window_secs: f64,
    /// Blinks per window above which the subject is Fatigued
    pub rate_threshold: f64,
    /// Continuous closure duration that flips the state to Drowsy (seconds)
    pub drowsy_secs: f64,
    /// Nominal frame period used to accumulate closed-eye time (seconds)
    pub frame_dt: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            calibration_secs: DEFAULT_CALIBRATION_SECS,
            calibration_factor: DEFAULT_CALIBRATION_FACTOR,
            consec_frames: DEFAULT_CONSEC_FRAMES,
            window_secs: DEFAULT_WINDOW_SECS,
            rate_threshold: DEFAULT_RATE_THRESHOLD,
            drowsy_secs: DEFAULT_DROWSY_SECS,
            frame_dt: DEFAULT_FRAME_DT,
        }
    }
}

impl StreamConfig {
    /// Check that every tunable is usable before a run starts.
    pub fn validate(&self) -> Result<(), StreamError> {
        if !(self.calibration_secs > 0.0) || !self.calibration_secs.is_finite() {
            return Err(StreamError::Config(format!(
                "calibration_secs must be a positive finite number, got {}",
                self.calibration_secs
            )));
        }
        if !(self.calibration_factor > 0.0) || !self.calibration_factor.is_finite() {
            return Err(StreamError::Config(format!(
                "calibration_factor must be a positive finite number, got {}",
                self.calibration_factor
            )));
        }
        if self.consec_frames == 0 {
            return Err(StreamError::Config(
                "consec_frames must be at least 1".to_string(),
            ));
        }
        if !(self.window_secs > 0.0) || !self.window_secs.is_finite() {
            return Err(StreamError::Config(format!(
                "window_secs must be a positive finite number, got {}",
                self.window_secs
            )));
        }
        if self.rate_threshold < 0.0 || !self.rate_threshold.is_finite() {
            return Err(StreamError::Config(format!(
                "rate_threshold must be non-negative and finite, got {}",
                self.rate_threshold
            )));
        }
        if self.drowsy_secs < 0.0 || !self.drowsy_secs.is_finite() {
            return Err(StreamError::Config(format!(
                "drowsy_secs must be non-negative and finite, got {}",
                self.drowsy_secs
            )));
        }
        if !(self.frame_dt > 0.0) || !self.frame_dt.is_finite() {
            return Err(StreamError::Config(format!(
                "frame_dt must be a positive finite number, got {}",
                self.frame_dt
            )));
        }
        Ok(())
    }

    /// Load a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this configuration to JSON
    pub fn to_json(&self) -> Result<String, StreamError> {
        Ok(serde_json::to_string(self)?)
    }
}

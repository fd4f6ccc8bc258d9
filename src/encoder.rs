//! Session report encoding
//!
//! Encodes the end-of-run summary of a stream into an osr.session.v1
//! payload: producer metadata, calibration outcome, blink totals, and the
//! per-state frame distribution. The payload is returned as a value; any
//! file I/O is the host's responsibility.

use crate::error::StreamError;
use crate::pipeline::StreamController;
use crate::types::FatigueState;
use crate::{PRODUCER_NAME, VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current session report schema version
pub const REPORT_VERSION: &str = "osr.session.v1";

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Calibration outcome for the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCalibration {
    /// Frames consumed by calibration
    pub frames: u64,
    /// The fixed detection threshold, if calibration completed
    pub threshold: Option<f64>,
}

/// Blink statistics for the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBlinks {
    /// Total blinks emitted over the run
    pub total: u64,
    /// Blink rate at the final frame
    pub final_rate: u32,
}

/// Openness signal statistics for the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEar {
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

/// How many operational frames landed in each alertness tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStateFrames {
    pub normal: u64,
    pub fatigued: u64,
    pub drowsy: u64,
}

/// Complete session report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: DateTime<Utc>,
    /// Total frames processed, calibration included
    pub frames: u64,
    pub calibration: ReportCalibration,
    pub blinks: ReportBlinks,
    pub ear: ReportEar,
    pub state_frames: ReportStateFrames,
    /// Alertness tier at the final frame, if any operational frame was seen
    pub final_state: Option<FatigueState>,
}

/// Encoder for producing session report payloads
pub struct SessionReportEncoder {
    instance_id: String,
}

impl Default for SessionReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build a session report from a controller's current state
    pub fn encode(&self, controller: &StreamController) -> SessionReport {
        let stats = controller.stats();
        let last = controller.last_result().filter(|r| !r.calibrating);

        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now(),
            frames: stats.frames,
            calibration: ReportCalibration {
                frames: stats.calibration_frames,
                threshold: controller.threshold(),
            },
            blinks: ReportBlinks {
                total: controller.blink_count(),
                final_rate: last.map_or(0, |r| r.blink_rate),
            },
            ear: ReportEar {
                min: stats.ear_min,
                mean: stats.ear_mean(),
                max: stats.ear_max,
            },
            state_frames: ReportStateFrames {
                normal: stats.normal_frames,
                fatigued: stats.fatigued_frames,
                drowsy: stats.drowsy_frames,
            },
            final_state: last.map(|r| r.state),
        }
    }

    /// Encode a report directly to JSON
    pub fn encode_to_json(&self, controller: &StreamController) -> Result<String, StreamError> {
        Ok(serde_json::to_string(&self.encode(controller))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamConfig;
    use crate::types::Measurement;

    const DT: f64 = 1.0 / 30.0;

    fn run_short_session() -> StreamController {
        let config = StreamConfig {
            calibration_secs: 1.0,
            ..Default::default()
        };
        let mut controller = StreamController::with_config(config).unwrap();
        let mut ts = 0.0;
        while controller.is_calibrating() {
            controller.process_frame(Measurement::new(ts, 0.32)).unwrap();
            ts += DT;
        }
        for _ in 0..3 {
            controller.process_frame(Measurement::new(ts, 0.05)).unwrap();
            ts += DT;
        }
        controller.process_frame(Measurement::new(ts, 0.32)).unwrap();
        controller
    }

    #[test]
    fn report_carries_producer_and_version() {
        let controller = run_short_session();
        let encoder = SessionReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&controller);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
    }

    #[test]
    fn report_reflects_session_counters() {
        let controller = run_short_session();
        let report = SessionReportEncoder::new().encode(&controller);

        assert_eq!(report.blinks.total, 1);
        assert_eq!(report.blinks.final_rate, 1);
        assert!(report.calibration.threshold.is_some());
        assert!(report.calibration.frames > 0);
        assert_eq!(
            report.frames,
            report.calibration.frames
                + report.state_frames.normal
                + report.state_frames.fatigued
                + report.state_frames.drowsy
        );
        assert_eq!(report.final_state, Some(FatigueState::Normal));
        assert_eq!(report.ear.min, Some(0.05));
    }

    #[test]
    fn report_before_any_operational_frame_has_no_final_state() {
        let controller = StreamController::new();
        let report = SessionReportEncoder::new().encode(&controller);

        assert_eq!(report.frames, 0);
        assert_eq!(report.final_state, None);
        assert_eq!(report.blinks.total, 0);
        assert_eq!(report.calibration.threshold, None);
    }

    #[test]
    fn report_round_trips_through_json() {
        let controller = run_short_session();
        let encoder = SessionReportEncoder::new();
        let json = encoder.encode_to_json(&controller).unwrap();

        let parsed: SessionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.blinks.total, 1);
        assert_eq!(parsed.report_version, REPORT_VERSION);
    }
}

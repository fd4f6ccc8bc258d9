//! Ocustream - On-device streaming engine for ocular state classification
//!
//! Ocustream turns a noisy per-frame eye-openness (EAR) signal into discrete
//! blink events, a rolling blink-rate statistic, and a tiered alertness
//! classification, in real time with no lookahead: calibration → blink
//! detection → rate tracking → fatigue classification.
//!
//! Capture, landmark extraction, rendering, and persistence are the host's
//! concern; the engine exposes one operation, [`StreamController::process_frame`],
//! taking a [`Measurement`](types::Measurement) and returning a
//! [`FrameResult`](types::FrameResult).

pub mod calibrator;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod rate;
pub mod schema;
pub mod types;

pub use config::StreamConfig;
pub use error::StreamError;
pub use pipeline::{classify_series, SessionStats, StreamController};
pub use types::{FatigueState, FrameResult, Measurement};

// Schema exports
pub use schema::{FrameRecord, SCHEMA_VERSION};

// Report exports
pub use encoder::{SessionReport, SessionReportEncoder};

/// Ocustream version embedded in all session reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for session reports
pub const PRODUCER_NAME: &str = "ocustream";

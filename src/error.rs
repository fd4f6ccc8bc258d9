//! Error types for Ocustream

use thiserror::Error;

/// Errors that can occur while processing a measurement stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Calibration failed: {0}")]
    Calibration(String),

    #[error("Non-monotonic or invalid timestamp: last seen {last}, got {got}")]
    Ordering { last: f64, got: f64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid frame record: {0}")]
    InvalidRecord(String),
}

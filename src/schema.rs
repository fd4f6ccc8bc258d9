//! ocu.frame.v1 input record schema
//!
//! Wire format for per-frame measurements arriving from a host capture
//! pipeline, plus NDJSON/array parsing helpers for the CLI. A record carries
//! a monotonic timestamp and an eye-openness scalar; NaN openness is legal
//! on the wire (the engine treats it as eyes-open), a non-finite timestamp
//! is not.

use crate::error::StreamError;
use crate::types::Measurement;
use serde::{Deserialize, Serialize};

/// Current input schema version
pub const SCHEMA_VERSION: &str = "ocu.frame.v1";

/// One measurement record as received from a host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Schema identifier; optional on input, checked when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Monotonic capture time in seconds
    pub t: f64,
    /// Eye-openness scalar (EAR)
    pub ear: f64,
    /// Optional identifier of the producing capture pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FrameRecord {
    /// Check the record is well-formed for the engine
    pub fn validate(&self) -> Result<(), StreamError> {
        if let Some(version) = &self.schema_version {
            if version != SCHEMA_VERSION {
                return Err(StreamError::InvalidRecord(format!(
                    "unsupported schema_version {version:?}, expected {SCHEMA_VERSION:?}"
                )));
            }
        }
        if !self.t.is_finite() {
            return Err(StreamError::InvalidRecord(format!(
                "timestamp must be finite, got {}",
                self.t
            )));
        }
        Ok(())
    }

    /// Convert to the engine's measurement type
    pub fn to_measurement(&self) -> Measurement {
        Measurement::new(self.t, self.ear)
    }
}

/// Parse newline-delimited JSON records, skipping blank lines
pub fn parse_ndjson(input: &str) -> Result<Vec<FrameRecord>, StreamError> {
    let mut records = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(trimmed).map_err(|e| {
            StreamError::InvalidRecord(format!("line {}: {}", line_no + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Parse a JSON array of records
pub fn parse_array(input: &str) -> Result<Vec<FrameRecord>, StreamError> {
    Ok(serde_json::from_str(input)?)
}

/// A record that failed validation, with its position in the input
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    pub index: usize,
    pub error: String,
}

/// Validate every record, returning the failures
pub fn validate_records(records: &[FrameRecord]) -> Vec<RecordError> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            record.validate().err().map(|e| RecordError {
                index,
                error: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ndjson_and_skips_blank_lines() {
        let input = "{\"t\": 0.0, \"ear\": 0.31}\n\n{\"t\": 0.033, \"ear\": 0.12}\n";
        let records = parse_ndjson(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].ear, 0.12);
    }

    #[test]
    fn ndjson_errors_carry_the_line_number() {
        let input = "{\"t\": 0.0, \"ear\": 0.31}\nnot json\n";
        let err = parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn parses_json_array() {
        let input = r#"[{"t": 0.0, "ear": 0.3}, {"t": 0.1, "ear": 0.3}]"#;
        let records = parse_array(input).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn wrong_schema_version_is_rejected() {
        let record = FrameRecord {
            schema_version: Some("ocu.frame.v2".to_string()),
            t: 0.0,
            ear: 0.3,
            source: None,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn matching_schema_version_passes() {
        let record = FrameRecord {
            schema_version: Some(SCHEMA_VERSION.to_string()),
            t: 0.0,
            ear: 0.3,
            source: Some("cam0".to_string()),
        };
        assert!(record.validate().is_ok());
    }

    #[test]
    fn non_finite_timestamp_fails_validation() {
        let record = FrameRecord {
            schema_version: None,
            t: f64::INFINITY,
            ear: 0.3,
            source: None,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn nan_openness_passes_validation() {
        let record = FrameRecord {
            schema_version: None,
            t: 1.0,
            ear: f64::NAN,
            source: None,
        };
        assert!(record.validate().is_ok());
    }

    #[test]
    fn validate_records_reports_failing_indices() {
        let records = vec![
            FrameRecord {
                schema_version: None,
                t: 0.0,
                ear: 0.3,
                source: None,
            },
            FrameRecord {
                schema_version: None,
                t: f64::NAN,
                ear: 0.3,
                source: None,
            },
        ];
        let errors = validate_records(&records);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 1);
    }
}

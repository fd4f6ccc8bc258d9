//! Subject-specific threshold calibration
//!
//! The first seconds of a run are presumed eyes-open footage. The calibrator
//! collects openness samples over that window and derives the closed-eye
//! detection threshold as a fraction of their mean. Once fixed, the threshold
//! never changes for the remainder of the run.

use crate::error::StreamError;
use serde::{Deserialize, Serialize};

/// Collects eyes-open samples and produces the detection threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibrator {
    /// Length of the calibration window (seconds)
    calibration_secs: f64,
    /// Fraction of the mean open-eye value used as the threshold
    calibration_factor: f64,
    /// Openness samples collected so far
    samples: Vec<f64>,
}

impl Calibrator {
    pub fn new(calibration_secs: f64, calibration_factor: f64) -> Self {
        Self {
            calibration_secs,
            calibration_factor,
            samples: Vec::new(),
        }
    }

    /// Feed one measurement.
    ///
    /// Returns `Ok(None)` while the calibration window is still open and
    /// `Ok(Some(threshold))` on the first call at or past the window end. The
    /// finalizing frame's own sample is not included in the mean, and the
    /// frame itself must not be evaluated for blinks by the caller.
    ///
    /// Non-finite openness values are skipped entirely; a window that elapses
    /// with no usable samples is a [`StreamError::Calibration`].
    pub fn observe(
        &mut self,
        openness: f64,
        elapsed_secs: f64,
    ) -> Result<Option<f64>, StreamError> {
        if elapsed_secs < self.calibration_secs {
            if openness.is_finite() {
                self.samples.push(openness);
            }
            return Ok(None);
        }

        if self.samples.is_empty() {
            return Err(StreamError::Calibration(format!(
                "no usable samples collected in {:.2}s calibration window",
                self.calibration_secs
            )));
        }

        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        Ok(Some(mean * self.calibration_factor))
    }

    /// Number of samples collected so far
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_scaled_mean_of_samples() {
        let mut calibrator = Calibrator::new(1.0, 0.75);

        for (i, ear) in [0.30, 0.32, 0.34].iter().enumerate() {
            let result = calibrator.observe(*ear, i as f64 * 0.1).unwrap();
            assert!(result.is_none());
        }

        let threshold = calibrator.observe(0.31, 1.0).unwrap().unwrap();
        let expected = (0.30 + 0.32 + 0.34) / 3.0 * 0.75;
        assert!((threshold - expected).abs() < 1e-12);
    }

    #[test]
    fn finalizing_sample_is_not_part_of_the_mean() {
        let mut calibrator = Calibrator::new(1.0, 1.0);
        calibrator.observe(0.4, 0.0).unwrap();

        // Wildly different value on the finalizing frame must not move the mean
        let threshold = calibrator.observe(99.0, 1.5).unwrap().unwrap();
        assert!((threshold - 0.4).abs() < 1e-12);
        assert_eq!(calibrator.sample_count(), 1);
    }

    #[test]
    fn empty_window_is_a_calibration_error() {
        let mut calibrator = Calibrator::new(0.0, 0.75);
        let result = calibrator.observe(0.3, 0.0);
        assert!(matches!(result, Err(StreamError::Calibration(_))));
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let mut calibrator = Calibrator::new(1.0, 0.5);
        calibrator.observe(f64::NAN, 0.0).unwrap();
        calibrator.observe(f64::INFINITY, 0.1).unwrap();
        calibrator.observe(0.4, 0.2).unwrap();

        assert_eq!(calibrator.sample_count(), 1);
        let threshold = calibrator.observe(0.4, 1.0).unwrap().unwrap();
        assert!((threshold - 0.2).abs() < 1e-12);
    }

    #[test]
    fn all_samples_non_finite_is_an_error() {
        let mut calibrator = Calibrator::new(1.0, 0.75);
        calibrator.observe(f64::NAN, 0.0).unwrap();
        let result = calibrator.observe(0.3, 1.0);
        assert!(matches!(result, Err(StreamError::Calibration(_))));
    }
}

//! Blink detection
//!
//! A stateful debouncer over the openness signal. A closure only counts as a
//! blink if it persists for a minimum number of consecutive frames and is
//! then followed by re-opening; single-frame dips are rejected as noise.

use crate::types::BlinkUpdate;
use serde::{Deserialize, Serialize};

/// Debouncing blink detector.
///
/// Total function over its input space: any finite openness is either below
/// the threshold (closed) or not, and NaN/infinite values compare as not
/// below, which deliberately counts them as eyes-open so corrupt frames
/// never inflate the closed-eye clock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlinkDetector {
    /// Consecutive frames below threshold so far
    consecutive_closed_frames: u32,
    /// Accumulated continuous eye-closed time (seconds)
    closed_duration_secs: f64,
}

impl BlinkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one measurement and report whether a blink completed.
    ///
    /// Closed-eye time advances by `frame_dt` per closed frame, the nominal
    /// frame period of the capture loop. Both the frame counter and the
    /// closed-eye clock reset on every open frame, blink or not.
    pub fn update(
        &mut self,
        openness: f64,
        threshold: f64,
        consec_frames_required: u32,
        frame_dt: f64,
    ) -> BlinkUpdate {
        if openness < threshold {
            self.consecutive_closed_frames = self.consecutive_closed_frames.saturating_add(1);
            self.closed_duration_secs += frame_dt;
            BlinkUpdate {
                blinked: false,
                closed_duration_secs: self.closed_duration_secs,
            }
        } else {
            let blinked = self.consecutive_closed_frames >= consec_frames_required;
            self.consecutive_closed_frames = 0;
            self.closed_duration_secs = 0.0;
            BlinkUpdate {
                blinked,
                closed_duration_secs: 0.0,
            }
        }
    }

    /// Continuous eye-closed time as of the last update (seconds)
    pub fn closed_duration_secs(&self) -> f64 {
        self.closed_duration_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 30.0;

    fn feed(detector: &mut BlinkDetector, values: &[f64]) -> Vec<BlinkUpdate> {
        values
            .iter()
            .map(|&ear| detector.update(ear, 0.25, 3, DT))
            .collect()
    }

    #[test]
    fn closure_of_exactly_required_length_emits_one_blink() {
        let mut detector = BlinkDetector::new();
        let updates = feed(&mut detector, &[0.1, 0.1, 0.1, 0.3]);

        assert_eq!(
            updates.iter().filter(|u| u.blinked).count(),
            1,
            "expected exactly one blink"
        );
        assert!(updates[3].blinked);
        assert_eq!(updates[3].closed_duration_secs, 0.0);
    }

    #[test]
    fn closure_one_frame_short_emits_nothing() {
        let mut detector = BlinkDetector::new();
        let updates = feed(&mut detector, &[0.1, 0.1, 0.3]);
        assert!(updates.iter().all(|u| !u.blinked));
    }

    #[test]
    fn closed_duration_accumulates_in_frame_steps() {
        let mut detector = BlinkDetector::new();
        let updates = feed(&mut detector, &[0.1, 0.1, 0.1, 0.1]);
        assert!((updates[3].closed_duration_secs - 4.0 * DT).abs() < 1e-12);
    }

    #[test]
    fn open_frame_resets_counter_and_clock() {
        let mut detector = BlinkDetector::new();
        feed(&mut detector, &[0.1, 0.1, 0.3]);
        assert_eq!(detector.closed_duration_secs(), 0.0);

        // The interrupted closure must not carry over
        let updates = feed(&mut detector, &[0.1, 0.3]);
        assert!(!updates[1].blinked);
    }

    #[test]
    fn a_long_closure_still_counts_as_one_blink() {
        let mut detector = BlinkDetector::new();
        let mut values = vec![0.1; 20];
        values.push(0.3);
        let updates = feed(&mut detector, &values);
        assert_eq!(updates.iter().filter(|u| u.blinked).count(), 1);
    }

    #[test]
    fn nan_openness_counts_as_eyes_open() {
        let mut detector = BlinkDetector::new();
        feed(&mut detector, &[0.1, 0.1]);

        let update = detector.update(f64::NAN, 0.25, 3, DT);
        assert!(!update.blinked);
        assert_eq!(update.closed_duration_secs, 0.0);
        assert_eq!(detector.closed_duration_secs(), 0.0);
    }

    #[test]
    fn back_to_back_blinks_are_counted_separately() {
        let mut detector = BlinkDetector::new();
        let updates = feed(&mut detector, &[0.1, 0.1, 0.1, 0.3, 0.1, 0.1, 0.1, 0.3]);
        assert_eq!(updates.iter().filter(|u| u.blinked).count(), 2);
    }
}

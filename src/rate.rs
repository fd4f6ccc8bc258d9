//! Blink-rate tracking
//!
//! Maintains a trailing time window of blink events and reports the count on
//! demand. Events older than the window are pruned on each call; pruning is
//! a memory optimization only and never changes the reported rate.

use crate::types::BlinkEvent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Sliding-window counter of blink events.
///
/// Timestamps passed to [`record`](Self::record) must be non-decreasing;
/// the stream controller enforces that before events reach this tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateTracker {
    events: VecDeque<BlinkEvent>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blink event, dropping events that have left the window.
    pub fn record(&mut self, timestamp: f64, window_secs: f64) {
        self.events.push_back(BlinkEvent { timestamp });
        self.prune(timestamp, window_secs);
    }

    /// Count blinks with `now - timestamp <= window_secs`.
    pub fn rate(&mut self, now: f64, window_secs: f64) -> u32 {
        self.prune(now, window_secs);
        self.events
            .iter()
            .filter(|e| now - e.timestamp <= window_secs)
            .count() as u32
    }

    /// Number of events currently retained (pruned or not)
    pub fn retained(&self) -> usize {
        self.events.len()
    }

    fn prune(&mut self, now: f64, window_secs: f64) {
        let cutoff = now - window_secs;
        while let Some(front) = self.events.front() {
            if front.timestamp < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: f64 = 60.0;

    #[test]
    fn recent_events_are_all_counted() {
        let mut tracker = RateTracker::new();
        for i in 0..5 {
            tracker.record(10.0 + i as f64, WINDOW);
        }
        assert_eq!(tracker.rate(15.0, WINDOW), 5);
    }

    #[test]
    fn events_leave_the_window_as_time_advances() {
        let mut tracker = RateTracker::new();
        tracker.record(0.0, WINDOW);
        tracker.record(30.0, WINDOW);

        assert_eq!(tracker.rate(59.0, WINDOW), 2);
        // 0.0 is now 61s old, 30.0 still inside
        assert_eq!(tracker.rate(61.0, WINDOW), 1);
        assert_eq!(tracker.rate(91.0, WINDOW), 0);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let mut tracker = RateTracker::new();
        tracker.record(0.0, WINDOW);
        assert_eq!(tracker.rate(60.0, WINDOW), 1);
        assert_eq!(tracker.rate(60.0 + 1e-9, WINDOW), 0);
    }

    #[test]
    fn rate_is_invariant_to_pruning_strategy() {
        // Eager pruning (record with the real window) and lazy pruning
        // (record with an enormous window so nothing is dropped until the
        // query) must report the same rate.
        let timestamps = [0.0, 10.0, 25.0, 40.0, 70.0, 71.0, 100.0];

        let mut eager = RateTracker::new();
        let mut lazy = RateTracker::new();
        for &t in &timestamps {
            eager.record(t, WINDOW);
            lazy.record(t, f64::INFINITY);
        }

        assert_eq!(eager.rate(100.0, WINDOW), lazy.rate(100.0, WINDOW));
        assert!(eager.retained() <= lazy.retained());
    }

    #[test]
    fn pruning_bounds_memory() {
        let mut tracker = RateTracker::new();
        for i in 0..10_000 {
            tracker.record(i as f64, WINDOW);
        }
        // Only the last ~60 seconds of events should remain
        assert!(tracker.retained() <= 62);
    }
}

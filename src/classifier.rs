//! Fatigue classification
//!
//! Pure mapping from the current blink rate and continuous closed-eye time
//! to a discrete alertness tier. Drowsy outranks Fatigued: a sustained
//! closure is a stronger signal than an elevated blink rate, so it wins
//! whenever both conditions hold.

use crate::types::FatigueState;

/// Classify the current frame's alertness tier.
///
/// * `Drowsy` if `closed_duration_secs >= drowsy_secs` (checked first).
/// * `Fatigued` if `blink_rate > rate_threshold`.
/// * `Normal` otherwise.
pub fn classify(
    blink_rate: u32,
    closed_duration_secs: f64,
    rate_threshold: f64,
    drowsy_secs: f64,
) -> FatigueState {
    if closed_duration_secs >= drowsy_secs {
        FatigueState::Drowsy
    } else if f64::from(blink_rate) > rate_threshold {
        FatigueState::Fatigued
    } else {
        FatigueState::Normal
    }
}

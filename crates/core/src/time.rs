//! Player clock formatting.

/// Formats seconds as `M:SS`, minutes unpadded.
///
/// Callers pass non-negative values; anything else renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Time left in the track, as shown on the right side of the progress bar.
pub fn format_remaining(current_time: f64, duration: f64) -> String {
    format_time((duration - current_time).max(0.0))
}

/// Fill ratio of the progress bar; 0 until the duration is known.
pub fn progress_ratio(current_time: f64, duration: f64) -> f64 {
    if duration.is_nan() || duration <= 0.0 {
        return 0.0;
    }
    crate::model::clamp_unit(current_time / duration)
}

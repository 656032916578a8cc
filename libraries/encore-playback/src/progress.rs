//! Progress bar helpers
//!
//! Formatting for the elapsed/duration labels either side of the seek slider.

/// Format seconds as `m:ss` (or `h:mm:ss` past an hour)
///
/// Non-finite or negative input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Position as a percentage (0-100) of the duration
///
/// Returns 0 until the duration is known.
pub fn progress_percent(current_secs: f64, duration_secs: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || !current_secs.is_finite() {
        return 0.0;
    }
    (current_secs / duration_secs * 100.0).clamp(0.0, 100.0)
}

//! Human-readable sizes, durations, and timestamps.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::time::Duration;

use chrono::{DateTime, Local};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Binary-scaled size with two decimals (`1.50 KB`). Negative values keep their sign.
#[must_use]
pub fn format_size(bytes: f64) -> String {
    if !bytes.is_finite() {
        return "0.00 B".to_string();
    }
    let mut value = bytes;
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} PB")
}

/// `1h 2m 3s`, `2m 5s`, or `12.34s` for sub-minute spans.
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    let total = elapsed.as_secs();
    let (h, m, s) = (total / 3_600, (total % 3_600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{seconds:.2}s")
    }
}

/// Local wall-clock timestamp as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Signed integer with an explicit `+` for growth.
#[must_use]
pub fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

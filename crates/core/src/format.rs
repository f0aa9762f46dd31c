//! Human-readable formatting for dates, file sizes and time intervals

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Pattern used when the caller gives none
pub const DEFAULT_DATETIME_PATTERN: &str = "YYYY-MM-DD HH:mm:ss";

const SIZE_UNITS: [&str; 7] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Naive layouts accepted by [`format_date_time_str`], tried in order
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Format a date-time with a token pattern
///
/// Tokens `YYYY`, `MM`, `DD`, `HH`, `mm` and `ss` are substituted once
/// each, in that order, with zero-padded values. Everything else in the
/// pattern is copied through.
pub fn format_date_time<T: Datelike + Timelike>(dt: &T, pattern: &str) -> String {
    pattern
        .replacen("YYYY", &format!("{:04}", dt.year()), 1)
        .replacen("MM", &format!("{:02}", dt.month()), 1)
        .replacen("DD", &format!("{:02}", dt.day()), 1)
        .replacen("HH", &format!("{:02}", dt.hour()), 1)
        .replacen("mm", &format!("{:02}", dt.minute()), 1)
        .replacen("ss", &format!("{:02}", dt.second()), 1)
}

/// Parse then format a date-time string
///
/// Accepts RFC 3339 (formatted in its own offset), `YYYY-MM-DD HH:MM:SS`
/// with optional fraction or `T` separator, and a bare `YYYY-MM-DD`.
/// Empty input gives an empty string; anything unparseable is returned
/// unchanged.
pub fn format_date_time_str(input: &str, pattern: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return format_date_time(&dt, pattern);
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return format_date_time(&dt, pattern);
        }
    }

    if let Some(dt) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return format_date_time(&dt, pattern);
    }

    input.to_string()
}

/// Format a byte count with 1024-based units
///
/// The value is rounded half up to `decimals` places and trailing zeros
/// are dropped: `1536` with 2 decimals is `1.5 KB`, `1024` is `1 KB`,
/// `2560` with 0 decimals is `3 KB`.
pub fn format_file_size(bytes: u64, decimals: u32) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    // Formatting alone rounds ties to even.
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    let rendered = format!("{:.*}", decimals as usize, rounded);
    format!("{} {}", trim_fraction(&rendered), SIZE_UNITS[unit])
}

/// Format a number of seconds as `45s`, `2m 5s` or `1h 30m`
///
/// Below an hour the remainder is shown in seconds, above it in whole
/// minutes; zero remainders are omitted.
pub fn format_time_interval(seconds: f64) -> Result<String> {
    if !seconds.is_finite() {
        return Err(Error::invalid("seconds", format!("{} is not a finite number", seconds)));
    }
    if seconds < 0.0 {
        return Err(Error::invalid("seconds", format!("{} is negative", seconds)));
    }

    let text = if seconds < 60.0 {
        format!("{}s", seconds.round() as u64)
    } else if seconds < 3600.0 {
        let minutes = (seconds / 60.0).floor() as u64;
        let rest = (seconds % 60.0).round() as u64;
        if rest > 0 {
            format!("{}m {}s", minutes, rest)
        } else {
            format!("{}m", minutes)
        }
    } else {
        let hours = (seconds / 3600.0).floor() as u64;
        let rest = ((seconds % 3600.0) / 60.0).floor() as u64;
        if rest > 0 {
            format!("{}h {}m", hours, rest)
        } else {
            format!("{}h", hours)
        }
    };

    Ok(text)
}

fn trim_fraction(rendered: &str) -> &str {
    if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered
    }
}

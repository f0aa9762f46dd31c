//! Display formatting commands

use anyhow::{Context, Result};
use steady_core::config;
use steady_core::format::{format_date_time, format_date_time_str, format_file_size, format_time_interval};

/// Print a byte count as a human-readable size
pub async fn run_size(bytes: u64, decimals: Option<u32>) -> Result<()> {
    let decimals = match decimals {
        Some(d) => d,
        None => config::load()?.format.size_decimals,
    };
    println!("{}", format_file_size(bytes, decimals));
    Ok(())
}

/// Reformat a date-time string
pub async fn run_datetime(input: &str, pattern: Option<String>) -> Result<()> {
    let pattern = match pattern {
        Some(p) => p,
        None => config::load()?.format.datetime_pattern,
    };

    let text = if input.trim().eq_ignore_ascii_case("now") {
        format_date_time(&chrono::Local::now(), &pattern)
    } else {
        format_date_time_str(input, &pattern)
    };
    println!("{}", text);
    Ok(())
}

/// Print a number of seconds as a human-readable interval
pub async fn run_interval(seconds: f64) -> Result<()> {
    let text = format_time_interval(seconds).context("Cannot format interval")?;
    println!("{}", text);
    Ok(())
}

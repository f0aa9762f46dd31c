//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::time::Duration;

/// One step of a guard replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardStep {
    Input(String),
    Submit(String),
    Unload,
}

/// Parse "<form>:input", "<form>:submit" or "unload"
pub fn parse_guard_step(step: &str) -> Result<GuardStep> {
    let step = step.trim();
    if step.eq_ignore_ascii_case("unload") {
        return Ok(GuardStep::Unload);
    }

    let (form, event) = step
        .rsplit_once(':')
        .with_context(|| format!("Invalid step '{}': expected <form>:input, <form>:submit or unload", step))?;

    if form.is_empty() {
        anyhow::bail!("Invalid step '{}': form name is empty", step);
    }

    match event {
        "input" => Ok(GuardStep::Input(form.to_string())),
        "submit" => Ok(GuardStep::Submit(form.to_string())),
        other => anyhow::bail!("Invalid step '{}': unknown event '{}'", step, other),
    }
}

/// Convert call times to durations, rejecting out-of-order timelines
pub fn parse_timeline(at_ms: &[u64]) -> Result<Vec<Duration>> {
    if at_ms.is_empty() {
        anyhow::bail!("Timeline is empty");
    }
    if let Some(pair) = at_ms.windows(2).find(|pair| pair[1] < pair[0]) {
        anyhow::bail!(
            "Timeline must be non-decreasing: {}ms comes after {}ms",
            pair[1],
            pair[0]
        );
    }
    Ok(at_ms.iter().map(|&ms| Duration::from_millis(ms)).collect())
}

/// Milliseconds as a display integer
pub fn as_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

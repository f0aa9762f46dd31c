//! TOML configuration
//!
//! Location: `$STEADY_CONFIG` if set, otherwise `<config dir>/steady/config.toml`.
//! A missing file means defaults.

use crate::error::{Error, Result};
use crate::scheduler::millis;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "STEADY_CONFIG";

/// Every key accepted by [`SteadyConfig::get`] and [`SteadyConfig::set`]
pub const KEYS: &[&str] = &[
    "ratelimit.debounce_ms",
    "ratelimit.throttle_ms",
    "guard.marker",
    "guard.warning_message",
    "format.datetime_pattern",
    "format.size_decimals",
];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyConfig {
    pub ratelimit: RateLimitConfig,
    pub guard: GuardConfig,
    pub format: FormatConfig,
}

/// Default timings for the rate limiters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Debounce quiet period (1-60000)
    pub debounce_ms: u64,
    /// Throttle cooldown (1-60000)
    pub throttle_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            throttle_ms: 1000,
        }
    }
}

impl RateLimitConfig {
    pub fn debounce_wait(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn throttle_limit(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Unsaved-changes guard settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Forms carrying this marker are guarded
    pub marker: String,
    /// Message handed to the host's confirmation prompt
    pub warning_message: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            marker: "protect-form".to_string(),
            warning_message: "You have unsaved changes. Are you sure you want to leave?"
                .to_string(),
        }
    }
}

/// Display formatting defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub datetime_pattern: String,
    /// Decimal places for file sizes (0-10)
    pub size_decimals: u32,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            datetime_pattern: crate::format::DEFAULT_DATETIME_PATTERN.to_string(),
            size_decimals: 2,
        }
    }
}

impl SteadyConfig {
    /// Check every value is within its allowed range
    pub fn validate(&self) -> Result<()> {
        check_range("ratelimit.debounce_ms", self.ratelimit.debounce_ms, 1, 60_000)?;
        check_range("ratelimit.throttle_ms", self.ratelimit.throttle_ms, 1, 60_000)?;
        check_range("format.size_decimals", self.format.size_decimals as u64, 0, 10)?;

        if self.guard.marker.trim().is_empty() {
            return Err(Error::Config("guard.marker must not be empty".to_string()));
        }
        if self.guard.warning_message.trim().is_empty() {
            return Err(Error::Config(
                "guard.warning_message must not be empty".to_string(),
            ));
        }
        if self.format.datetime_pattern.is_empty() {
            return Err(Error::Config(
                "format.datetime_pattern must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Read a single value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "ratelimit.debounce_ms" => self.ratelimit.debounce_ms.to_string(),
            "ratelimit.throttle_ms" => self.ratelimit.throttle_ms.to_string(),
            "guard.marker" => self.guard.marker.clone(),
            "guard.warning_message" => self.guard.warning_message.clone(),
            "format.datetime_pattern" => self.format.datetime_pattern.clone(),
            "format.size_decimals" => self.format.size_decimals.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a single value by dotted key, then validate
    ///
    /// On failure the configuration is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();

        match key {
            "ratelimit.debounce_ms" => next.ratelimit.debounce_ms = parse_millis(key, value)?,
            "ratelimit.throttle_ms" => next.ratelimit.throttle_ms = parse_millis(key, value)?,
            "guard.marker" => next.guard.marker = value.to_string(),
            "guard.warning_message" => next.guard.warning_message = value.to_string(),
            "format.datetime_pattern" => next.format.datetime_pattern = value.to_string(),
            "format.size_decimals" => {
                next.format.size_decimals = value.trim().parse().map_err(|_| {
                    Error::Config(format!("{}: '{}' is not a non-negative integer", key, value))
                })?
            }
            _ => return Err(unknown_key(key)),
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Parse from TOML text and validate
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SteadyConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Resolve the config file path
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("steady").join("config.toml"))
}

/// Load from the default location
pub fn load() -> Result<SteadyConfig> {
    match config_file_path() {
        Some(path) => load_from(&path),
        None => {
            warn!("No config directory on this platform, using defaults");
            Ok(SteadyConfig::default())
        }
    }
}

/// Load from a specific file; a missing file yields defaults
pub fn load_from(path: &Path) -> Result<SteadyConfig> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(SteadyConfig::default());
    }
    let text = std::fs::read_to_string(path)?;
    SteadyConfig::from_toml(&text)
}

/// Save to the default location
pub fn save(config: &SteadyConfig) -> Result<()> {
    let path = config_file_path()
        .ok_or_else(|| Error::Config("could not determine config file path".to_string()))?;
    save_to(config, &path)
}

/// Validate then write to a specific file, creating parent directories
pub fn save_to(config: &SteadyConfig, path: &Path) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config.to_toml()?)?;
    debug!("Wrote config to {}", path.display());
    Ok(())
}

/// Write the defaults if no config file exists yet
///
/// Returns the path and whether a file was created.
pub fn init_if_missing() -> Result<(PathBuf, bool)> {
    let path = config_file_path()
        .ok_or_else(|| Error::Config("could not determine config file path".to_string()))?;
    if path.exists() {
        return Ok((path, false));
    }
    save_to(&SteadyConfig::default(), &path)?;
    Ok((path, true))
}

/// Commented example configuration
pub fn example_config() -> String {
    let defaults = SteadyConfig::default();
    format!(
        r#"# steady configuration

[ratelimit]
# Quiet period before a debounced action runs (1-60000 ms)
debounce_ms = {}
# Cooldown after a throttled action runs (1-60000 ms)
throttle_ms = {}

[guard]
# Forms carrying this marker are guarded against unsaved-change loss
marker = "{}"
warning_message = "{}"

[format]
# Tokens: YYYY MM DD HH mm ss
datetime_pattern = "{}"
# Decimal places for file sizes (0-10)
size_decimals = {}
"#,
        defaults.ratelimit.debounce_ms,
        defaults.ratelimit.throttle_ms,
        defaults.guard.marker,
        defaults.guard.warning_message,
        defaults.format.datetime_pattern,
        defaults.format.size_decimals,
    )
}

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} = {} is outside the valid range {}-{}",
            key, value, min, max
        )));
    }
    Ok(())
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    let ms: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{}: '{}' is not a number", key, value)))?;
    if ms.fract() != 0.0 {
        return Err(Error::Config(format!("{}: '{}' is not a whole number of milliseconds", key, value)));
    }
    u64::try_from(millis(ms)?.as_millis())
        .map_err(|_| Error::Config(format!("{}: '{}' is too large", key, value)))
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown config key '{}' (known keys: {})",
        key,
        KEYS.join(", ")
    ))
}

//! Configuration management command
//!
//! Provides CLI interface to view and edit the steady configuration.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use steady_core::config::{self, KEYS};

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = config::load()?;
    let config_path = config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "Steady Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[ratelimit]".yellow());
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        config.ratelimit.debounce_ms,
        format!("({:?})", config.ratelimit.debounce_wait()).dimmed()
    );
    println!(
        "  {} = {} {}",
        "throttle_ms".cyan(),
        config.ratelimit.throttle_ms,
        format!("({:?})", config.ratelimit.throttle_limit()).dimmed()
    );

    println!("\n{}", "[guard]".yellow());
    println!("  {} = {:?}", "marker".cyan(), config.guard.marker);
    println!("  {} = {:?}", "warning_message".cyan(), config.guard.warning_message);

    println!("\n{}", "[format]".yellow());
    println!("  {} = {:?}", "datetime_pattern".cyan(), config.format.datetime_pattern);
    println!("  {} = {}", "size_decimals".cyan(), config.format.size_decimals);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  debounce_ms: 1-60,000");
    println!("  throttle_ms: 1-60,000");
    println!("  size_decimals: 0-10");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = config::load()?;
    let value = config
        .get(key)
        .with_context(|| format!("Use one of: {}", KEYS.join(", ")))?;

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = config::load()?;

    config
        .set(key, value)
        .context("Invalid configuration value")?;

    config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    if create {
        let (config_path, created) = config::init_if_missing()?;
        if created {
            println!("{} Created config file at: {}", "✓".green(), config_path.display());
        } else {
            println!("{}", config_path.display());
        }
        return Ok(());
    }

    let config_path = config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", config_path.display());
    if !config_path.exists() {
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}

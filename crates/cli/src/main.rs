//! Steady CLI - steady command

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod util;

/// Steady - debounce, throttle, unsaved-change guarding and display formatting
#[derive(Parser)]
#[command(name = "steady")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format values for display
    #[command(subcommand)]
    Fmt(FmtCommands),
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Replay event timelines through the rate limiters and the form guard
    #[command(subcommand)]
    Simulate(SimulateCommands),
}

#[derive(Subcommand)]
enum FmtCommands {
    /// Human-readable file size
    Size {
        /// Size in bytes
        bytes: u64,
        /// Decimal places (default: format.size_decimals)
        #[arg(short, long)]
        decimals: Option<u32>,
    },
    /// Reformat a date-time ("now" for the current local time)
    Datetime {
        /// RFC 3339, "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DD" or "now"
        input: String,
        /// Token pattern (default: format.datetime_pattern)
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Human-readable time interval
    Interval {
        /// Number of seconds
        #[arg(allow_hyphen_values = true)]
        seconds: f64,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one value
    Get {
        /// Dotted key, e.g. ratelimit.debounce_ms
        key: String,
    },
    /// Change one value
    Set {
        key: String,
        value: String,
    },
    /// Show the config file path
    Path {
        /// Write the defaults if the file does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print a commented example configuration
    Example,
}

#[derive(Subcommand)]
enum SimulateCommands {
    /// Debounce a timeline of calls
    Debounce {
        /// Call times in milliseconds, comma separated and non-decreasing
        #[arg(long, value_delimiter = ',', required = true)]
        at: Vec<u64>,
        /// Quiet period (default: ratelimit.debounce_ms)
        #[arg(long)]
        wait_ms: Option<u64>,
        /// Use the real clock instead of virtual time
        #[arg(long)]
        realtime: bool,
        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
    /// Throttle a timeline of calls
    Throttle {
        /// Call times in milliseconds, comma separated and non-decreasing
        #[arg(long, value_delimiter = ',', required = true)]
        at: Vec<u64>,
        /// Cooldown (default: ratelimit.throttle_ms)
        #[arg(long)]
        limit_ms: Option<u64>,
        /// Use the real clock instead of virtual time
        #[arg(long)]
        realtime: bool,
        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
    /// Replay form events: "<form>:input", "<form>:submit" or "unload"
    Guard {
        /// Steps in order
        #[arg(required = true)]
        steps: Vec<String>,
        /// Forms that do not carry the guard marker
        #[arg(long)]
        unguarded: Vec<String>,
        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (RUST_LOG overrides, warnings by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fmt(fmt_cmd) => match fmt_cmd {
            FmtCommands::Size { bytes, decimals } => cmd::fmt::run_size(bytes, decimals).await,
            FmtCommands::Datetime { input, pattern } => {
                cmd::fmt::run_datetime(&input, pattern).await
            }
            FmtCommands::Interval { seconds } => cmd::fmt::run_interval(seconds).await,
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
        Commands::Simulate(sim_cmd) => match sim_cmd {
            SimulateCommands::Debounce { at, wait_ms, realtime, json } => {
                cmd::simulate::run_debounce(&at, wait_ms, realtime, json).await
            }
            SimulateCommands::Throttle { at, limit_ms, realtime, json } => {
                cmd::simulate::run_throttle(&at, limit_ms, realtime, json).await
            }
            SimulateCommands::Guard { steps, unguarded, json } => {
                cmd::simulate::run_guard(&steps, &unguarded, json).await
            }
        },
    }
}

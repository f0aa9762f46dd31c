//! Steady Core - Shared foundation for the steady crates
//!
//! This crate provides:
//! - Explicit timer scheduling (virtual-time and tokio-backed)
//! - The common error type
//! - TOML configuration
//! - Display formatting for dates, sizes and time intervals

pub mod config;
pub mod error;
pub mod format;
pub mod scheduler;

// Re-export main types for convenience
pub use config::{FormatConfig, GuardConfig, RateLimitConfig, SteadyConfig};
pub use error::{Error, Result};
pub use scheduler::{millis, ManualScheduler, Scheduler, Task, TimerHandle, TokioScheduler};

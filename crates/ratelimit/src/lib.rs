//! Rate limiting for rapid trigger streams
//!
//! This crate provides two wrappers around a caller-supplied action:
//! - [`debounce`]: run once a quiet period follows the last trigger
//! - [`throttle`]: run on the leading trigger, drop the rest of the cooldown
//!
//! Both take an explicit [`Scheduler`](steady_core::Scheduler); the wrapper
//! owns its timer handle and cancels it when the last clone is dropped.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use steady_core::ManualScheduler;
//! use steady_ratelimit::debounce;
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let search = debounce(scheduler.clone(), Duration::from_millis(300), |query: String| {
//!     println!("searching for {}", query);
//! })
//! .unwrap();
//!
//! search.call("r".to_string());
//! search.call("ru".to_string());
//! search.call("rust".to_string());
//! scheduler.advance(Duration::from_millis(300)); // prints once, for "rust"
//! ```

pub mod debounce;
pub mod throttle;

pub use debounce::{debounce, Debounced};
pub use throttle::{throttle, Throttled};

/// Result type for rate limiter construction
pub type Result<T> = steady_core::Result<T>;

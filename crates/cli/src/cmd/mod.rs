//! CLI command implementations

pub mod config;
pub mod fmt;
pub mod simulate;

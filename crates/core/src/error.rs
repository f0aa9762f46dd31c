//! Error type shared by the steady library crates

use std::io;
use thiserror::Error;

/// Common result type used throughout steady
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by steady library code
#[derive(Debug, Error)]
pub enum Error {
    /// Caller passed an argument the operation cannot work with
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Configuration value out of range or unknown key
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

//! Unified error type for calltrace.
//!
//! Errors of the traced operations themselves never appear here: they are
//! returned to the caller unchanged. This type only covers the tracer's own
//! setup and export paths.

use thiserror::Error;

/// All calltrace errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value was malformed or out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// The background sweeper could not be started
    #[error("sweeper error: {0}")]
    Sweeper(#[source] std::io::Error),

    /// Snapshot export failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for calltrace operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

// Convert from internal core errors
impl From<calltrace_core::Error> for Error {
    fn from(e: calltrace_core::Error) -> Self {
        use calltrace_core::Error as CoreError;
        match e {
            CoreError::Spawn(io_err) => Error::Sweeper(io_err),
            other => Error::Config(other.to_string()),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

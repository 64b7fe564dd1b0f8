//! Error types for calltrace-core
//!
//! Configuration problems are reported through [`Error`] by the parsing
//! helpers, but the recorder never fails because of them: a rejected value
//! is logged and the previous value is kept.

use thiserror::Error;

/// Errors raised while parsing settings or starting background work
#[derive(Debug, Error)]
pub enum Error {
    /// A setting value could not be parsed
    #[error("invalid value {value:?} for setting `{key}`: {reason}")]
    InvalidSetting {
        /// Setting key
        key: String,
        /// Raw value as supplied
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A numeric setting parsed but lies outside its accepted range
    #[error("setting `{key}` out of range: {value} (expected {expected})")]
    OutOfRange {
        /// Setting key
        key: &'static str,
        /// Supplied value
        value: i64,
        /// Human-readable accepted range
        expected: &'static str,
    },

    /// The key is not a recognised setting
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),

    /// `exec-alert-action` named a sink that does not exist
    #[error("unknown alert action `{0}` (expected `none` or `log`)")]
    UnknownAlertAction(String),

    /// The background sweeper thread could not be started
    #[error("failed to spawn sweeper thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for calltrace-core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from a configuration value
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::InvalidSetting { .. }
                | Error::OutOfRange { .. }
                | Error::UnknownSetting(_)
                | Error::UnknownAlertAction(_)
        )
    }
}

//! Recorder configuration
//!
//! [`TraceConfig`] carries raw, possibly invalid option values as supplied by
//! code, environment variables, or key/value settings. [`TraceConfig::resolve`]
//! validates them against a base [`TraceSettings`]: any rejected value is
//! logged and the base value is kept.
//!
//! ## Settings keys
//!
//! | Key | Field | Default |
//! |-----|-------|---------|
//! | `trace-enabled` | `trace_enabled` | `true` |
//! | `sql-show` | `show_sql` | `false` |
//! | `trace-size` | `max_entries` | `1000` (accepted `1..=1000`) |
//! | `trace-timeout` | `entry_timeout_ms` | `180000` (must be `> 0`) |
//! | `exec-alert-time` | `alert_threshold_ms` | `6000` (must be `> 0`) |
//! | `exec-alert-action` | `alert_sink` | `none` |

use crate::alert::{alert_sink_for_action, AlertSink, NoopAlertSink};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Default capacity of the recorder
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
/// Upper bound accepted for `max_entries`
pub const MAX_ENTRIES_LIMIT: usize = 1000;
/// Default age after which entries are swept (3 minutes)
pub const DEFAULT_ENTRY_TIMEOUT_MS: u64 = 180_000;
/// Default execution time that raises an alert (6 seconds)
pub const DEFAULT_ALERT_THRESHOLD_MS: u64 = 6_000;

/// Environment variable prefix used by [`TraceConfig::from_env`]
pub const ENV_PREFIX: &str = "CALLTRACE_";

/// Recognised setting keys
pub mod keys {
    /// Log every traced operation
    pub const TRACE_ENABLED: &str = "trace-enabled";
    /// Verbose completion logging
    pub const SQL_SHOW: &str = "sql-show";
    /// Recorder capacity
    pub const TRACE_SIZE: &str = "trace-size";
    /// Entry timeout in milliseconds
    pub const TRACE_TIMEOUT: &str = "trace-timeout";
    /// Alert threshold in milliseconds
    pub const EXEC_ALERT_TIME: &str = "exec-alert-time";
    /// Built-in alert sink name
    pub const EXEC_ALERT_ACTION: &str = "exec-alert-action";

    /// All keys, in documentation order
    pub const ALL: [&str; 6] = [
        TRACE_ENABLED,
        SQL_SHOW,
        TRACE_SIZE,
        TRACE_TIMEOUT,
        EXEC_ALERT_TIME,
        EXEC_ALERT_ACTION,
    ];
}

/// Validated, immutable recorder settings
#[derive(Clone)]
pub struct TraceSettings {
    /// Log every traced operation
    pub trace_enabled: bool,
    /// Verbose completion logging
    pub show_sql: bool,
    /// Recorder capacity
    pub max_entries: usize,
    /// Entries older than this are removed by the sweeper
    pub entry_timeout_ms: u64,
    /// Executions at or above this duration are alert-flagged
    pub alert_threshold_ms: u64,
    /// Receiver of alert batches
    pub alert_sink: Arc<dyn AlertSink>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            trace_enabled: true,
            show_sql: false,
            max_entries: DEFAULT_MAX_ENTRIES,
            entry_timeout_ms: DEFAULT_ENTRY_TIMEOUT_MS,
            alert_threshold_ms: DEFAULT_ALERT_THRESHOLD_MS,
            alert_sink: Arc::new(NoopAlertSink),
        }
    }
}

impl fmt::Debug for TraceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSettings")
            .field("trace_enabled", &self.trace_enabled)
            .field("show_sql", &self.show_sql)
            .field("max_entries", &self.max_entries)
            .field("entry_timeout_ms", &self.entry_timeout_ms)
            .field("alert_threshold_ms", &self.alert_threshold_ms)
            .field("alert_sink", &self.alert_sink.name())
            .finish()
    }
}

/// Raw recorder options
///
/// Unset fields keep the base value when resolved.
///
/// # Example
///
/// ```ignore
/// let config = TraceConfig::new()
///     .max_entries(200)
///     .alert_threshold_ms(500)
///     .alert_sink(Arc::new(LogAlertSink));
/// ```
#[derive(Clone, Default)]
pub struct TraceConfig {
    /// Log every traced operation
    pub trace_enabled: Option<bool>,
    /// Verbose completion logging
    pub show_sql: Option<bool>,
    /// Requested capacity, validated on resolve
    pub max_entries: Option<i64>,
    /// Requested entry timeout, validated on resolve
    pub entry_timeout_ms: Option<i64>,
    /// Requested alert threshold, validated on resolve
    pub alert_threshold_ms: Option<i64>,
    /// Replacement alert sink
    pub alert_sink: Option<Arc<dyn AlertSink>>,
}

impl fmt::Debug for TraceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceConfig")
            .field("trace_enabled", &self.trace_enabled)
            .field("show_sql", &self.show_sql)
            .field("max_entries", &self.max_entries)
            .field("entry_timeout_ms", &self.entry_timeout_ms)
            .field("alert_threshold_ms", &self.alert_threshold_ms)
            .field("alert_sink", &self.alert_sink.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl TraceConfig {
    /// Empty configuration (every field keeps its default)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `trace_enabled`
    pub fn trace_enabled(mut self, enabled: bool) -> Self {
        self.trace_enabled = Some(enabled);
        self
    }

    /// Set `show_sql`
    pub fn show_sql(mut self, show: bool) -> Self {
        self.show_sql = Some(show);
        self
    }

    /// Request a capacity
    pub fn max_entries(mut self, max: i64) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Request an entry timeout
    pub fn entry_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.entry_timeout_ms = Some(timeout_ms);
        self
    }

    /// Request an alert threshold
    pub fn alert_threshold_ms(mut self, threshold_ms: i64) -> Self {
        self.alert_threshold_ms = Some(threshold_ms);
        self
    }

    /// Replace the alert sink
    pub fn alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }

    /// Build a configuration from key/value settings
    ///
    /// Unknown keys and unparsable values are logged and skipped.
    pub fn from_settings<I, K, V>(settings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::new();
        for (key, value) in settings {
            if let Err(e) = config.apply_setting(key.as_ref(), value.as_ref()) {
                tracing::warn!(error = %e, "ignoring trace setting");
            }
        }
        config
    }

    /// Build a configuration from `CALLTRACE_*` environment variables
    ///
    /// `trace-size` is read from `CALLTRACE_TRACE_SIZE`, and so on.
    pub fn from_env() -> Self {
        let settings = keys::ALL.iter().filter_map(|key| {
            std::env::var(env_var_name(key))
                .ok()
                .map(|value| (*key, value))
        });
        Self::from_settings(settings)
    }

    /// Apply one setting
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim() {
            keys::TRACE_ENABLED => {
                self.trace_enabled = Some(parse_bool(keys::TRACE_ENABLED, value)?)
            }
            keys::SQL_SHOW => self.show_sql = Some(parse_bool(keys::SQL_SHOW, value)?),
            keys::TRACE_SIZE => self.max_entries = Some(parse_int(keys::TRACE_SIZE, value)?),
            keys::TRACE_TIMEOUT => {
                self.entry_timeout_ms = Some(parse_int(keys::TRACE_TIMEOUT, value)?)
            }
            keys::EXEC_ALERT_TIME => {
                self.alert_threshold_ms = Some(parse_int(keys::EXEC_ALERT_TIME, value)?)
            }
            keys::EXEC_ALERT_ACTION => self.alert_sink = Some(alert_sink_for_action(value)?),
            other => return Err(Error::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    /// Validate against `base`, keeping base values for anything rejected
    pub fn resolve(self, base: &TraceSettings) -> TraceSettings {
        let mut settings = base.clone();
        if let Some(enabled) = self.trace_enabled {
            settings.trace_enabled = enabled;
        }
        if let Some(show) = self.show_sql {
            settings.show_sql = show;
        }
        if let Some(max) = self.max_entries {
            match validate_max_entries(max) {
                Ok(max) => settings.max_entries = max,
                Err(e) => reject(&e, settings.max_entries),
            }
        }
        if let Some(timeout) = self.entry_timeout_ms {
            match validate_positive(keys::TRACE_TIMEOUT, timeout) {
                Ok(timeout) => settings.entry_timeout_ms = timeout,
                Err(e) => reject(&e, settings.entry_timeout_ms),
            }
        }
        if let Some(threshold) = self.alert_threshold_ms {
            match validate_positive(keys::EXEC_ALERT_TIME, threshold) {
                Ok(threshold) => settings.alert_threshold_ms = threshold,
                Err(e) => reject(&e, settings.alert_threshold_ms),
            }
        }
        if let Some(sink) = self.alert_sink {
            settings.alert_sink = sink;
        }
        settings
    }
}

/// Environment variable consulted for a setting key
pub fn env_var_name(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.replace('-', "_").to_ascii_uppercase())
}

/// Check a requested capacity
pub fn validate_max_entries(max: i64) -> Result<usize> {
    match usize::try_from(max) {
        Ok(max) if (1..=MAX_ENTRIES_LIMIT).contains(&max) => Ok(max),
        _ => Err(Error::OutOfRange {
            key: keys::TRACE_SIZE,
            value: max,
            expected: "1..=1000",
        }),
    }
}

fn validate_positive(key: &'static str, value: i64) -> Result<u64> {
    match u64::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::OutOfRange {
            key,
            value,
            expected: "> 0",
        }),
    }
}

fn reject<T: fmt::Display>(error: &Error, kept: T) {
    tracing::warn!(error = %error, kept = %kept, "trace setting rejected, keeping current value");
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|e| Error::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

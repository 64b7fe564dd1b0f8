//! Alert sinks
//!
//! The sweeper hands every batch of slow entries to an [`AlertSink`]. A batch
//! is never empty. Sinks run on the sweeper thread, so a slow sink delays the
//! next sweep but never blocks callers.

use crate::entry::TraceEntry;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Receiver of slow-execution alerts
pub trait AlertSink: Send + Sync {
    /// Handle one batch of entries whose `time_alert` flag is set
    fn alert(&self, entries: &[TraceEntry]);

    /// Short name used in logs and `Debug` output
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> AlertSink for F
where
    F: Fn(&[TraceEntry]) + Send + Sync,
{
    fn alert(&self, entries: &[TraceEntry]) {
        self(entries)
    }
}

/// Sink that drops every batch
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlertSink;

impl AlertSink for NoopAlertSink {
    fn alert(&self, _entries: &[TraceEntry]) {}

    fn name(&self) -> &str {
        "none"
    }
}

/// Sink that emits one warning per alerted entry
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, entries: &[TraceEntry]) {
        for entry in entries {
            tracing::warn!(
                id = %entry.id,
                method = %entry.method_name,
                operation = %entry.operation_text,
                elapsed_ms = entry.elapsed_ms,
                "slow execution"
            );
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Resolve an `exec-alert-action` value to a built-in sink
pub fn alert_sink_for_action(action: &str) -> Result<Arc<dyn AlertSink>> {
    match action.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "noop" => Ok(Arc::new(NoopAlertSink)),
        "log" | "warn" => Ok(Arc::new(LogAlertSink)),
        _ => Err(Error::UnknownAlertAction(action.to_string())),
    }
}

//! Trace entry types
//!
//! A [`TraceEntry`] is the record of one intercepted execution. It is
//! written by a single interceptor while the call is in flight and is
//! read-only once [`TraceEntry::complete`] has run.
//!
//! ## Lifecycle
//!
//! ```text
//! TraceEntry::new()        operation text + method name
//!        │
//! recorder insert          id + trace_start_time assigned (never changed again)
//!        │
//! mark_exec_start()        exec_start_time / exec_start_time_ms
//!        │
//! complete()               success, failure_cause, exec_end_time, elapsed_ms, time_alert
//!        │
//! evicted                  capacity or timeout
//! ```

use crate::time::format_timestamp;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an entry inside the recorder
///
/// Identifiers are allocated from a monotonic counter, so they also
/// break ties between entries inserted within the same millisecond.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EntryId(u64);

impl EntryId {
    /// Id carried by entries that have not been inserted yet
    pub const UNASSIGNED: EntryId = EntryId(0);

    /// Wrap a raw id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether the recorder has assigned this id
    pub const fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// Record of one intercepted execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Recorder-assigned identifier
    pub id: EntryId,
    /// The statement or operation description
    pub operation_text: String,
    /// Name of the invoked operation
    pub method_name: String,
    /// When the entry entered the recorder (ms since epoch)
    pub trace_start_time: i64,
    /// Formatted execution start
    pub exec_start_time: Option<String>,
    /// Formatted execution end
    pub exec_end_time: Option<String>,
    /// Execution start (ms since epoch)
    pub exec_start_time_ms: i64,
    /// Execution time; only meaningful when `completed` is set
    pub elapsed_ms: u64,
    /// Whether the wrapped operation returned without error
    pub success: bool,
    /// Description of the root failure, if the operation failed
    pub failure_cause: Option<String>,
    /// Set when `elapsed_ms` reached the alert threshold
    pub time_alert: bool,
    /// Whether the wrapped operation has finished
    pub completed: bool,
}

impl TraceEntry {
    /// Create an entry for an operation about to run
    pub fn new(operation_text: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            id: EntryId::UNASSIGNED,
            operation_text: operation_text.into(),
            method_name: method_name.into(),
            trace_start_time: 0,
            exec_start_time: None,
            exec_end_time: None,
            exec_start_time_ms: 0,
            elapsed_ms: 0,
            success: false,
            failure_cause: None,
            time_alert: false,
            completed: false,
        }
    }

    /// Record the moment execution begins
    pub fn mark_exec_start(&mut self, at: DateTime<Local>) {
        self.exec_start_time = Some(format_timestamp(&at));
        self.exec_start_time_ms = at.timestamp_millis();
    }

    /// Record the outcome of the execution
    ///
    /// `outcome` carries the failure description on error. The alert flag
    /// is derived here: `time_alert` is set iff `elapsed_ms >= alert_threshold_ms`.
    pub fn complete(
        &mut self,
        outcome: Result<(), String>,
        at: DateTime<Local>,
        elapsed_ms: u64,
        alert_threshold_ms: u64,
    ) {
        match outcome {
            Ok(()) => {
                self.success = true;
                self.failure_cause = None;
            }
            Err(cause) => {
                self.success = false;
                self.failure_cause = Some(cause);
            }
        }
        self.exec_end_time = Some(format_timestamp(&at));
        self.elapsed_ms = elapsed_ms;
        self.time_alert = elapsed_ms >= alert_threshold_ms;
        self.completed = true;
    }

    /// Elapsed time, or `None` while the call is still in flight
    pub fn elapsed(&self) -> Option<u64> {
        self.completed.then_some(self.elapsed_ms)
    }

    /// Age of the entry at `now_ms`
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.trace_start_time)
    }

    /// Whether the entry is older than `timeout_ms` at `now_ms`
    pub fn is_expired(&self, now_ms: i64, timeout_ms: u64) -> bool {
        let timeout = i64::try_from(timeout_ms).unwrap_or(i64::MAX);
        self.age_ms(now_ms) > timeout
    }

    /// Display ordering key: start time, then id
    pub fn order_key(&self) -> (i64, EntryId) {
        (self.trace_start_time, self.id)
    }
}

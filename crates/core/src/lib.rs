//! Core types for calltrace
//!
//! This crate defines the value types shared by the recorder and its
//! front-ends:
//! - TraceEntry: one recorded execution of an intercepted operation
//! - TraceConfig / TraceSettings: raw and validated recorder options
//! - AlertSink: pluggable receiver of slow-execution alerts
//! - Error: configuration and runtime errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alert;
pub mod config;
pub mod entry;
pub mod error;
pub mod time;

pub use alert::{alert_sink_for_action, AlertSink, LogAlertSink, NoopAlertSink};
pub use config::{keys, TraceConfig, TraceSettings};
pub use entry::{EntryId, TraceEntry};
pub use error::{Error, Result};

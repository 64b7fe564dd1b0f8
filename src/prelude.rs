//! Convenient imports for calltrace.
//!
//! ```ignore
//! use calltrace::prelude::*;
//!
//! let tracer = CallTracer::new(TraceConfig::from_env())?;
//! ```

// Main entry point
pub use crate::tracer::{CallTracer, CallTracerBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Configuration
pub use calltrace_core::{AlertSink, LogAlertSink, NoopAlertSink, TraceConfig, TraceSettings};

// Recorded data
pub use calltrace_core::{EntryId, TraceEntry};

// Custom operations
pub use calltrace_recorder::{InvokeError, Operation, SweepSchedule};

// Re-export Arc for alert sinks
pub use std::sync::Arc;

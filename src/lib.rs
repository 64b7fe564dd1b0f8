//! # Calltrace
//!
//! In-memory call-trace recorder.
//!
//! Calltrace wraps executions of an underlying operation (typically a
//! database statement), records timing and outcome for each one, bounds
//! memory with a capacity limit, evicts stale records with a background
//! sweep, and raises alerts for executions that exceed a latency threshold.
//!
//! ## Quick Start
//!
//! ```ignore
//! use calltrace::prelude::*;
//!
//! let tracer = CallTracer::new(
//!     TraceConfig::new()
//!         .max_entries(500)
//!         .alert_threshold_ms(2_000)
//!         .alert_sink(Arc::new(LogAlertSink)),
//! )?;
//!
//! // Errors from the closure come back unchanged
//! let count = tracer.trace("select count(*) from orders", "execute_query", || db.count())?;
//!
//! // Read what was recorded
//! let json = tracer.snapshot_json()?;
//!
//! tracer.close();
//! ```
//!
//! ## Components
//!
//! - [`CallTracer`] - owns everything below; one per process
//! - [`TraceRecorder`] - bounded store with FIFO capacity eviction
//! - [`CallInterceptor`] - runs an operation once and records it
//! - [`TimeoutSweeper`] - background age-based eviction and alert dispatch
//! - [`AlertSink`] - receiver of slow-execution alerts

#![warn(missing_docs)]

mod error;
mod tracer;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use tracer::{CallTracer, CallTracerBuilder};

// Re-export component crates
pub use calltrace_core::{
    alert_sink_for_action, keys, AlertSink, EntryId, LogAlertSink, NoopAlertSink, TraceConfig,
    TraceEntry, TraceSettings,
};
pub use calltrace_recorder::{
    CallInterceptor, EntryHandle, FnOperation, InvokeError, Operation, SweepReport,
    SweepSchedule, SweeperHandle, TimeoutSweeper, TraceRecorder,
};

//! Recorder layer for calltrace
//!
//! This crate implements the concurrent parts of the tracer:
//! - TraceRecorder: bounded entry arena with FIFO capacity eviction
//! - CallInterceptor: runs an operation once and records its outcome
//! - TimeoutSweeper: periodic age-based eviction and alert dispatch

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod interceptor;
pub mod recorder;
pub mod sweeper;

pub use interceptor::{CallInterceptor, FnOperation, InvokeError, Operation};
pub use recorder::{EntryHandle, TraceRecorder};
pub use sweeper::{SweepReport, SweepSchedule, SweeperHandle, TimeoutSweeper};

//! Main entry point for calltrace.
//!
//! This module provides the `CallTracer` struct, which owns the recorder,
//! the interceptor writing to it, and the background sweeper.

use crate::error::Result;
use calltrace_core::{TraceConfig, TraceEntry, TraceSettings};
use calltrace_recorder::{
    CallInterceptor, Operation, SweepReport, SweepSchedule, SweeperHandle, TimeoutSweeper,
    TraceRecorder,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The call tracer.
///
/// Create one per process with [`CallTracer::new`] or [`CallTracer::builder`]
/// and share it by reference (or `Arc`) with every call site.
///
/// # Example
///
/// ```ignore
/// use calltrace::prelude::*;
///
/// let tracer = CallTracer::new(TraceConfig::new().alert_threshold_ms(500))?;
///
/// let rows = tracer.trace("select * from users", "execute_query", || conn.query_all())?;
///
/// for entry in tracer.snapshot() {
///     println!("{} took {}ms", entry.operation_text, entry.elapsed_ms);
/// }
///
/// tracer.close();
/// ```
pub struct CallTracer {
    recorder: Arc<TraceRecorder>,
    interceptor: CallInterceptor,
    sweeper: TimeoutSweeper,
    sweeper_handle: Mutex<Option<SweeperHandle>>,
}

impl CallTracer {
    /// Create a tracer with `config` and the default sweep schedule.
    pub fn new(config: TraceConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a builder for tracer configuration.
    pub fn builder() -> CallTracerBuilder {
        CallTracerBuilder::new()
    }

    /// Apply `config` if no configuration has been applied yet.
    ///
    /// Returns `true` if this call took effect.
    pub fn init(&self, config: TraceConfig) -> bool {
        self.recorder.init(config)
    }

    /// Current settings.
    pub fn settings(&self) -> &TraceSettings {
        self.recorder.settings()
    }

    /// Run `op` once and record it.
    pub fn intercept<O: Operation>(&self, op: O) -> std::result::Result<O::Output, O::Error> {
        self.interceptor.intercept(op)
    }

    /// Run a closure once and record it.
    ///
    /// The closure's result, or its error, is returned unchanged.
    pub fn trace<T, E, F>(
        &self,
        operation_text: impl Into<String>,
        method_name: impl Into<String>,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        self.interceptor.trace(operation_text, method_name, f)
    }

    /// Live entries, ascending by start time.
    pub fn snapshot(&self) -> Vec<TraceEntry> {
        self.recorder.snapshot()
    }

    /// Live entries as a JSON array.
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.recorder.size()
    }

    /// Run one sweep pass on the calling thread.
    pub fn sweep_now(&self) -> SweepReport {
        self.sweeper.sweep()
    }

    /// The underlying recorder.
    pub fn recorder(&self) -> &Arc<TraceRecorder> {
        &self.recorder
    }

    /// Whether the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper_handle
            .lock()
            .as_ref()
            .map(SweeperHandle::is_running)
            .unwrap_or(false)
    }

    /// Stop the background sweeper.
    ///
    /// Recorded entries stay readable. Safe to call more than once.
    pub fn close(&self) {
        if let Some(mut handle) = self.sweeper_handle.lock().take() {
            handle.shutdown();
        }
    }
}

impl fmt::Debug for CallTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTracer")
            .field("recorder", &self.recorder)
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

/// Builder for tracer configuration.
///
/// # Example
///
/// ```ignore
/// // Production: settings from the environment, default 1s/3s sweep
/// let tracer = CallTracer::builder()
///     .config(TraceConfig::from_env())
///     .build()?;
///
/// // Tests: no background thread, sweep manually with `sweep_now()`
/// let tracer = CallTracer::builder()
///     .config(TraceConfig::new().max_entries(10))
///     .without_sweeper()
///     .build()?;
/// ```
#[derive(Debug)]
pub struct CallTracerBuilder {
    config: Option<TraceConfig>,
    schedule: SweepSchedule,
    sweeper_enabled: bool,
}

impl CallTracerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: None,
            schedule: SweepSchedule::default(),
            sweeper_enabled: true,
        }
    }

    /// Configuration applied once at build time.
    pub fn config(mut self, config: TraceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Full sweep schedule.
    pub fn schedule(mut self, schedule: SweepSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Delay between sweeps.
    pub fn sweep_period(mut self, period: Duration) -> Self {
        self.schedule.period = period;
        self
    }

    /// Delay before the first sweep.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.schedule.initial_delay = delay;
        self
    }

    /// Do not start the background sweeper.
    pub fn without_sweeper(mut self) -> Self {
        self.sweeper_enabled = false;
        self
    }

    /// Build the tracer, starting the sweeper unless disabled.
    pub fn build(self) -> Result<CallTracer> {
        let recorder = Arc::new(TraceRecorder::new());
        if let Some(config) = self.config {
            recorder.init(config);
        }

        let sweeper = TimeoutSweeper::new(Arc::clone(&recorder));
        let handle = if self.sweeper_enabled {
            Some(sweeper.clone().spawn(self.schedule)?)
        } else {
            None
        };
        tracing::info!(
            settings = ?recorder.settings(),
            sweeping = handle.is_some(),
            "call tracer started"
        );

        Ok(CallTracer {
            interceptor: CallInterceptor::new(Arc::clone(&recorder)),
            recorder,
            sweeper,
            sweeper_handle: Mutex::new(handle),
        })
    }
}

impl Default for CallTracerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

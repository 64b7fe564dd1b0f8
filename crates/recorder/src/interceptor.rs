//! Call interception
//!
//! [`CallInterceptor::intercept`] runs an [`Operation`] exactly once and
//! records one [`TraceEntry`] for it. The operation's result is returned
//! unchanged; on failure the caller sees the operation's own error, with any
//! forwarding-layer wrapper ([`InvokeError::Wrapped`]) stripped.
//!
//! ## Interception Sequence
//!
//! ```text
//! 1. build entry (operation text, method name)
//! 2. insert into recorder (id, trace_start_time; may evict the oldest entry)
//! 3. log operation text if trace_enabled
//! 4. stamp exec start, start the monotonic timer
//! 5. invoke
//! 6. on every exit path, panics included: record outcome, elapsed, alert flag
//! 7. return the result or the unwrapped error
//! ```

use crate::recorder::{EntryHandle, TraceRecorder};
use calltrace_core::TraceEntry;
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Failure of an invoked operation
///
/// `Wrapped` marks an error that passed through one generic forwarding
/// layer; the interceptor records and returns the inner cause either way.
#[derive(Debug)]
pub enum InvokeError<E> {
    /// The operation itself failed
    Failed(E),
    /// A forwarding layer wrapped the operation's failure
    Wrapped(E),
}

impl<E> InvokeError<E> {
    /// The underlying cause
    pub fn cause(&self) -> &E {
        match self {
            InvokeError::Failed(e) | InvokeError::Wrapped(e) => e,
        }
    }

    /// Strip the wrapper
    pub fn into_cause(self) -> E {
        match self {
            InvokeError::Failed(e) | InvokeError::Wrapped(e) => e,
        }
    }

    /// Whether a forwarding layer was involved
    pub fn is_wrapped(&self) -> bool {
        matches!(self, InvokeError::Wrapped(_))
    }
}

impl<E: fmt::Display> fmt::Display for InvokeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::Failed(e) => write!(f, "{}", e),
            InvokeError::Wrapped(e) => write!(f, "invocation failed: {}", e),
        }
    }
}

impl<E> std::error::Error for InvokeError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause())
    }
}

/// An operation that can be traced
pub trait Operation {
    /// Value returned on success
    type Output;
    /// Error observed by the caller
    type Error: fmt::Display;

    /// Statement or operation description
    fn operation_text(&self) -> &str;

    /// Name of the invoked method
    fn method_name(&self) -> &str;

    /// Run the operation
    fn invoke(self) -> Result<Self::Output, InvokeError<Self::Error>>;
}

/// [`Operation`] backed by a closure
pub struct FnOperation<F> {
    operation_text: String,
    method_name: String,
    f: F,
}

impl<F> FnOperation<F> {
    /// Wrap `f` with its description
    pub fn new(operation_text: impl Into<String>, method_name: impl Into<String>, f: F) -> Self {
        Self {
            operation_text: operation_text.into(),
            method_name: method_name.into(),
            f,
        }
    }
}

impl<F, T, E> Operation for FnOperation<F>
where
    F: FnOnce() -> Result<T, E>,
    E: fmt::Display,
{
    type Output = T;
    type Error = E;

    fn operation_text(&self) -> &str {
        &self.operation_text
    }

    fn method_name(&self) -> &str {
        &self.method_name
    }

    fn invoke(self) -> Result<T, InvokeError<E>> {
        (self.f)().map_err(InvokeError::Failed)
    }
}

/// Runs operations and records them in a [`TraceRecorder`]
#[derive(Debug, Clone)]
pub struct CallInterceptor {
    recorder: Arc<TraceRecorder>,
}

impl CallInterceptor {
    /// Create an interceptor writing to `recorder`
    pub fn new(recorder: Arc<TraceRecorder>) -> Self {
        Self { recorder }
    }

    /// The recorder entries are written to
    pub fn recorder(&self) -> &Arc<TraceRecorder> {
        &self.recorder
    }

    /// Run `op` once, recording its outcome
    pub fn intercept<O: Operation>(&self, op: O) -> Result<O::Output, O::Error> {
        let settings = self.recorder.settings();
        let handle = self
            .recorder
            .insert(TraceEntry::new(op.operation_text(), op.method_name()));
        if settings.trace_enabled {
            info!(id = %handle.id(), operation = %op.operation_text(), "begin running");
        }

        handle.cell.write().mark_exec_start(Local::now());
        let mut completion = Completion {
            handle: &handle,
            started: Instant::now(),
            alert_threshold_ms: settings.alert_threshold_ms,
            show_sql: settings.show_sql,
            outcome: None,
        };

        match op.invoke() {
            Ok(output) => {
                completion.outcome = Some(Ok(()));
                Ok(output)
            }
            Err(err) => {
                let cause = err.into_cause();
                completion.outcome = Some(Err(describe(&cause)));
                Err(cause)
            }
        }
    }

    /// Run a closure once, recording its outcome
    pub fn trace<T, E, F>(
        &self,
        operation_text: impl Into<String>,
        method_name: impl Into<String>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        self.intercept(FnOperation::new(operation_text, method_name, f))
    }
}

/// Completes the entry when dropped, so unwinding still records an outcome
struct Completion<'a> {
    handle: &'a EntryHandle,
    started: Instant,
    alert_threshold_ms: u64,
    show_sql: bool,
    outcome: Option<Result<(), String>>,
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err("operation panicked".to_string()));
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut entry = self.handle.cell.write();
        entry.complete(outcome, Local::now(), elapsed_ms, self.alert_threshold_ms);
        let success = entry.success;
        let time_alert = entry.time_alert;
        drop(entry);

        if self.show_sql {
            info!(
                id = %self.handle.id(),
                success,
                elapsed_ms,
                time_alert,
                "finished running"
            );
        }
    }
}

fn describe<E: fmt::Display>(cause: &E) -> String {
    let message = cause.to_string();
    if message.is_empty() {
        std::any::type_name::<E>().to_string()
    } else {
        message
    }
}

//! Timeout sweeper
//!
//! A single background thread that periodically:
//! 1. scans the recorder's live entries,
//! 2. collects every entry whose `time_alert` flag is set,
//! 3. removes every entry older than `entry_timeout_ms`,
//! 4. hands the collected alerts to the configured [`AlertSink`] as one batch.
//!
//! The scan works on a copy of the entry handles taken at the start of the
//! pass, so entries inserted mid-pass are left for the next one. Each removal
//! takes the recorder's write lock for a single map operation only.
//!
//! A panicking pass (for example inside a user-supplied sink) is caught and
//! logged; the thread keeps its schedule.
//!
//! [`AlertSink`]: calltrace_core::AlertSink

use crate::recorder::{EntryCell, TraceRecorder};
use calltrace_core::time::now_millis;
use calltrace_core::{EntryId, Result, TraceEntry};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Name of the sweeper thread
pub const SWEEPER_THREAD_NAME: &str = "calltrace-timeout-scan";

/// When the sweeper runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    /// Delay before the first pass
    pub initial_delay: Duration,
    /// Delay between passes
    pub period: Duration,
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            period: Duration::from_secs(3),
        }
    }
}

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries examined
    pub scanned: usize,
    /// Entries removed for exceeding the timeout
    pub evicted: usize,
    /// Entries delivered to the alert sink
    pub alerted: usize,
}

/// Age-based eviction and alert dispatch
#[derive(Debug, Clone)]
pub struct TimeoutSweeper {
    recorder: Arc<TraceRecorder>,
}

impl TimeoutSweeper {
    /// Create a sweeper for `recorder`
    pub fn new(recorder: Arc<TraceRecorder>) -> Self {
        Self { recorder }
    }

    /// Run one pass at the current time
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(now_millis())
    }

    /// Run one pass as if the clock read `now_ms`
    pub fn sweep_at(&self, now_ms: i64) -> SweepReport {
        self.sweep_scanned(now_ms, self.recorder.scan())
    }

    /// Evict and alert over `live`, the entries scanned when the pass began
    fn sweep_scanned(&self, now_ms: i64, live: Vec<(EntryId, EntryCell)>) -> SweepReport {
        let settings = self.recorder.settings();
        let mut report = SweepReport {
            scanned: live.len(),
            ..SweepReport::default()
        };

        let mut alerts: Vec<TraceEntry> = Vec::new();
        for (id, cell) in live {
            let entry = cell.read();
            let expired = entry.is_expired(now_ms, settings.entry_timeout_ms);
            if entry.time_alert {
                alerts.push(entry.clone());
            }
            drop(entry);

            if expired && self.recorder.remove(id) {
                report.evicted += 1;
            }
        }

        report.alerted = alerts.len();
        if !alerts.is_empty() {
            alerts.sort_by_key(TraceEntry::order_key);
            settings.alert_sink.alert(&alerts);
        }
        report
    }

    /// Start the background thread
    pub fn spawn(self, schedule: SweepSchedule) -> Result<SweeperHandle> {
        let signal = Arc::new(ShutdownSignal::default());
        let thread_signal = Arc::clone(&signal);
        let thread = thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || self.run(schedule, &thread_signal))?;

        debug!(
            initial_delay_ms = schedule.initial_delay.as_millis() as u64,
            period_ms = schedule.period.as_millis() as u64,
            "timeout sweeper started"
        );
        Ok(SweeperHandle {
            signal,
            thread: Some(thread),
        })
    }

    fn run(&self, schedule: SweepSchedule, signal: &ShutdownSignal) {
        if signal.wait(schedule.initial_delay) {
            return;
        }
        loop {
            match panic::catch_unwind(AssertUnwindSafe(|| self.sweep())) {
                Ok(report) => {
                    if report.evicted > 0 || report.alerted > 0 {
                        debug!(
                            scanned = report.scanned,
                            evicted = report.evicted,
                            alerted = report.alerted,
                            "sweep finished"
                        );
                    }
                }
                Err(_) => error!("sweep pass panicked, continuing on next tick"),
            }
            if signal.wait(schedule.period) {
                return;
            }
        }
    }
}

#[derive(Default)]
struct ShutdownSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownSignal {
    /// Wait up to `timeout`; returns `true` once shutdown was requested
    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.cond.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }
}

/// Owner of the running sweeper thread
///
/// Dropping the handle stops the thread and waits for it.
pub struct SweeperHandle {
    signal: Arc<ShutdownSignal>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and join its thread; later calls do nothing
    pub fn shutdown(&mut self) {
        self.signal.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("timeout sweeper thread terminated abnormally");
            }
            debug!("timeout sweeper stopped");
        }
    }

    /// Whether the thread is still owned by this handle
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SweeperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweeperHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

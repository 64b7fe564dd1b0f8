//! Simulated statement workload.

use crate::parse::SimulateArgs;
use calltrace::CallTracer;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Error returned by a simulated statement.
#[derive(Debug)]
pub struct StatementError {
    pub statement: usize,
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated failure of statement {}", self.statement)
    }
}

impl std::error::Error for StatementError {}

/// Counts observed by the callers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Latency of statement `n`, spread over `0..=max_ms`.
pub fn latency_for(n: usize, max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let spread = (n as u64).wrapping_mul(2_654_435_761) % max_ms.saturating_add(1);
    Duration::from_millis(spread)
}

/// Run the workload on `args.threads` threads.
pub fn run(tracer: &Arc<CallTracer>, args: &SimulateArgs) -> WorkloadSummary {
    let handles: Vec<_> = (0..args.threads)
        .map(|t| {
            let tracer = Arc::clone(tracer);
            let calls = args.calls;
            let max_latency_ms = args.max_latency_ms;
            let fail_every = args.fail_every;
            thread::spawn(move || {
                let mut summary = WorkloadSummary::default();
                for i in 0..calls {
                    let n = t * calls + i + 1;
                    let sql = format!("select * from orders where id = {}", n);
                    let result = tracer.trace(sql, "execute_query", || {
                        thread::sleep(latency_for(n, max_latency_ms));
                        if fail_every > 0 && n % fail_every == 0 {
                            Err(StatementError { statement: n })
                        } else {
                            Ok(n)
                        }
                    });
                    match result {
                        Ok(_) => summary.succeeded += 1,
                        Err(_) => summary.failed += 1,
                    }
                }
                summary
            })
        })
        .collect();

    handles
        .into_iter()
        .fold(WorkloadSummary::default(), |acc, handle| match handle.join() {
            Ok(s) => WorkloadSummary {
                succeeded: acc.succeeded + s.succeeded,
                failed: acc.failed + s.failed,
            },
            Err(_) => {
                tracing::error!("workload thread panicked");
                acc
            }
        })
}

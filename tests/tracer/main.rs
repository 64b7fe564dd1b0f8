//! Tracer Integration Tests
//!
//! End-to-end tests for calltrace through the public facade:
//! capacity eviction, timeout sweeps, alerts, interception and concurrency.

mod alerts;
mod concurrency;
mod interception;
mod timeout;

use calltrace::{AlertSink, CallTracer, TimeoutSweeper, TraceConfig, TraceEntry};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Tracer without a background thread; tests sweep with `sweep_now()`
pub fn manual_tracer(config: TraceConfig) -> CallTracer {
    CallTracer::builder()
        .config(config)
        .without_sweeper()
        .build()
        .unwrap()
}

/// Alert sink that keeps every batch it receives
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<Vec<TraceEntry>>>,
}

impl RecordingSink {
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn texts(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .iter()
            .map(|batch| batch.iter().map(|e| e.operation_text.clone()).collect())
            .collect()
    }
}

impl AlertSink for RecordingSink {
    fn alert(&self, entries: &[TraceEntry]) {
        self.batches.lock().push(entries.to_vec());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Run a successful no-op through the tracer
pub fn run_ok(tracer: &CallTracer, text: &str) {
    tracer
        .trace(text, "execute", || -> Result<(), io::Error> { Ok(()) })
        .unwrap();
}

pub fn texts(entries: &[TraceEntry]) -> Vec<String> {
    entries.iter().map(|e| e.operation_text.clone()).collect()
}

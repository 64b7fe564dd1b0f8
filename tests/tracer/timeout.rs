//! Timeout eviction

use crate::*;
use std::time::{Duration, Instant};

#[test]
fn entry_survives_sweep_before_timeout() {
    let tracer = manual_tracer(TraceConfig::new().entry_timeout_ms(1_000));
    let sweeper = TimeoutSweeper::new(Arc::clone(tracer.recorder()));
    tracer.recorder().insert_at(TraceEntry::new("fresh", "m"), 0);

    sweeper.sweep_at(500);
    assert_eq!(texts(&tracer.snapshot()), vec!["fresh"]);
}

#[test]
fn entry_removed_by_sweep_after_timeout() {
    let tracer = manual_tracer(TraceConfig::new().entry_timeout_ms(1_000));
    let sweeper = TimeoutSweeper::new(Arc::clone(tracer.recorder()));
    tracer.recorder().insert_at(TraceEntry::new("stale", "m"), 0);

    let report = sweeper.sweep_at(1_500);
    assert_eq!(report.evicted, 1);
    assert!(tracer.snapshot().is_empty());
    assert_eq!(tracer.size(), 0);
}

#[test]
fn only_expired_entries_are_removed() {
    let tracer = manual_tracer(TraceConfig::new().entry_timeout_ms(1_000));
    let sweeper = TimeoutSweeper::new(Arc::clone(tracer.recorder()));
    let recorder = tracer.recorder();
    recorder.insert_at(TraceEntry::new("old", "m"), 0);
    recorder.insert_at(TraceEntry::new("new", "m"), 900);

    let report = sweeper.sweep_at(1_500);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.evicted, 1);
    assert_eq!(texts(&tracer.snapshot()), vec!["new"]);
}

#[test]
fn sweep_now_uses_wall_clock() {
    let tracer = manual_tracer(TraceConfig::new().entry_timeout_ms(60_000));
    run_ok(&tracer, "recent");

    let report = tracer.sweep_now();
    assert_eq!(report.evicted, 0);
    assert_eq!(tracer.size(), 1);
}

#[test]
fn background_sweeper_removes_expired_entries() {
    let tracer = CallTracer::builder()
        .config(TraceConfig::new().entry_timeout_ms(20))
        .initial_delay(Duration::from_millis(10))
        .sweep_period(Duration::from_millis(10))
        .build()
        .unwrap();
    assert!(tracer.is_sweeping());

    run_ok(&tracer, "short-lived");
    let deadline = Instant::now() + Duration::from_secs(5);
    while tracer.size() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(tracer.size(), 0);

    tracer.close();
    assert!(!tracer.is_sweeping());
    tracer.close();
}

/// Sink that records one extra call into the recorder while a pass runs
#[derive(Default)]
struct InsertingSink {
    recorder: Mutex<std::sync::Weak<calltrace::TraceRecorder>>,
    inserted: Mutex<bool>,
}

impl AlertSink for InsertingSink {
    fn alert(&self, _: &[TraceEntry]) {
        let mut inserted = self.inserted.lock();
        if let (false, Some(recorder)) = (*inserted, self.recorder.lock().upgrade()) {
            recorder.insert_at(TraceEntry::new("mid-pass", "m"), 0);
            *inserted = true;
        }
    }
}

#[test]
fn entry_inserted_during_sweep_survives_until_next_pass() {
    let sink = Arc::new(InsertingSink::default());
    let tracer = manual_tracer(
        TraceConfig::new()
            .entry_timeout_ms(1_000)
            .alert_threshold_ms(1)
            .alert_sink(sink.clone()),
    );
    *sink.recorder.lock() = Arc::downgrade(tracer.recorder());
    let sweeper = TimeoutSweeper::new(Arc::clone(tracer.recorder()));

    tracer
        .trace("slow", "execute", || -> Result<(), io::Error> {
            std::thread::sleep(Duration::from_millis(5));
            Ok(())
        })
        .unwrap();
    let far_future = tracer.snapshot()[0].trace_start_time + 10_000;

    let first = sweeper.sweep_at(far_future);
    assert_eq!(first.evicted, 1);
    assert_eq!(first.alerted, 1);
    assert_eq!(texts(&tracer.snapshot()), vec!["mid-pass"]);

    let second = sweeper.sweep_at(far_future);
    assert_eq!(second.evicted, 1);
    assert_eq!(second.alerted, 0);
    assert_eq!(tracer.size(), 0);
}

//! Alert flagging and dispatch

use crate::*;
use std::thread;
use std::time::Duration;

fn sleep_op(tracer: &CallTracer, text: &str, millis: u64) {
    tracer
        .trace(text, "execute", || -> Result<(), io::Error> {
            thread::sleep(Duration::from_millis(millis));
            Ok(())
        })
        .unwrap();
}

#[test]
fn slow_call_flagged_fast_call_not() {
    let tracer = manual_tracer(TraceConfig::new().alert_threshold_ms(100));
    sleep_op(&tracer, "slow", 150);
    sleep_op(&tracer, "fast", 0);

    let entries = tracer.snapshot();
    let slow = entries.iter().find(|e| e.operation_text == "slow").unwrap();
    let fast = entries.iter().find(|e| e.operation_text == "fast").unwrap();
    assert!(slow.time_alert);
    assert!(!fast.time_alert);
    for entry in &entries {
        assert_eq!(entry.time_alert, entry.elapsed_ms >= 100);
    }
}

#[test]
fn sink_receives_one_batch_with_only_alerted_entries() {
    let sink = Arc::new(RecordingSink::default());
    let tracer = manual_tracer(
        TraceConfig::new()
            .alert_threshold_ms(30)
            .alert_sink(sink.clone()),
    );
    sleep_op(&tracer, "slow-a", 40);
    sleep_op(&tracer, "fast", 0);
    sleep_op(&tracer, "slow-b", 40);

    let report = tracer.sweep_now();
    assert_eq!(report.alerted, 2);
    assert_eq!(
        sink.texts(),
        vec![vec!["slow-a".to_string(), "slow-b".to_string()]]
    );
    assert!(sink.batches.lock()[0].iter().all(|e| e.time_alert));
}

#[test]
fn sink_not_called_when_nothing_alerted() {
    let sink = Arc::new(RecordingSink::default());
    let tracer = manual_tracer(TraceConfig::new().alert_sink(sink.clone()));
    run_ok(&tracer, "quick");

    tracer.sweep_now();
    tracer.sweep_now();
    assert_eq!(sink.batch_count(), 0);
}

#[test]
fn sink_can_only_be_set_at_init() {
    let first = Arc::new(RecordingSink::default());
    let second = Arc::new(RecordingSink::default());
    let tracer = manual_tracer(
        TraceConfig::new()
            .alert_threshold_ms(1)
            .alert_sink(first.clone()),
    );
    assert!(!tracer.init(TraceConfig::new().alert_sink(second.clone())));

    sleep_op(&tracer, "slow", 5);
    tracer.sweep_now();
    assert_eq!(first.batch_count(), 1);
    assert_eq!(second.batch_count(), 0);
}

#[test]
fn in_flight_entry_is_not_alerted() {
    let sink = Arc::new(RecordingSink::default());
    let tracer = Arc::new(manual_tracer(
        TraceConfig::new()
            .alert_threshold_ms(1)
            .alert_sink(sink.clone()),
    ));

    let inner = Arc::clone(&tracer);
    tracer
        .trace("outer", "execute", || -> Result<(), io::Error> {
            thread::sleep(Duration::from_millis(5));
            let report = inner.sweep_now();
            assert_eq!(report.alerted, 0);
            Ok(())
        })
        .unwrap();

    assert_eq!(tracer.sweep_now().alerted, 1);
    assert_eq!(sink.batch_count(), 1);
}

//! Concurrent callers and a concurrent sweeper

use crate::*;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

#[test]
fn concurrent_callers_respect_capacity() {
    let tracer = Arc::new(manual_tracer(TraceConfig::new().max_entries(64)));
    const NUM_THREADS: usize = 8;
    const CALLS_PER_THREAD: usize = 100;

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let tracer = Arc::clone(&tracer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for j in 0..CALLS_PER_THREAD {
                    run_ok(&tracer, &format!("t{}-{}", i, j));
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let snapshot = tracer.snapshot();
    assert_eq!(tracer.size(), 64);
    assert_eq!(snapshot.len(), 64);
    assert!(snapshot.iter().all(|e| e.completed));
}

#[test]
fn sweeper_racing_callers_keeps_size_consistent() {
    let tracer = Arc::new(
        CallTracer::builder()
            .config(TraceConfig::new().max_entries(16).entry_timeout_ms(1))
            .initial_delay(Duration::ZERO)
            .sweep_period(Duration::from_millis(1))
            .build()
            .unwrap(),
    );
    const NUM_THREADS: usize = 6;

    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let tracer = Arc::clone(&tracer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for j in 0..200 {
                    run_ok(&tracer, &format!("t{}-{}", i, j));
                    if j % 50 == 0 {
                        thread::sleep(Duration::from_millis(2));
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    tracer.close();

    assert_eq!(tracer.size(), tracer.snapshot().len());
    assert!(tracer.size() <= 16);
}

#[test]
fn snapshots_during_writes_are_sorted_and_whole() {
    let tracer = Arc::new(manual_tracer(TraceConfig::new().max_entries(100)));
    let writer = {
        let tracer = Arc::clone(&tracer);
        thread::spawn(move || {
            for j in 0..500 {
                run_ok(&tracer, &format!("w{}", j));
            }
        })
    };

    for _ in 0..50 {
        let snapshot = tracer.snapshot();
        assert!(snapshot.len() <= 100);
        for pair in snapshot.windows(2) {
            assert!(pair[0].order_key() < pair[1].order_key());
        }
        for entry in &snapshot {
            if entry.completed {
                assert!(entry.exec_end_time.is_some());
                assert!(entry.success);
            }
        }
    }

    writer.join().unwrap();
}

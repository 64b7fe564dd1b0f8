//! Interception semantics: results, failures, entry contents

use crate::*;
use calltrace::{InvokeError, Operation};
use std::fmt;

#[derive(Debug, PartialEq)]
enum DriverError {
    Syntax(String),
    Timeout,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Syntax(near) => write!(f, "syntax error near '{}'", near),
            DriverError::Timeout => write!(f, "statement timeout"),
        }
    }
}

/// A prepared statement routed through a forwarding layer
struct Prepared {
    sql: &'static str,
    result: Result<u64, DriverError>,
}

impl Operation for Prepared {
    type Output = u64;
    type Error = DriverError;

    fn operation_text(&self) -> &str {
        self.sql
    }

    fn method_name(&self) -> &str {
        "execute_update"
    }

    fn invoke(self) -> Result<u64, InvokeError<DriverError>> {
        self.result.map_err(InvokeError::Wrapped)
    }
}

#[test]
fn result_returned_unchanged() {
    let tracer = manual_tracer(TraceConfig::new());
    let query = || -> Result<Vec<&'static str>, io::Error> { Ok(vec!["ada", "grace"]) };
    let rows = tracer
        .trace("select name from users", "execute_query", query)
        .unwrap();
    assert_eq!(rows, vec!["ada", "grace"]);
}

#[test]
fn closure_runs_exactly_once() {
    let tracer = manual_tracer(TraceConfig::new());
    let mut calls = 0;
    tracer
        .trace("insert into t values (1)", "execute_update", || -> Result<(), io::Error> {
            calls += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(calls, 1);
    assert_eq!(tracer.size(), 1);
}

#[test]
fn failure_reaches_caller_unwrapped() {
    let tracer = manual_tracer(TraceConfig::new());
    let err = tracer
        .intercept(Prepared {
            sql: "updat users set x = 1",
            result: Err(DriverError::Syntax("updat".into())),
        })
        .unwrap_err();

    assert_eq!(err, DriverError::Syntax("updat".into()));

    let entry = &tracer.snapshot()[0];
    assert!(!entry.success);
    assert!(entry.completed);
    assert_eq!(
        entry.failure_cause.as_deref(),
        Some("syntax error near 'updat'")
    );
    assert_eq!(entry.method_name, "execute_update");
}

#[test]
fn success_through_operation() {
    let tracer = manual_tracer(TraceConfig::new());
    let updated = tracer
        .intercept(Prepared {
            sql: "update users set active = 0",
            result: Ok(12),
        })
        .unwrap();
    assert_eq!(updated, 12);
    assert!(tracer.snapshot()[0].success);
}

#[test]
fn failure_cause_is_never_empty() {
    let tracer = manual_tracer(TraceConfig::new());
    let _ = tracer.intercept(Prepared {
        sql: "select pg_sleep(60)",
        result: Err(DriverError::Timeout),
    });

    let cause = tracer.snapshot()[0].failure_cause.clone().unwrap();
    assert!(!cause.is_empty());
}

#[test]
fn entry_records_execution_window() {
    let tracer = manual_tracer(TraceConfig::new());
    run_ok(&tracer, "select now()");

    let entry = &tracer.snapshot()[0];
    assert!(entry.id.is_assigned());
    assert!(entry.trace_start_time > 0);
    assert!(entry.exec_start_time_ms >= entry.trace_start_time - 1_000);
    assert_eq!(entry.exec_start_time.as_ref().map(String::len), Some(19));
    assert_eq!(entry.exec_end_time.as_ref().map(String::len), Some(19));
    assert_eq!(entry.elapsed(), Some(entry.elapsed_ms));
}

#[test]
fn tracing_disabled_still_records() {
    let tracer = manual_tracer(TraceConfig::new().trace_enabled(false).show_sql(true));
    run_ok(&tracer, "select 1");
    assert_eq!(tracer.size(), 1);
}

#[test]
fn snapshot_json_exposes_monitor_fields() {
    let tracer = manual_tracer(TraceConfig::new());
    run_ok(&tracer, "select 1");

    let json: serde_json::Value = serde_json::from_str(&tracer.snapshot_json().unwrap()).unwrap();
    let entry = &json[0];
    assert_eq!(entry["operationText"], "select 1");
    assert_eq!(entry["methodName"], "execute");
    assert_eq!(entry["success"], true);
    assert_eq!(entry["timeAlert"], false);
    assert!(entry["failureCause"].is_null());
    assert!(entry["execStartTime"].is_string());
    assert!(entry["execEndTime"].is_string());
    assert!(entry["elapsedMs"].is_u64());
}

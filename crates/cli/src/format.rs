//! Output formatting.

use calltrace::{SweepReport, TraceEntry, TraceSettings};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Render a snapshot.
pub fn format_snapshot(entries: &[TraceEntry], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(entries)
            .unwrap_or_else(|e| format!("(error) {}", e)),
        OutputMode::Human => {
            if entries.is_empty() {
                return "(empty)".to_string();
            }
            let mut out = format!(
                "{:<8} {:<19} {:>8} {:<6} {:<5} {}\n",
                "ID", "START", "ELAPSED", "OK", "ALERT", "OPERATION"
            );
            for entry in entries {
                let elapsed = entry
                    .elapsed()
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "running".to_string());
                out.push_str(&format!(
                    "{:<8} {:<19} {:>8} {:<6} {:<5} {}",
                    entry.id.as_u64(),
                    entry.exec_start_time.as_deref().unwrap_or("-"),
                    elapsed,
                    if entry.success { "yes" } else { "no" },
                    if entry.time_alert { "!" } else { "" },
                    entry.operation_text,
                ));
                if let Some(cause) = &entry.failure_cause {
                    out.push_str(&format!("  ({})", cause));
                }
                out.push('\n');
            }
            out.pop();
            out
        }
    }
}

/// Render resolved settings.
pub fn format_settings(settings: &TraceSettings, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({
            "traceEnabled": settings.trace_enabled,
            "showSql": settings.show_sql,
            "maxEntries": settings.max_entries,
            "entryTimeoutMs": settings.entry_timeout_ms,
            "alertThresholdMs": settings.alert_threshold_ms,
            "alertAction": settings.alert_sink.name(),
        })
        .to_string(),
        OutputMode::Human => format!(
            concat!(
                "trace-enabled     {}\n",
                "sql-show          {}\n",
                "trace-size        {}\n",
                "trace-timeout     {}ms\n",
                "exec-alert-time   {}ms\n",
                "exec-alert-action {}",
            ),
            settings.trace_enabled,
            settings.show_sql,
            settings.max_entries,
            settings.entry_timeout_ms,
            settings.alert_threshold_ms,
            settings.alert_sink.name(),
        ),
    }
}

/// One-line summary of a sweep.
pub fn format_report(report: &SweepReport) -> String {
    format!(
        "sweep: scanned {}, evicted {}, alerted {}",
        report.scanned, report.evicted, report.alerted
    )
}

/// Format an error message.
pub fn format_error(message: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({ "error": message }).to_string(),
        OutputMode::Human => format!("(error) {}", message),
    }
}

//! Wall-clock helpers

use chrono::{DateTime, Local, Utc};

/// Display format for execution timestamps (`yyyy-MM-dd HH:mm:ss`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a local timestamp for display
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

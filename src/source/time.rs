//! Time dimension derivation from millisecond epoch timestamps (UTC)

use chrono::{DateTime, Datelike, Timelike, Utc};

use super::TimeRow;

/// Canonical text form used for `start_time` in both `time` and `songplays`
pub fn format_start_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Decompose an event timestamp. Returns `None` if it is outside the
/// range chrono can represent.
pub fn derive_time(ts_millis: i64) -> Option<TimeRow> {
    let ts = DateTime::<Utc>::from_timestamp_millis(ts_millis)?;

    Some(TimeRow {
        start_time: format_start_time(&ts),
        hour: ts.hour(),
        day: ts.day(),
        week: ts.iso_week().week(),
        month: ts.month(),
        year: ts.year(),
        weekday: ts.weekday().num_days_from_monday(),
    })
}

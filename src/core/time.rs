//! Shared date and timestamp helpers.
//!
//! Calendar dates are persisted as `YYYY-MM-DD` strings. Arithmetic on them goes
//! through `chrono::NaiveDate`; "now" is always passed in by the caller so the
//! derivations stay deterministic under test.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", Utc::now().timestamp())
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parses a stored calendar date. Accepts the same inputs as [`normalize_date`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Canonicalizes a start date to `YYYY-MM-DD`.
///
/// Timestamps with an offset are converted to their UTC calendar date; naive
/// timestamps keep their date part. Anything unparseable is returned verbatim.
pub fn normalize_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(d) => format_date(d),
        None => raw.to_string(),
    }
}

/// `start + days` calendar days.
pub fn add_days(start: NaiveDate, days: i64) -> Option<NaiveDate> {
    start.checked_add_signed(TimeDelta::try_days(days)?)
}

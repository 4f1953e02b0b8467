//! Human time-expression parsing
//!
//! Accepts the time formats hosts pass on the command line or in config:
//! `now`, relative expressions like `now-10m` / `now - 1h`, bare epoch
//! timestamps (seconds or milliseconds, auto-detected), and ISO-8601 dates
//! and datetimes (assumed UTC when no zone is given). Everything resolves
//! to epoch seconds, the unit the query window uses.

use crate::error::ApiError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// `now - <amount><unit>`; unit case distinguishes minutes from months
static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^now\s*-\s*(\d+)\s*([smhdwMy])$").expect("valid regex"));

/// Epoch values above this are taken to be milliseconds
const MS_THRESHOLD: i64 = 10_000_000_000;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a time expression against the current wall clock
pub fn parse_time_input(text: &str) -> Result<i64, ApiError> {
    parse_time_input_at(text, Utc::now())
}

/// Parse a time expression against an explicit "now".
///
/// Relative units: `s` seconds, `m` minutes, `h` hours, `d` days, `w`
/// weeks, `M` months (30 days), `y` years (365 days). Only the `m`/`M`
/// pair is case-sensitive.
pub fn parse_time_input_at(text: &str, now: DateTime<Utc>) -> Result<i64, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::Time("time string cannot be empty".to_string()));
    }

    if text.eq_ignore_ascii_case("now") {
        return Ok(now.timestamp());
    }

    if let Some(caps) = RELATIVE_RE.captures(text) {
        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| ApiError::Time(format!("amount out of range in '{}'", text)))?;
        let unit = &caps[2];

        let unit_seconds: i64 = match unit {
            "s" | "S" => 1,
            "m" => 60,
            "M" => 30 * 86_400,
            "h" | "H" => 3_600,
            "d" | "D" => 86_400,
            "w" | "W" => 7 * 86_400,
            "y" | "Y" => 365 * 86_400,
            _ => return Err(ApiError::Time(format!("unknown time unit '{}'", unit))),
        };
        return amount
            .checked_mul(unit_seconds)
            .and_then(|seconds| now.timestamp().checked_sub(seconds))
            .ok_or_else(|| ApiError::Time(format!("amount out of range in '{}'", text)));
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        let timestamp: i64 = text
            .parse()
            .map_err(|_| ApiError::Time(format!("timestamp out of range: '{}'", text)))?;
        if timestamp > MS_THRESHOLD {
            return Ok(timestamp / 1000);
        }
        return Ok(timestamp);
    }

    // Zone-aware forms first, then naive forms assumed UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp());
        }
    }

    Err(ApiError::Time(format!(
        "unable to parse time '{}'; supported: 'now', 'now-10m', '2025-12-30', \
         '2025-12-30 10:00:00', '2025-12-30T10:00:00Z', epoch seconds or milliseconds",
        text
    )))
}

/// Parse a start/end pair; the start must not be after the end
pub fn parse_time_range(start: &str, end: &str) -> Result<(i64, i64), ApiError> {
    parse_time_range_at(start, end, Utc::now())
}

/// Range variant of [`parse_time_input_at`]
pub fn parse_time_range_at(
    start: &str,
    end: &str,
    now: DateTime<Utc>,
) -> Result<(i64, i64), ApiError> {
    let start_ts = parse_time_input_at(start, now)?;
    let end_ts = parse_time_input_at(end, now)?;

    if start_ts > end_ts {
        return Err(ApiError::Time(format!(
            "start time {} is after end time {}",
            start_ts, end_ts
        )));
    }
    Ok((start_ts, end_ts))
}

/// Render an epoch-seconds timestamp as an ISO-8601 UTC string
pub fn format_timestamp(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.to_rfc3339(),
        None => timestamp.to_string(),
    }
}

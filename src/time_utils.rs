// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored log date.
///
/// Logs written on finish carry a full RFC3339 timestamp, logs added through
/// the history editor carry a bare `YYYY-MM-DD` day. Bare days are pinned to
/// noon UTC so they never drift into a neighbouring day.
pub fn parse_log_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Utc.from_local_datetime(&day.and_hms_opt(12, 0, 0)?).single()
}

/// Calendar day key ("YYYY-MM-DD").
pub fn day_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar month key ("YYYY-MM").
pub fn month_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m").to_string()
}

/// Short chart label ("DD/MM").
pub fn chart_label(date: DateTime<Utc>) -> String {
    date.format("%d/%m").to_string()
}

/// Check a "YYYY-MM" month filter.
pub fn is_valid_month_key(month: &str) -> bool {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_ok() && month.len() == 7
}

/// Canonical "HH:MM" form of a meal time, `None` when it is not a clock time.
pub fn normalize_meal_time(raw: &str) -> Option<String> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()?;
    Some(time.format("%H:%M").to_string())
}

/// The month following a "YYYY-MM" key, for half-open range queries.
pub fn next_month_key(month: &str) -> Option<String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").ok()?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.format("%Y-%m").to_string())
}

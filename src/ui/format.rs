//! Text helpers for incident timestamps.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

/// Coarse relative age such as `"just now"`, `"5m ago"` or `"3w ago"`.
///
/// Months are 30 days and years 365 days; timestamps after `now` read as
/// `"in the future"`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed.num_milliseconds() < 0 {
        return "in the future".to_string();
    }

    let seconds = elapsed.num_seconds();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let weeks = days / 7;
    let months = days / 30;
    let years = days / 365;

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if weeks < 5 {
        format!("{weeks}w ago")
    } else if months < 12 {
        format!("{months}mon ago")
    } else {
        format!("{years}y ago")
    }
}

/// 12-hour clock time without a leading zero, e.g. `"3:04 PM"`
pub fn format_time<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format("%-I:%M %p").to_string()
}

/// Fixed four-decimal coordinate pair used when no address is known
pub fn format_coordinates(lat: f64, lng: f64) -> String {
    format!("{lat:.4}, {lng:.4}")
}

//! Relative and absolute timestamp rendering for device listings.
//!
//! `time_ago` counts seconds below one minute and otherwise rounds to the
//! largest sensible unit ("3 minutes ago", "an hour ago", "2 days ago").

use chrono::{DateTime, Local, TimeZone, Utc};

/// "N seconds ago" / "N minutes ago" / ... relative to now.
pub fn time_ago(unix: i64) -> String {
    relative(unix, Utc::now().timestamp())
}

/// `YYYY-MM-DD, HH:mm (time ago)` in local time.
pub fn fmt_date(unix: i64) -> String {
    Local
        .timestamp_opt(unix, 0)
        .single()
        .map_or_else(|| "-".into(), |dt| format_with(&dt, Utc::now().timestamp()))
}

/// Render a timestamp column; missing values become `-`.
pub fn ago_or_dash(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".into(), |t| time_ago(t.timestamp()))
}

fn format_with<Tz: TimeZone>(dt: &DateTime<Tz>, now: i64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} ({})",
        dt.format("%Y-%m-%d, %H:%M"),
        relative(dt.timestamp(), now)
    )
}

fn relative(unix: i64, now: i64) -> String {
    // Clock skew can put device timestamps slightly in the future.
    let secs = (now - unix).max(0);
    if secs < 60 {
        return format!("{secs} seconds ago");
    }

    let minutes = div_round(secs, 60);
    let hours = div_round(secs, 3600);
    let days = div_round(secs, 86_400);

    match secs {
        ..90 => "a minute ago".into(),
        ..2_700 => format!("{minutes} minutes ago"),
        ..5_400 => "an hour ago".into(),
        ..79_200 => format!("{hours} hours ago"),
        ..129_600 => "a day ago".into(),
        ..2_246_400 => format!("{days} days ago"),
        ..3_888_000 => "a month ago".into(),
        ..27_648_000 => format!("{} months ago", div_round(days * 10, 304).max(2)),
        ..47_347_200 => "a year ago".into(),
        _ => format!("{} years ago", div_round(days, 365).max(2)),
    }
}

fn div_round(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}

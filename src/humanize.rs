//! Human-readable time helpers.
//!
//! Post-age bounds are configured as relative durations ("6 days", "30m",
//! "2 hours ago") and cooldown rejections describe the last post relative to
//! now ("5 minutes ago").

use chrono::{DateTime, Duration, Utc};

/// Parse a relative duration such as `30 minutes`, `2d`, `1 week ago`.
///
/// A bare number is read as seconds. The trailing word `ago` is accepted so
/// values read naturally in config ("6 days ago").
pub fn parse_duration(input: &str) -> Option<Duration> {
    let trimmed = input.trim().to_lowercase();
    let trimmed = trimmed.strip_suffix("ago").unwrap_or(&trimmed).trim();
    if trimmed.is_empty() {
        return None;
    }

    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split_at);
    let amount: i64 = number.parse().ok()?;

    let seconds_per_unit = match unit.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "week" | "weeks" => 604_800,
        _ => return None,
    };

    amount
        .checked_mul(seconds_per_unit)
        .and_then(Duration::try_seconds)
}

/// Describe `then` relative to `now`, e.g. `5 minutes ago` or `in an hour`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let phrase = describe_span(delta.num_seconds().unsigned_abs());
    if delta.num_seconds() >= 0 {
        format!("{phrase} ago")
    } else {
        format!("in {phrase}")
    }
}

/// Render a duration the same way `relative_time` renders its span.
pub fn describe_duration(duration: Duration) -> String {
    describe_span(duration.num_seconds().unsigned_abs())
}

fn describe_span(seconds: u64) -> String {
    let minutes = (seconds as f64 / 60.0).round() as u64;
    let hours = (seconds as f64 / 3_600.0).round() as u64;
    let days = (seconds as f64 / 86_400.0).round() as u64;

    match seconds {
        0..45 => "a few seconds".to_string(),
        45..90 => "a minute".to_string(),
        90..2_700 => format!("{minutes} minutes"),
        2_700..5_400 => "an hour".to_string(),
        5_400..79_200 => format!("{hours} hours"),
        79_200..129_600 => "a day".to_string(),
        129_600..2_246_400 => format!("{days} days"),
        2_246_400..3_888_000 => "a month".to_string(),
        3_888_000..27_648_000 => format!("{} months", (days as f64 / 30.0).round() as u64),
        27_648_000..47_347_200 => "a year".to_string(),
        _ => format!("{} years", (days as f64 / 365.0).round() as u64),
    }
}

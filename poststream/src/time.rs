use alloc::format;
use alloc::string::{String, ToString};

use chrono::{DateTime, TimeDelta, Utc};

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
// Average Gregorian month and year.
const MONTH_MS: i64 = 2_629_746_000;
const YEAR_MS: i64 = 12 * MONTH_MS;

fn rounded_div(value: i64, unit: i64) -> i64 {
    value.saturating_add(unit / 2) / unit
}

/// Formats a timestamp as the scrubber period label, e.g. `"March 2024"`.
pub fn period_label(time: DateTime<Utc>) -> String {
    time.format("%B %Y").to_string()
}

/// Formats an elapsed duration in relative form without a suffix, e.g. `"5 days"`.
///
/// Negative durations are formatted by magnitude.
pub fn humanize_duration(delta: TimeDelta) -> String {
    let ms = delta.num_milliseconds().saturating_abs();

    let secs = rounded_div(ms, SECOND_MS);
    if secs <= 44 {
        return "a few seconds".to_string();
    }
    if secs <= 89 {
        return "a minute".to_string();
    }
    let minutes = rounded_div(ms, MINUTE_MS);
    if minutes <= 44 {
        return format!("{minutes} minutes");
    }
    if minutes <= 89 {
        return "an hour".to_string();
    }
    let hours = rounded_div(ms, HOUR_MS);
    if hours <= 21 {
        return format!("{hours} hours");
    }
    if hours <= 35 {
        return "a day".to_string();
    }
    let days = rounded_div(ms, DAY_MS);
    if days <= 25 {
        return format!("{days} days");
    }
    if days <= 45 {
        return "a month".to_string();
    }
    let months = rounded_div(ms, MONTH_MS);
    if months <= 10 {
        return format!("{months} months");
    }
    if months <= 17 {
        return "a year".to_string();
    }
    let years = rounded_div(ms, YEAR_MS).max(2);
    format!("{years} years")
}

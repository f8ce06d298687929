//! Loose date parsing for command arguments such as `yesterday` or
//! `3 days ago`. Naive dates and times are read as UTC.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_english::{parse_date_string, Dialect};
use tracing::debug;

use crate::{AppError, Result};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn invalid(input: &str) -> AppError {
    AppError::InvalidInput(format!("Unable to parse date: {input}"))
}

fn relative(amount: &str, unit: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let n: u32 = match amount {
        "a" | "an" => 1,
        other => other.parse().ok()?,
    };
    let delta = |per: i64| TimeDelta::try_seconds(i64::from(n) * per);
    match unit.trim_end_matches('s') {
        "second" | "sec" => now.checked_sub_signed(delta(1)?),
        "minute" | "min" => now.checked_sub_signed(delta(60)?),
        "hour" => now.checked_sub_signed(delta(3_600)?),
        "day" => now.checked_sub_signed(delta(86_400)?),
        "week" => now.checked_sub_signed(delta(604_800)?),
        "month" => now.checked_sub_months(Months::new(n)),
        "year" => now.checked_sub_months(Months::new(n.checked_mul(12)?)),
        _ => None,
    }
}

/// Parse `input` relative to `now`.
///
/// Accepts `now`, `today`, `yesterday`, `tomorrow`, `last week`,
/// `last month`, `N <unit>s ago`, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`,
/// and RFC 3339 timestamps. Anything else goes through `chrono_english`
/// (`friday`, `next friday 8pm`, `10/12/2024`).
///
/// # Errors
///
/// Returns `AppError::InvalidInput` when nothing matches.
pub fn parse_date(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let normalized = input.trim().to_lowercase();
    let day = TimeDelta::days(1);

    let parsed = match normalized.as_str() {
        "now" => Some(now),
        "today" => Some(midnight(now)),
        "yesterday" => midnight(now).checked_sub_signed(day),
        "tomorrow" => midnight(now).checked_add_signed(day),
        "last week" => now.checked_sub_signed(TimeDelta::weeks(1)),
        "last month" => now.checked_sub_months(Months::new(1)),
        other => {
            let words: Vec<&str> = other.split_whitespace().collect();
            match words.as_slice() {
                [amount, unit, "ago"] => relative(amount, unit, now),
                _ => None,
            }
        }
    };
    if let Some(at) = parsed {
        return Ok(at);
    }

    let raw = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    if let Some(at) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Ok(at.and_utc());
    }

    parse_date_string(raw, now, Dialect::Us).map_err(|err| {
        debug!(input = raw, %err, "english date parsing failed");
        invalid(raw)
    })
}

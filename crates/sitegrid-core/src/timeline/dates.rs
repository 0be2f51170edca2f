//! Calendar helpers shared by the CLI and the layout engine.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};

use crate::error::ValidationError;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        input: input.to_string(),
    })
}

/// Parse a timestamp given as RFC 3339, `YYYY-MM-DDTHH:MM`, or a bare date
/// (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M") {
        return Ok(naive.and_utc());
    }
    let date = parse_date(trimmed)?;
    Ok(midnight_utc(date))
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Shift by whole days, saturating at the ends of chrono's range.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(magnitude).unwrap_or(NaiveDate::MIN)
    }
}

/// First day of the week containing `date`.
pub fn start_of_week(date: NaiveDate, week_starts_monday: bool) -> NaiveDate {
    let offset = if week_starts_monday {
        date.weekday().num_days_from_monday()
    } else {
        date.weekday().num_days_from_sunday()
    };
    shift_days(date, -i64::from(offset))
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Short column header, e.g. `Mon 02`.
pub fn day_header(date: NaiveDate) -> String {
    date.format("%a %d").to_string()
}

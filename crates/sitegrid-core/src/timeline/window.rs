//! Visible date window and its navigation.
//!
//! A window is fully described by `(start_date, duration)`. The end bound is
//! derived, so the `start <= end` invariant cannot be broken from outside.
//!
//! ## Transitions
//!
//! ```text
//! Previous          start -= duration
//! Next              start += duration
//! ChangeDuration(d) duration = d, start unchanged
//! Today(date)       start = date
//! ```
//!
//! Shifts saturate at the ends of chrono's calendar, and the start is held
//! back far enough that `start + duration` still exists. At that edge `Next`
//! is a no-op, so `Next` then `Previous` only round-trips away from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::dates::shift_days;
use crate::error::ValidationError;

/// Supported window widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum WindowDuration {
    Week,
    #[default]
    Fortnight,
    Month,
    Quarter,
}

impl WindowDuration {
    pub const ALL: [WindowDuration; 4] = [
        WindowDuration::Week,
        WindowDuration::Fortnight,
        WindowDuration::Month,
        WindowDuration::Quarter,
    ];

    pub fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Fortnight => 14,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    pub fn from_days(days: i64) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|d| d.days() == days)
            .ok_or(ValidationError::InvalidWindowDuration(days))
    }
}

impl TryFrom<i64> for WindowDuration {
    type Error = ValidationError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        Self::from_days(days)
    }
}

impl From<WindowDuration> for i64 {
    fn from(duration: WindowDuration) -> Self {
        duration.days()
    }
}

impl fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.days())
    }
}

impl FromStr for WindowDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s.trim().parse::<i64>().map_err(|_| ValidationError::InvalidValue {
            field: "duration".into(),
            message: format!("'{s}' is not a number of days"),
        })?;
        Self::from_days(days)
    }
}

/// Navigation input for the window state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    ChangeDuration(WindowDuration),
    /// Re-anchor the window at the given day.
    Today(NaiveDate),
}

/// The visible date range of the timeline grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start_date: NaiveDate,
    #[serde(rename = "durationDays")]
    pub duration: WindowDuration,
}

impl TimeWindow {
    /// The start is clamped so that the whole window fits in chrono's range.
    pub fn new(start_date: NaiveDate, duration: WindowDuration) -> Self {
        Self {
            start_date: start_date.min(Self::latest_start(duration)),
            duration,
        }
    }

    /// Last start date whose window still ends on or before `NaiveDate::MAX`.
    fn latest_start(duration: WindowDuration) -> NaiveDate {
        shift_days(NaiveDate::MAX, -duration.days())
    }

    /// Inclusive end bound: `start_date + duration`.
    pub fn end_date(&self) -> NaiveDate {
        shift_days(self.start_date, self.duration.days())
    }

    /// Number of day columns in `[start_date, end_date]`.
    pub fn day_count(&self) -> usize {
        let days = (self.end_date() - self.start_date).num_days();
        usize::try_from(days + 1).unwrap_or(0)
    }

    /// Apply one navigation step.
    pub fn apply(self, navigation: Navigation) -> Self {
        match navigation {
            Navigation::Previous => self.paged(-1),
            Navigation::Next => self.paged(1),
            Navigation::ChangeDuration(duration) => Self::new(self.start_date, duration),
            Navigation::Today(date) => Self::new(date, self.duration),
        }
    }

    pub fn next(self) -> Self {
        self.apply(Navigation::Next)
    }

    pub fn previous(self) -> Self {
        self.apply(Navigation::Previous)
    }

    /// Move `pages` windows forward (positive) or back (negative) in one step.
    pub fn paged(self, pages: i64) -> Self {
        let shift = pages.saturating_mul(self.duration.days());
        Self::new(shift_days(self.start_date, shift), self.duration)
    }
}

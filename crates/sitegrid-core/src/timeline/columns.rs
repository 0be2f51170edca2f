//! Day columns of the timeline grid.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{day_header, is_weekend};
use super::window::TimeWindow;

/// Every calendar day from `window_start` to `window_end`, inclusive.
///
/// Walks one day at a time with chrono's calendar arithmetic so month
/// lengths and leap days come out right. An inverted range yields nothing.
pub fn build_day_columns(window_start: NaiveDate, window_end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = window_start;
    while current <= window_end {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

/// One header cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayColumn {
    pub date: NaiveDate,
    pub label: String,
    pub is_weekend: bool,
    pub is_today: bool,
}

impl DayColumn {
    pub fn new(date: NaiveDate, today: Option<NaiveDate>) -> Self {
        Self {
            date,
            label: day_header(date),
            is_weekend: is_weekend(date),
            is_today: today == Some(date),
        }
    }

    /// Decorated columns for a whole window.
    pub fn for_window(window: &TimeWindow, today: Option<NaiveDate>) -> Vec<Self> {
        build_day_columns(window.start_date, window.end_date())
            .into_iter()
            .map(|date| Self::new(date, today))
            .collect()
    }
}

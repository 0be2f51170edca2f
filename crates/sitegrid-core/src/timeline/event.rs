//! Schedule event types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

pub(crate) const MILLIS_PER_DAY: i64 = 86_400_000;

/// Visual urgency of an event. Has no effect on layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Stable colour tag used by renderers that have no palette of their own.
    pub fn color_tag(&self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Medium => "amber",
            Self::High => "red",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ValidationError::InvalidPriority(s.to_string())),
        }
    }
}

/// Key an event is grouped under on the project timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum GroupKey {
    Id(String),
    Name(String),
}

/// A scheduled event as handed over by the event data source.
///
/// `end_date < start_date` is tolerated; layout treats such events as one
/// day long rather than rejecting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    /// Blank ids are replaced on import.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ScheduleEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            start_date,
            end_date,
            project_id: None,
            project_name: None,
            priority: Priority::default(),
            location: None,
            tags: Vec::new(),
        }
    }

    /// Fresh random id for a new event.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Attach the event to a project.
    pub fn with_project(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self.project_name = Some(name.into());
        self
    }

    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Calendar day (UTC) the event starts on.
    pub fn start_day(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    /// Calendar day (UTC) the event ends on.
    pub fn end_day(&self) -> NaiveDate {
        self.end_date.date_naive()
    }

    /// Length in whole days, rounded up, never less than one.
    pub fn duration_days(&self) -> i64 {
        let millis = (self.end_date - self.start_date).num_milliseconds();
        if millis <= 0 {
            return 1;
        }
        ((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY).max(1)
    }

    /// Whether any part of `[start_date, end_date]` touches the inclusive day range.
    pub fn overlaps_days(&self, first: NaiveDate, last: NaiveDate) -> bool {
        let end = self.end_day().max(self.start_day());
        self.start_day() <= last && end >= first
    }

    /// Grouping key: a non-empty `project_id` wins over `project_name`.
    pub(crate) fn group_key(&self) -> Option<GroupKey> {
        if let Some(id) = non_empty(self.project_id.as_deref()) {
            return Some(GroupKey::Id(id.to_string()));
        }
        non_empty(self.project_name.as_deref()).map(|name| GroupKey::Name(name.to_string()))
    }

    /// Row label for the project this event belongs to.
    pub fn project_label(&self) -> Option<&str> {
        non_empty(self.project_name.as_deref()).or_else(|| non_empty(self.project_id.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

//! Explicit view state for the project timeline.
//!
//! The window and the active filters travel together as one value. Every
//! interaction is a [`ViewAction`] reduced into a new `TimelineView`; nothing
//! is kept in module-level state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::event::{Priority, ScheduleEvent};
use super::layout::{layout_timeline_with, OverlapPolicy, TimelineLayout};
use super::window::{Navigation, TimeWindow};

/// Filters applied before layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFilters {
    /// Allowed priorities; empty means all.
    #[serde(default)]
    pub priorities: Vec<Priority>,
    /// Project id or name, matched case-insensitively.
    #[serde(default)]
    pub project: Option<String>,
    /// Case-insensitive substring of the title.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

impl ViewFilters {
    pub fn matches(&self, event: &ScheduleEvent) -> bool {
        if !self.priorities.is_empty() && !self.priorities.contains(&event.priority) {
            return false;
        }

        if let Some(project) = self.project.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            let hit = [event.project_id.as_deref(), event.project_name.as_deref()]
                .into_iter()
                .flatten()
                .any(|value| value.eq_ignore_ascii_case(project));
            if !hit {
                return false;
            }
        }

        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !event.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }

        true
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty() && self.project.is_none() && self.search.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    Navigate(Navigation),
    SetPriorityFilter(Vec<Priority>),
    SetProjectFilter(Option<String>),
    SetSearch(Option<String>),
    SetOverlapPolicy(OverlapPolicy),
    /// Drop priority, project and search filters. The overlap policy stays.
    ClearFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub window: TimeWindow,
    #[serde(default)]
    pub filters: ViewFilters,
}

impl TimelineView {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            filters: ViewFilters::default(),
        }
    }

    pub fn with_filters(mut self, filters: ViewFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Produce the next view state.
    pub fn reduce(self, action: ViewAction) -> Self {
        match action {
            ViewAction::Navigate(navigation) => Self {
                window: self.window.apply(navigation),
                ..self
            },
            ViewAction::SetPriorityFilter(priorities) => Self {
                filters: ViewFilters {
                    priorities,
                    ..self.filters
                },
                ..self
            },
            ViewAction::SetProjectFilter(project) => Self {
                filters: ViewFilters {
                    project,
                    ..self.filters
                },
                ..self
            },
            ViewAction::SetSearch(search) => Self {
                filters: ViewFilters {
                    search,
                    ..self.filters
                },
                ..self
            },
            ViewAction::SetOverlapPolicy(overlap) => Self {
                filters: ViewFilters {
                    overlap,
                    ..self.filters
                },
                ..self
            },
            ViewAction::ClearFilters => Self {
                filters: ViewFilters {
                    overlap: self.filters.overlap,
                    ..ViewFilters::default()
                },
                ..self
            },
        }
    }

    /// Filter, then lay out the current window.
    pub fn layout(&self, events: &[ScheduleEvent], today: Option<NaiveDate>) -> TimelineLayout {
        let visible: Vec<ScheduleEvent> = events
            .iter()
            .filter(|event| self.filters.matches(event))
            .cloned()
            .collect();
        layout_timeline_with(&visible, &self.window, today, self.filters.overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::WindowDuration;
    use chrono::{DateTime, TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(y: i32, m: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, 0, 0, 0).unwrap()
    }

    fn sample() -> Vec<ScheduleEvent> {
        vec![
            ScheduleEvent::new("1", "Pour footings", at(2025, 6, 2), at(2025, 6, 4))
                .with_project("p1", "Depot")
                .with_priority(Priority::High),
            ScheduleEvent::new("2", "Survey stakeout", at(2025, 6, 3), at(2025, 6, 3))
                .with_project("p2", "Culvert")
                .with_priority(Priority::Low),
            ScheduleEvent::new("3", "Rebar inspection", at(2025, 6, 9), at(2025, 6, 10))
                .with_project("p1", "Depot"),
            ScheduleEvent::new("4", "Crane hire", at(2025, 5, 28), at(2025, 6, 6))
                .with_project("p1", "Depot"),
        ]
    }

    fn view() -> TimelineView {
        TimelineView::new(TimeWindow::new(d(2025, 6, 1), WindowDuration::Fortnight))
    }

    #[test]
    fn navigation_flows_through_reduce() {
        let v = view()
            .reduce(ViewAction::Navigate(Navigation::Next))
            .reduce(ViewAction::Navigate(Navigation::ChangeDuration(WindowDuration::Week)));
        assert_eq!(v.window.start_date, d(2025, 6, 15));
        assert_eq!(v.window.end_date(), d(2025, 6, 22));
    }

    #[test]
    fn priority_filter_limits_bars() {
        let v = view().reduce(ViewAction::SetPriorityFilter(vec![Priority::High]));
        let layout = v.layout(&sample(), None);
        assert_eq!(layout.bar_count(), 1);
        assert_eq!(layout.groups[0].bars[0].event.id, "1");
    }

    #[test]
    fn project_filter_matches_id_or_name() {
        let by_name = view().reduce(ViewAction::SetProjectFilter(Some("culvert".into())));
        assert_eq!(by_name.layout(&sample(), None).bar_count(), 1);

        let by_id = view().reduce(ViewAction::SetProjectFilter(Some("p1".into())));
        assert_eq!(by_id.layout(&sample(), None).bar_count(), 2);
    }

    #[test]
    fn search_is_case_insensitive() {
        let v = view().reduce(ViewAction::SetSearch(Some("REBAR".into())));
        let layout = v.layout(&sample(), None);
        assert_eq!(layout.bar_count(), 1);
        assert_eq!(layout.groups[0].bars[0].event.title, "Rebar inspection");
    }

    #[test]
    fn overlap_policy_brings_in_running_events() {
        assert_eq!(view().layout(&sample(), None).bar_count(), 3);

        let v = view().reduce(ViewAction::SetOverlapPolicy(OverlapPolicy::AnyOverlap));
        assert_eq!(v.layout(&sample(), None).bar_count(), 4);
    }

    #[test]
    fn clear_filters_keeps_window_and_overlap() {
        let v = view()
            .reduce(ViewAction::SetOverlapPolicy(OverlapPolicy::AnyOverlap))
            .reduce(ViewAction::SetSearch(Some("pour".into())))
            .reduce(ViewAction::SetPriorityFilter(vec![Priority::Low]))
            .reduce(ViewAction::ClearFilters);
        assert!(v.filters.is_empty());
        assert_eq!(v.filters.overlap, OverlapPolicy::AnyOverlap);
        assert_eq!(v.window, view().window);
    }
}

//! Timeline layout engine.
//!
//! Turns a snapshot of events plus a visible window into render geometry:
//! day columns, project rows, and one bar per event expressed as fractions
//! of the grid width. Everything here is a pure function of its arguments.
//!
//! Range filtering looks at the start day only. An event that began before
//! the window is left out even when it runs into it; callers that want
//! overlap semantics opt in through [`OverlapPolicy::AnyOverlap`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::columns::{build_day_columns, DayColumn};
use super::dates::midnight_utc;
use super::event::{GroupKey, ScheduleEvent, MILLIS_PER_DAY};
use super::window::TimeWindow;

/// Which events count as "in the window".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// The start day lies within the window.
    #[default]
    StartWithinWindow,
    /// Any day of the event lies within the window.
    AnyOverlap,
}

/// Events belonging to one project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub name: String,
    pub project_id: Option<String>,
    pub events: Vec<ScheduleEvent>,
}

/// Horizontal placement of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarGeometry {
    /// Whole days from the window start, clamped to zero.
    pub start_day_index: i64,
    /// Event length in days, at least one.
    pub duration_days: i64,
    pub visible_start: usize,
    pub visible_duration: usize,
    pub offset_fraction: f64,
    pub width_fraction: f64,
}

impl BarGeometry {
    /// Right edge of the bar as a fraction of the grid.
    pub fn end_fraction(&self) -> f64 {
        self.offset_fraction + self.width_fraction
    }

    pub fn is_visible(&self) -> bool {
        self.visible_duration > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedBar {
    pub event: ScheduleEvent,
    pub geometry: BarGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedGroup {
    pub name: String,
    pub project_id: Option<String>,
    pub bars: Vec<PositionedBar>,
}

/// Everything a renderer needs to paint one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineLayout {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub duration_days: i64,
    pub columns: Vec<DayColumn>,
    pub groups: Vec<PositionedGroup>,
    /// In-range events left out because they have no project.
    pub ungrouped: usize,
}

impl TimelineLayout {
    pub fn bar_count(&self) -> usize {
        self.groups.iter().map(|g| g.bars.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Events whose start day falls within `[window_start, window_end]`.
pub fn filter_events_in_range(
    events: &[ScheduleEvent],
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<ScheduleEvent> {
    filter_events_with_policy(events, window_start, window_end, OverlapPolicy::StartWithinWindow)
}

pub fn filter_events_with_policy(
    events: &[ScheduleEvent],
    window_start: NaiveDate,
    window_end: NaiveDate,
    policy: OverlapPolicy,
) -> Vec<ScheduleEvent> {
    events
        .iter()
        .filter(|event| match policy {
            OverlapPolicy::StartWithinWindow => {
                let day = event.start_day();
                window_start <= day && day <= window_end
            }
            OverlapPolicy::AnyOverlap => event.overlaps_days(window_start, window_end),
        })
        .cloned()
        .collect()
}

/// Group events under their project, in first-seen project order.
///
/// Events with neither a project id nor a project name are dropped.
pub fn group_events_by_project(events: &[ScheduleEvent]) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for event in events {
        let Some(key) = event.group_key() else {
            continue;
        };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(ProjectGroup {
                name: event.project_label().unwrap_or_default().to_string(),
                project_id: event.project_id.clone().filter(|id| !id.trim().is_empty()),
                events: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].events.push(event.clone());
    }

    groups
}

/// Place one event on a grid of `day_columns.len()` columns starting at
/// `window_start` (midnight UTC).
///
/// The bar never starts left of the grid, never runs past its right edge,
/// and is at least one column wide while it starts inside the grid.
pub fn compute_bar_geometry(
    event: &ScheduleEvent,
    window_start: NaiveDate,
    day_columns: &[NaiveDate],
) -> BarGeometry {
    let columns = day_columns.len();
    let offset_millis = (event.start_date - midnight_utc(window_start)).num_milliseconds();
    let start_day_index = offset_millis.div_euclid(MILLIS_PER_DAY).max(0);
    let duration_days = event.duration_days();

    let visible_start = usize::try_from(start_day_index)
        .unwrap_or(usize::MAX)
        .min(columns);
    let visible_duration = usize::try_from(duration_days)
        .unwrap_or(usize::MAX)
        .min(columns - visible_start);

    let (offset_fraction, width_fraction) = if columns == 0 {
        (0.0, 0.0)
    } else {
        let total = columns as f64;
        (visible_start as f64 / total, visible_duration as f64 / total)
    };

    BarGeometry {
        start_day_index,
        duration_days,
        visible_start,
        visible_duration,
        offset_fraction,
        width_fraction,
    }
}

/// Full layout with the default start-day filter.
pub fn layout_timeline(
    events: &[ScheduleEvent],
    window: &TimeWindow,
    today: Option<NaiveDate>,
) -> TimelineLayout {
    layout_timeline_with(events, window, today, OverlapPolicy::StartWithinWindow)
}

pub fn layout_timeline_with(
    events: &[ScheduleEvent],
    window: &TimeWindow,
    today: Option<NaiveDate>,
    policy: OverlapPolicy,
) -> TimelineLayout {
    let window_start = window.start_date;
    let window_end = window.end_date();
    let days = build_day_columns(window_start, window_end);

    let in_range = filter_events_with_policy(events, window_start, window_end, policy);
    let groups = group_events_by_project(&in_range);
    let grouped: usize = groups.iter().map(|g| g.events.len()).sum();

    let groups: Vec<PositionedGroup> = groups
        .into_iter()
        .map(|group| PositionedGroup {
            bars: group
                .events
                .into_iter()
                .map(|event| {
                    let geometry = compute_bar_geometry(&event, window_start, &days);
                    PositionedBar { event, geometry }
                })
                .collect(),
            name: group.name,
            project_id: group.project_id,
        })
        .collect();

    tracing::debug!(
        window_start = %window_start,
        window_end = %window_end,
        total = events.len(),
        in_range = in_range.len(),
        groups = groups.len(),
        "timeline laid out"
    );

    TimelineLayout {
        window_start,
        window_end,
        duration_days: window.duration.days(),
        columns: days.into_iter().map(|date| DayColumn::new(date, today)).collect(),
        groups,
        ungrouped: in_range.len() - grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Priority, WindowDuration};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(y: i32, m: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, 0, 0, 0).unwrap()
    }

    fn event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduleEvent {
        ScheduleEvent::new(id, format!("Event {id}"), start, end)
    }

    #[test]
    fn geometry_for_event_inside_window() {
        let days = build_day_columns(d(2025, 6, 1), d(2025, 6, 15));
        let e = event("e1", at(2025, 6, 5), at(2025, 6, 8));
        let g = compute_bar_geometry(&e, d(2025, 6, 1), &days);

        assert_eq!(g.start_day_index, 4);
        assert_eq!(g.duration_days, 3);
        assert_eq!(g.visible_start, 4);
        assert_eq!(g.visible_duration, 3);
        assert!((g.offset_fraction - 4.0 / 15.0).abs() < 1e-12);
        assert!((g.width_fraction - 0.2).abs() < 1e-12);
    }

    #[test]
    fn geometry_truncates_at_right_edge() {
        let days = build_day_columns(d(2025, 6, 1), d(2025, 6, 15));
        let e = event("e1", at(2025, 6, 12), at(2025, 7, 1));
        let g = compute_bar_geometry(&e, d(2025, 6, 1), &days);

        assert_eq!(g.visible_start, 11);
        assert_eq!(g.duration_days, 19);
        assert_eq!(g.visible_duration, 4);
        assert!((g.end_fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn geometry_clamps_early_start_to_left_edge() {
        let days = build_day_columns(d(2025, 6, 1), d(2025, 6, 15));
        let e = event("e1", at(2025, 5, 20), at(2025, 6, 10));
        let g = compute_bar_geometry(&e, d(2025, 6, 1), &days);

        assert_eq!(g.start_day_index, 0);
        assert_eq!(g.offset_fraction, 0.0);
        assert_eq!(g.visible_duration, 15);
    }

    #[test]
    fn geometry_gives_degenerate_events_one_column() {
        let days = build_day_columns(d(2025, 6, 1), d(2025, 6, 15));
        let start = at(2025, 6, 3);
        for end in [start, start - Duration::days(2)] {
            let g = compute_bar_geometry(&event("e", start, end), d(2025, 6, 1), &days);
            assert_eq!(g.duration_days, 1);
            assert_eq!(g.visible_duration, 1);
        }
    }

    #[test]
    fn geometry_uses_floor_for_intraday_starts() {
        let days = build_day_columns(d(2025, 6, 1), d(2025, 6, 15));
        let start = at(2025, 6, 5) + Duration::hours(23);
        let g = compute_bar_geometry(&event("e", start, start + Duration::hours(2)), d(2025, 6, 1), &days);
        assert_eq!(g.start_day_index, 4);
        assert_eq!(g.duration_days, 1);
    }

    #[test]
    fn geometry_past_grid_has_zero_width() {
        let days = build_day_columns(d(2025, 6, 1), d(2025, 6, 15));
        let g = compute_bar_geometry(&event("e", at(2025, 7, 1), at(2025, 7, 3)), d(2025, 6, 1), &days);
        assert_eq!(g.visible_start, 15);
        assert_eq!(g.visible_duration, 0);
        assert!(!g.is_visible());
        assert!(g.end_fraction() <= 1.0);
    }

    #[test]
    fn geometry_on_empty_grid_is_zero() {
        let g = compute_bar_geometry(&event("e", at(2025, 6, 1), at(2025, 6, 2)), d(2025, 6, 1), &[]);
        assert_eq!(g.offset_fraction, 0.0);
        assert_eq!(g.width_fraction, 0.0);
    }

    #[test]
    fn filter_keeps_only_events_starting_in_window() {
        let events = vec![
            event("inside", at(2025, 6, 5), at(2025, 6, 8)),
            event("early", at(2025, 5, 20), at(2025, 6, 10)),
            event("last-day", at(2025, 6, 15) + Duration::hours(20), at(2025, 6, 17)),
            event("late", at(2025, 6, 16), at(2025, 6, 17)),
        ];
        let ids: Vec<_> = filter_events_in_range(&events, d(2025, 6, 1), d(2025, 6, 15))
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["inside", "last-day"]);
    }

    #[test]
    fn overlap_policy_admits_events_running_into_window() {
        let events = vec![
            event("early", at(2025, 5, 20), at(2025, 6, 10)),
            event("before", at(2025, 5, 1), at(2025, 5, 3)),
        ];
        let ids: Vec<_> = filter_events_with_policy(
            &events,
            d(2025, 6, 1),
            d(2025, 6, 15),
            OverlapPolicy::AnyOverlap,
        )
        .into_iter()
        .map(|e| e.id)
        .collect();
        assert_eq!(ids, vec!["early"]);
    }

    #[test]
    fn grouping_keeps_first_seen_order_and_input_order() {
        let base = at(2025, 6, 2);
        let events = vec![
            event("a1", base, base).with_project("p-b", "Bridge"),
            event("x", base, base),
            event("b1", base, base).with_project("p-a", "Annex"),
            event("a2", base, base).with_project("p-b", "Bridge"),
            event("c1", base, base).with_project_name("Culvert"),
        ];
        let groups = group_events_by_project(&events);

        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Bridge", "Annex", "Culvert"]);
        let bridge: Vec<_> = groups[0].events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(bridge, vec!["a1", "a2"]);
        assert_eq!(groups[2].project_id, None);
    }

    #[test]
    fn grouping_does_not_merge_id_and_name_keys() {
        let base = at(2025, 6, 2);
        let events = vec![
            event("a", base, base).with_project_id("North"),
            event("b", base, base).with_project_name("North"),
        ];
        assert_eq!(group_events_by_project(&events).len(), 2);
    }

    #[test]
    fn layout_combines_filter_grouping_and_geometry() {
        let window = TimeWindow::new(d(2025, 6, 1), WindowDuration::Fortnight);
        let events = vec![
            event("e1", at(2025, 6, 5), at(2025, 6, 8))
                .with_project("p1", "Depot")
                .with_priority(Priority::High),
            event("e2", at(2025, 6, 6), at(2025, 6, 7)),
            event("e3", at(2025, 5, 20), at(2025, 6, 10)).with_project("p1", "Depot"),
        ];
        let layout = layout_timeline(&events, &window, Some(d(2025, 6, 3)));

        assert_eq!(layout.columns.len(), 15);
        assert_eq!(layout.window_end, d(2025, 6, 15));
        assert_eq!(layout.duration_days, 14);
        assert_eq!(layout.groups.len(), 1);
        assert_eq!(layout.bar_count(), 1);
        assert_eq!(layout.ungrouped, 1);
        assert_eq!(layout.groups[0].bars[0].geometry.visible_start, 4);
        assert!(layout.columns[2].is_today);
    }

    #[test]
    fn layout_serializes_camel_case() {
        let window = TimeWindow::new(d(2025, 6, 1), WindowDuration::Week);
        let events = vec![event("e1", at(2025, 6, 2), at(2025, 6, 3)).with_project("p1", "Depot")];
        let json = serde_json::to_value(layout_timeline(&events, &window, None)).unwrap();
        assert_eq!(json["windowStart"], "2025-06-01");
        assert_eq!(json["groups"][0]["bars"][0]["geometry"]["visibleStart"], 1);
        assert_eq!(json["groups"][0]["bars"][0]["event"]["projectId"], "p1");
    }

    proptest! {
        #[test]
        fn bars_stay_inside_grid(
            start_offset_hours in -2_000i64..4_000,
            length_hours in -500i64..5_000,
            idx in 0usize..4,
        ) {
            let window = TimeWindow::new(d(2025, 6, 1), WindowDuration::ALL[idx]);
            let days = build_day_columns(window.start_date, window.end_date());
            let start = at(2025, 6, 1) + Duration::hours(start_offset_hours);
            let e = event("p", start, start + Duration::hours(length_hours));
            let g = compute_bar_geometry(&e, window.start_date, &days);

            prop_assert!(g.offset_fraction >= 0.0);
            prop_assert!(g.end_fraction() <= 1.0 + 1e-12);
            prop_assert!(g.duration_days >= 1);
            prop_assert!(g.visible_start + g.visible_duration <= days.len());
        }

        #[test]
        fn every_keyed_event_lands_in_exactly_one_group(keys in proptest::collection::vec(proptest::option::of(0u8..5), 0..40)) {
            let base = at(2025, 6, 2);
            let events: Vec<_> = keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let e = event(&i.to_string(), base, base);
                    match key {
                        Some(k) => e.with_project(format!("p{k}"), format!("Project {k}")),
                        None => e,
                    }
                })
                .collect();
            let groups = group_events_by_project(&events);

            let grouped: usize = groups.iter().map(|g| g.events.len()).sum();
            prop_assert_eq!(grouped, keys.iter().filter(|k| k.is_some()).count());

            let mut seen = std::collections::HashSet::new();
            for group in &groups {
                for e in &group.events {
                    prop_assert!(seen.insert(e.id.clone()));
                }
            }
        }
    }
}

//! End-to-end timeline scenarios against the public API.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sitegrid_core::{
    build_day_columns, compute_bar_geometry, filter_events_in_range, group_events_by_project,
    layout_timeline, Navigation, Priority, ScheduleEvent, TimeWindow, TimelineView, ViewAction,
    WindowDuration,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(y: i32, m: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, 0, 0, 0).unwrap()
}

fn june_fortnight() -> TimeWindow {
    TimeWindow::new(d(2025, 6, 1), WindowDuration::Fortnight)
}

#[test]
fn fortnight_from_june_first_spans_fifteen_days() {
    let window = june_fortnight();
    assert_eq!(window.end_date(), d(2025, 6, 15));

    let columns = build_day_columns(window.start_date, window.end_date());
    assert_eq!(columns.len(), 15);
    assert_eq!(columns[0], d(2025, 6, 1));
    assert_eq!(columns[14], d(2025, 6, 15));
    for pair in columns.windows(2) {
        assert_eq!(pair[0].succ_opt(), Some(pair[1]));
    }
}

#[test]
fn three_day_event_sits_at_four_fifteenths() {
    let window = june_fortnight();
    let columns = build_day_columns(window.start_date, window.end_date());
    let event = ScheduleEvent::new("e", "Formwork", at(2025, 6, 5), at(2025, 6, 8));

    let geometry = compute_bar_geometry(&event, window.start_date, &columns);
    assert_eq!(geometry.start_day_index, 4);
    assert_eq!(geometry.duration_days, 3);
    assert_eq!(geometry.visible_start, 4);
    assert_eq!(geometry.visible_duration, 3);
    assert!((geometry.offset_fraction - 0.2667).abs() < 1e-3);
    assert!((geometry.width_fraction - 0.2).abs() < 1e-12);
}

/// Current behaviour: only the start day is tested against the window, so an
/// event running from before the window into it is not shown.
#[test]
fn event_starting_before_window_is_excluded_even_if_it_overlaps() {
    let window = june_fortnight();
    let event = ScheduleEvent::new("e", "Haul road", at(2025, 5, 20), at(2025, 6, 10))
        .with_project("p1", "Quarry");

    assert!(event.overlaps_days(window.start_date, window.end_date()));
    let filtered = filter_events_in_range(
        std::slice::from_ref(&event),
        window.start_date,
        window.end_date(),
    );
    assert!(filtered.is_empty());

    let layout = layout_timeline(&[event], &window, None);
    assert_eq!(layout.bar_count(), 0);
}

#[test]
fn zero_and_negative_durations_render_one_day_wide() {
    let window = june_fortnight();
    let columns = build_day_columns(window.start_date, window.end_date());
    let start = at(2025, 6, 10);

    for end in [start, start - Duration::hours(5), start - Duration::days(10)] {
        let event = ScheduleEvent::new("e", "Inspection", start, end);
        let geometry = compute_bar_geometry(&event, window.start_date, &columns);
        assert_eq!(geometry.duration_days, 1);
        assert!((geometry.width_fraction - 1.0 / 15.0).abs() < 1e-12);
    }
}

#[test]
fn grouping_preserves_first_seen_project_order() {
    let base = at(2025, 6, 2);
    let events = vec![
        ScheduleEvent::new("1", "Clear site", base, base).with_project("p-roads", "Roads"),
        ScheduleEvent::new("2", "Order steel", base, base).with_project("p-bridge", "Bridge"),
        ScheduleEvent::new("3", "Grade", base, base).with_project("p-roads", "Roads"),
        ScheduleEvent::new("4", "Unfiled", base, base),
        ScheduleEvent::new("5", "Pile test", base, base).with_project("p-bridge", "Bridge"),
    ];

    let groups = group_events_by_project(&events);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "Roads");
    assert_eq!(groups[1].name, "Bridge");

    let ids: Vec<Vec<&str>> = groups
        .iter()
        .map(|g| g.events.iter().map(|e| e.id.as_str()).collect())
        .collect();
    assert_eq!(ids, vec![vec!["1", "3"], vec!["2", "5"]]);
}

#[test]
fn paging_forward_then_back_restores_the_window() {
    let start = june_fortnight();
    for duration in WindowDuration::ALL {
        let window = start.apply(Navigation::ChangeDuration(duration));
        assert_eq!(window.next().previous(), window);
        assert_eq!(window.start_date, d(2025, 6, 1));
    }
}

#[test]
fn paging_changes_which_events_appear() {
    let events = vec![
        ScheduleEvent::new("a", "Excavate", at(2025, 6, 3), at(2025, 6, 20))
            .with_project("p1", "Depot")
            .with_priority(Priority::High),
        ScheduleEvent::new("b", "Backfill", at(2025, 6, 18), at(2025, 6, 19))
            .with_project("p1", "Depot"),
    ];

    let view = TimelineView::new(june_fortnight());
    let first = view.layout(&events, None);
    assert_eq!(first.bar_count(), 1);
    assert_eq!(first.groups[0].bars[0].event.id, "a");
    assert_eq!(first.groups[0].bars[0].geometry.visible_duration, 13);

    let next = view.reduce(ViewAction::Navigate(Navigation::Next));
    let second = next.layout(&events, None);
    assert_eq!(second.window_start, d(2025, 6, 15));
    assert_eq!(second.bar_count(), 1);
    assert_eq!(second.groups[0].bars[0].event.id, "b");
}

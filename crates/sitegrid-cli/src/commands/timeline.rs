//! Timeline commands for CLI.

use std::io::IsTerminal;

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use sitegrid_core::timeline::dates::{parse_date, start_of_week};
use sitegrid_core::{
    Config, EventDb, OverlapPolicy, Priority, TimeWindow, TimelineView, ViewAction,
    WindowDuration,
};

use crate::render::{render_timeline, ChartStyle};

#[derive(Subcommand)]
pub enum TimelineAction {
    /// Show the project Gantt for a date window
    Show {
        /// First visible day (YYYY-MM-DD, default: start of this week)
        #[arg(long)]
        start: Option<String>,
        /// Window length: 7, 14, 30 or 90 days
        #[arg(long)]
        days: Option<WindowDuration>,
        /// Page forward (positive) or back (negative) from the start
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        page: i64,
        /// Only show these priorities (repeatable)
        #[arg(long = "priority")]
        priorities: Vec<Priority>,
        /// Only show one project (ID or name)
        #[arg(long)]
        project: Option<String>,
        /// Only show events whose title contains TEXT
        #[arg(long)]
        search: Option<String>,
        /// Include events that started before the window but run into it
        #[arg(long)]
        overlap: bool,
        /// Day to highlight as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
        /// Output the layout as JSON
        #[arg(long)]
        json: bool,
        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },
}

pub fn run(action: TimelineAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimelineAction::Show {
            start,
            days,
            page,
            priorities,
            project,
            search,
            overlap,
            today,
            json,
            no_color,
        } => {
            let config = Config::load()?;
            let today = match today {
                Some(day) => parse_date(&day)?,
                None => Local::now().date_naive(),
            };
            let start = match start {
                Some(day) => parse_date(&day)?,
                None => start_of_week(today, config.timeline.week_starts_monday),
            };
            let duration = days.unwrap_or(config.timeline.default_duration_days);
            let policy = if overlap {
                OverlapPolicy::AnyOverlap
            } else {
                config.timeline.overlap_policy
            };

            let view = build_view(start, duration, page, policy)
                .reduce(ViewAction::SetPriorityFilter(priorities))
                .reduce(ViewAction::SetProjectFilter(project))
                .reduce(ViewAction::SetSearch(search));

            let db = EventDb::open()?;
            let events = db.list_events_overlapping(view.window.start_date, view.window.end_date())?;
            tracing::debug!(
                fetched = events.len(),
                start = %view.window.start_date,
                days = view.window.duration.days(),
                "timeline fetch"
            );

            let layout = view.layout(&events, Some(today));
            if json {
                println!("{}", serde_json::to_string_pretty(&layout)?);
            } else {
                let mut style = ChartStyle::from_config(&config.render, &config.priority_colors);
                style.color = style.color && !no_color && std::io::stdout().is_terminal();
                print!("{}", render_timeline(&layout, &style));
            }
        }
    }
    Ok(())
}

fn build_view(
    start: NaiveDate,
    duration: WindowDuration,
    page: i64,
    policy: OverlapPolicy,
) -> TimelineView {
    let window = TimeWindow::new(start, duration).paged(page);
    TimelineView::new(window).reduce(ViewAction::SetOverlapPolicy(policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_moves_by_whole_windows() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let view = build_view(start, WindowDuration::Week, -2, OverlapPolicy::StartWithinWindow);
        assert_eq!(view.window.start_date, NaiveDate::from_ymd_opt(2025, 5, 18).unwrap());
        assert_eq!(view.window.duration, WindowDuration::Week);
    }
}

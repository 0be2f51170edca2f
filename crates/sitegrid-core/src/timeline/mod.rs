//! Project timeline (Gantt) layout.
//!
//! This module provides:
//! - Schedule events and their priority tags
//! - The visible date window and its navigation
//! - Day columns, range filtering, project grouping and bar geometry
//! - An explicit view-state value that ties window and filters together

mod columns;
pub mod dates;
mod event;
mod layout;
pub mod view;
mod window;

pub use columns::{build_day_columns, DayColumn};
pub use event::{Priority, ScheduleEvent};
pub use layout::{
    compute_bar_geometry, filter_events_in_range, filter_events_with_policy,
    group_events_by_project, layout_timeline, layout_timeline_with, BarGeometry, OverlapPolicy,
    PositionedBar, PositionedGroup, ProjectGroup, TimelineLayout,
};
pub use view::{TimelineView, ViewAction, ViewFilters};
pub use window::{Navigation, TimeWindow, WindowDuration};

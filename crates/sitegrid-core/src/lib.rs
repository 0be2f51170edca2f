//! # SiteGrid Core Library
//!
//! Core logic behind the SiteGrid project schedule. Everything the CLI shows
//! is computed here; the binary only parses arguments and prints.
//!
//! ## Architecture
//!
//! - **Timeline**: a pure layout engine that turns schedule events and a
//!   visible date window into day columns, project rows and bar geometry
//! - **View state**: window plus filters as one explicit value, advanced by
//!   reducing actions
//! - **Storage**: SQLite-backed event store with change subscriptions and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`layout_timeline`]: events + window to render geometry
//! - [`TimelineView`]: window and filter state
//! - [`EventDb`]: local event data source
//! - [`Config`]: application configuration management

pub mod error;
pub mod storage;
pub mod timeline;

pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use storage::{ChangeEvent, ChangeKind, Config, EventDb, Subscription};
pub use timeline::{
    build_day_columns, compute_bar_geometry, filter_events_in_range, group_events_by_project,
    layout_timeline, BarGeometry, DayColumn, Navigation, OverlapPolicy, Priority, ProjectGroup,
    ScheduleEvent, TimeWindow, TimelineLayout, TimelineView, ViewAction, ViewFilters,
    WindowDuration,
};

//! SQLite-based storage for schedule events.
//!
//! This is the local stand-in for the application's event data source. It
//! hands out plain `Vec<ScheduleEvent>` snapshots for the layout engine and
//! notifies subscribers after every successful mutation.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::changes::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
use super::data_dir;
use super::migrations;
use crate::error::{DatabaseError, Result};
use crate::timeline::dates::midnight_utc;
use crate::timeline::{Priority, ScheduleEvent};

const EVENT_COLUMNS: &str = "id, title, description, start_date, end_date, project_id, \
                             project_name, priority, location, tags";

/// Fixed-width RFC 3339 (nanoseconds, `Z`), so text order is time order and
/// nothing is lost on a round trip.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_datetime(index: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Unknown labels fall back to medium rather than failing the whole read.
fn parse_priority(value: &str) -> Priority {
    value.parse().unwrap_or_default()
}

fn row_to_event(row: &rusqlite::Row) -> Result<ScheduleEvent, rusqlite::Error> {
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    let priority: String = row.get(7)?;
    let tags: String = row.get(9)?;
    let tags = serde_json::from_str(&tags).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ScheduleEvent {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_date: parse_datetime(3, &start)?,
        end_date: parse_datetime(4, &end)?,
        project_id: row.get(5)?,
        project_name: row.get(6)?,
        priority: parse_priority(&priority),
        location: row.get(8)?,
        tags,
    })
}

/// SQLite database for schedule events.
pub struct EventDb {
    conn: Connection,
    changes: ChangeFeed,
}

impl EventDb {
    /// Open the event database at `<data_dir>/sitegrid.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("sitegrid.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened event store");
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn,
            changes: ChangeFeed::new(),
        })
    }

    /// Register a callback fired after each successful mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.changes.subscribe(callback)
    }

    fn notify(&self, kind: ChangeKind, event_id: Option<&str>) {
        self.changes.notify(&ChangeEvent {
            kind,
            event_id: event_id.map(str::to_string),
        });
    }

    fn write_event(&self, event: &ScheduleEvent, upsert: bool) -> Result<(), rusqlite::Error> {
        let tags = serde_json::to_string(&event.tags).unwrap_or_else(|_| "[]".to_string());
        let sql = if upsert {
            "INSERT INTO events (id, title, description, start_date, end_date, project_id,
                                 project_name, priority, location, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                project_id = excluded.project_id,
                project_name = excluded.project_name,
                priority = excluded.priority,
                location = excluded.location,
                tags = excluded.tags"
        } else {
            "INSERT INTO events (id, title, description, start_date, end_date, project_id,
                                 project_name, priority, location, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        };
        self.conn.execute(
            sql,
            params![
                event.id,
                event.title,
                event.description,
                format_datetime(&event.start_date),
                format_datetime(&event.end_date),
                event.project_id,
                event.project_name,
                event.priority.as_str(),
                event.location,
                tags,
            ],
        )?;
        Ok(())
    }

    /// Insert a new event.
    ///
    /// # Errors
    /// Fails with [`DatabaseError::DuplicateEvent`] if the id is taken.
    pub fn insert_event(&self, event: &ScheduleEvent) -> Result<()> {
        if self.exists(&event.id)? {
            return Err(DatabaseError::DuplicateEvent(event.id.clone()).into());
        }
        self.write_event(event, false)?;
        tracing::info!(event_id = %event.id, "event inserted");
        self.notify(ChangeKind::Inserted, Some(&event.id));
        Ok(())
    }

    /// Insert or replace an event by id.
    pub fn upsert_event(&self, event: &ScheduleEvent) -> Result<()> {
        let existed = self.exists(&event.id)?;
        self.write_event(event, true)?;
        let kind = if existed {
            ChangeKind::Updated
        } else {
            ChangeKind::Inserted
        };
        tracing::info!(event_id = %event.id, ?kind, "event upserted");
        self.notify(kind, Some(&event.id));
        Ok(())
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM events WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_event(&self, id: &str) -> Result<Option<ScheduleEvent>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
        let event = self
            .conn
            .query_row(&sql, params![id], row_to_event)
            .optional()?;
        Ok(event)
    }

    /// All events, ordered by start then insertion.
    pub fn list_events(&self) -> Result<Vec<ScheduleEvent>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY start_date ASC, rowid ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let events = stmt
            .query_map([], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Events touching any day of `[first, last]`.
    ///
    /// This is a superset of what any layout policy keeps for that window,
    /// so callers can narrow the fetch without changing the result.
    pub fn list_events_overlapping(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ScheduleEvent>> {
        let lower = format_datetime(&midnight_utc(first));
        let upper = match last.succ_opt() {
            Some(next) => format_datetime(&midnight_utc(next)),
            None => format_datetime(&DateTime::<Utc>::MAX_UTC),
        };
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE start_date < ?2 AND MAX(start_date, end_date) >= ?1
             ORDER BY start_date ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let events = stmt
            .query_map(params![lower, upper], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn count_events(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete an event. Returns whether a row was removed.
    pub fn delete_event(&self, id: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if removed > 0 {
            tracing::info!(event_id = %id, "event deleted");
            self.notify(ChangeKind::Deleted, Some(id));
        }
        Ok(removed > 0)
    }

    /// Upsert every event of a JSON array in one transaction.
    ///
    /// Events without an id get a generated one. Subscribers get a single
    /// [`ChangeKind::Imported`] notification.
    pub fn import_json(&self, json: &str) -> Result<usize> {
        let mut events: Vec<ScheduleEvent> = serde_json::from_str(json)?;
        for event in events.iter_mut().filter(|e| e.id.trim().is_empty()) {
            event.id = ScheduleEvent::generate_id();
        }
        let tx = self.conn.unchecked_transaction()?;
        for event in &events {
            self.write_event(event, true)?;
        }
        tx.commit()?;
        tracing::info!(count = events.len(), "events imported");
        self.notify(ChangeKind::Imported, None);
        Ok(events.len())
    }

    /// Every event as a pretty JSON array, importable with [`import_json`](Self::import_json).
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.list_events()?)?)
    }

    /// [`import_json`](Self::import_json) from a file.
    pub fn import_file(&self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        self.import_json(&json)
    }

    /// Write [`export_json`](Self::export_json) to a file, returning the event count.
    pub fn export_file(&self, path: &Path) -> Result<usize> {
        let events = self.list_events()?;
        std::fs::write(path, serde_json::to_string_pretty(&events)?)?;
        tracing::info!(path = %path.display(), count = events.len(), "events exported");
        Ok(events.len())
    }
}

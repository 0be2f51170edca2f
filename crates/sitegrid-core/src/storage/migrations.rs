//! Database schema migrations for the event store.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    if current_version < CURRENT_SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = CURRENT_SCHEMA_VERSION,
            "event store schema migrated"
        );
    }
    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version, 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: events table.
///
/// Timestamps are stored as RFC 3339 UTC with a `Z` suffix. Since v3 they
/// always carry nine fractional digits, so string comparison orders them
/// chronologically.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS events (
            id           TEXT PRIMARY KEY,
            title        TEXT NOT NULL,
            description  TEXT,
            start_date   TEXT NOT NULL,
            end_date     TEXT NOT NULL,
            project_id   TEXT,
            project_name TEXT,
            priority     TEXT NOT NULL DEFAULT 'medium'
        );

        CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_date);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: site location and tags.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "ALTER TABLE events ADD COLUMN location TEXT;
         ALTER TABLE events ADD COLUMN tags TEXT NOT NULL DEFAULT '[]';",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: widen second-precision timestamps to nanoseconds.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "UPDATE events SET start_date = substr(start_date, 1, 19) || '.000000000Z'
         WHERE length(start_date) = 20 AND substr(start_date, 20, 1) = 'Z';
         UPDATE events SET end_date = substr(end_date, 1, 19) || '.000000000Z'
         WHERE length(end_date) = 20 AND substr(end_date, 20, 1) = 'Z';",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}

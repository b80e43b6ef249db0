//! Task schema definition and idempotent initialization.
//!
//! # Responsibility
//! - Create the `statuses` catalog and the `tasks` table.
//! - Seed the fixed status set without overwriting existing rows.
//!
//! # Invariants
//! - `initialize` is safe to run on every process start.
//! - Seeding is insert-if-absent; existing status rows are never touched.
//! - `tasks.status_id` references `statuses.id`.

use crate::db::{DbError, DbResult};
use crate::model::task::TaskStatus;
use log::debug;
use rusqlite::{params, Connection};

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_STATUSES_TABLE: &str = "CREATE TABLE IF NOT EXISTS statuses (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE
);";

const INSERT_STATUS_IF_ABSENT: &str = "INSERT OR IGNORE INTO statuses (id, name) VALUES (?1, ?2);";

const CREATE_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    dateTime TEXT NOT NULL,
    location TEXT,
    status_id TEXT NOT NULL,
    createdAt TEXT NOT NULL,
    FOREIGN KEY (status_id) REFERENCES statuses(id)
);
CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(createdAt);";

/// Creates and seeds the schema inside one transaction.
///
/// Rejects databases stamped by a newer binary instead of guessing at
/// their layout.
pub fn initialize(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_STATUSES_TABLE)?;
    let mut seeded = 0;
    for status in TaskStatus::ALL {
        seeded += tx.execute(
            INSERT_STATUS_IF_ABSENT,
            params![status.as_str(), status.display_name()],
        )?;
    }
    tx.execute_batch(CREATE_TASKS_TABLE)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    debug!("event=schema_init module=db status=ok version={SCHEMA_VERSION} seeded_statuses={seeded}");
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

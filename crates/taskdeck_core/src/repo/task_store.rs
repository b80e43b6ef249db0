//! SQLite task store.
//!
//! # Responsibility
//! - Execute parameterized CRUD and filter queries over `tasks`.
//! - Map joined rows (`tasks` + `statuses.name`) to `Task` records.
//!
//! # Invariants
//! - Reads always join through `tasks.status_id -> statuses.id`.
//! - Listings are ordered by `createdAt ASC`, insertion order for ties.
//! - Rows carrying a status outside the catalog are rejected, not coerced.

use crate::db::schema::{current_user_version, SCHEMA_VERSION};
use crate::model::task::{StatusRecord, Task, TaskFilter, TaskId, TaskStatus};
use crate::repo::task_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    tasks.id AS id,
    tasks.title AS title,
    tasks.description AS description,
    tasks.dateTime AS dateTime,
    tasks.location AS location,
    statuses.name AS status,
    tasks.createdAt AS createdAt
FROM tasks
JOIN statuses ON tasks.status_id = statuses.id";

const TASK_ORDER_SQL: &str = "ORDER BY tasks.createdAt ASC, tasks.rowid ASC";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("statuses", &["id", "name"]),
    (
        "tasks",
        &[
            "id",
            "title",
            "description",
            "dateTime",
            "location",
            "status_id",
            "createdAt",
        ],
    ),
];

/// Synchronous task store bound to one initialized connection.
pub struct TaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TaskStore<'conn> {
    /// Binds the store after checking the connection carries the task schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `schema::initialize` never ran.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for foreign layouts.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Binds without schema checks. Callers must have run `try_new` on the
    /// same connection before.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists tasks, optionally restricted by an exact-match filter.
    pub fn list_all(&self, filter: Option<&TaskFilter>) -> RepoResult<Vec<Task>> {
        let (sql, value) = match filter {
            None => (format!("{TASK_SELECT_SQL} {TASK_ORDER_SQL};"), None),
            Some(TaskFilter::Status(status)) => (
                format!("{TASK_SELECT_SQL} WHERE statuses.name = ?1 {TASK_ORDER_SQL};"),
                Some(status.display_name().to_string()),
            ),
            Some(TaskFilter::Date(date_time)) => (
                format!("{TASK_SELECT_SQL} WHERE tasks.dateTime = ?1 {TASK_ORDER_SQL};"),
                Some(date_time.clone()),
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match value {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    /// Gets one task by id. A missing id yields `Ok(None)`.
    pub fn get_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE tasks.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?)),
            None => Ok(None),
        }
    }

    /// Inserts a new task row and returns its id.
    ///
    /// Empty `id` / `created_at` are defaulted first. Duplicate ids and
    /// unknown statuses fail with an engine constraint violation.
    pub fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;
        let task = task.with_defaults();

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                dateTime,
                location,
                status_id,
                createdAt
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                task.id.as_str(),
                task.title.as_str(),
                task.description.as_deref(),
                task.date_time.as_str(),
                task.location.as_deref(),
                task.status.as_str(),
                task.created_at.as_str(),
            ],
        )?;

        Ok(task.id)
    }

    /// Overwrites every mutable field of the row matching `task.id`.
    ///
    /// `id` and `createdAt` are never written. Returns the affected row
    /// count; zero for an unknown id.
    pub fn update_fields(&self, task: &Task) -> RepoResult<usize> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                dateTime = ?3,
                location = ?4,
                status_id = ?5
             WHERE id = ?6;",
            params![
                task.title.as_str(),
                task.description.as_deref(),
                task.date_time.as_str(),
                task.location.as_deref(),
                task.status.as_str(),
                task.id.as_str(),
            ],
        )?;
        Ok(changed)
    }

    /// Overwrites only the status reference. Zero rows for an unknown id.
    pub fn update_status(&self, id: &str, status: TaskStatus) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status_id = ?1 WHERE id = ?2;",
            params![status.as_str(), id],
        )?;
        Ok(changed)
    }

    /// Hard-deletes the row. Zero rows for an unknown id.
    pub fn delete(&self, id: &str) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(changed)
    }

    /// Lists the status catalog in seed order.
    pub fn list_statuses(&self) -> RepoResult<Vec<StatusRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM statuses ORDER BY rowid ASC;")?;
        let statuses = stmt
            .query_map([], |row| {
                Ok(StatusRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(statuses)
    }

    /// Counts task rows.
    pub fn count(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get::<_, i64>(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Deletes every task row. Statuses are left intact.
    pub fn clear_all(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM tasks;", [])?)
    }
}

/// Maps one joined row to a `Task`.
///
/// Expects the projection of `TASK_SELECT_SQL`.
pub fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in statuses.name"))
    })?;

    let title: Option<String> = row.get("title")?;
    let title = title
        .ok_or_else(|| RepoError::InvalidData("null title in tasks.title".to_string()))?;

    Ok(Task {
        id: row.get("id")?,
        title,
        description: row.get("description")?,
        date_time: row.get("dateTime")?,
        location: row.get("location")?,
        status,
        created_at: row.get("createdAt")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    if actual_version < SCHEMA_VERSION {
        return Err(RepoError::UninitializedConnection {
            expected_version: SCHEMA_VERSION,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

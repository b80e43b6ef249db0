//! Task repository contract and SQLite-backed implementation.
//!
//! # Responsibility
//! - Define the async capability interface the controller depends on.
//! - Run `TaskStore` calls off the async executor, one at a time.
//!
//! # Invariants
//! - Store calls are serialized through one connection mutex; nothing is
//!   pipelined against the engine.
//! - Errors surface unchanged from the store; missing ids are values.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::task::{StatusRecord, Task, TaskFilter, TaskId, TaskStatus, TaskValidationError};
use crate::repo::task_store::TaskStore;
use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every backend.
#[derive(Debug)]
pub enum RepoError {
    /// Task failed write-side validation before reaching storage.
    Validation(TaskValidationError),
    /// Engine or connection failure, including constraint violations.
    Db(DbError),
    /// A second task with an existing id (non-SQL backends).
    DuplicateId(TaskId),
    /// Persisted data could not be mapped back to a `Task`.
    InvalidData(String),
    /// Connection was handed over before `schema::initialize` ran.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Backend could not run the operation at all (worker or lock failure).
    Unavailable(String),
}

impl RepoError {
    /// Duplicate id, blank title, unknown status and friends.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Validation(_) | Self::DuplicateId(_) => true,
            Self::Db(err) => err.is_constraint_violation(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "task id already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::Unavailable(message) => write!(f, "task store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage-agnostic task operations consumed by the controller.
///
/// Initialization happens when a backend is constructed, never through
/// this trait.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Lists tasks by `createdAt` ascending, optionally filtered.
    async fn list_all(&self, filter: Option<&TaskFilter>) -> RepoResult<Vec<Task>>;
    /// `Ok(None)` when no task has this id.
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Task>>;
    /// Persists a new task, defaulting empty id/createdAt. Returns the id.
    async fn insert(&self, task: &Task) -> RepoResult<TaskId>;
    /// Overwrites mutable fields; silent no-op for an unknown id.
    async fn update_fields(&self, task: &Task) -> RepoResult<()>;
    /// Overwrites the status only; silent no-op for an unknown id.
    async fn update_status(&self, id: &str, status: TaskStatus) -> RepoResult<()>;
    /// Hard delete; silent no-op for an unknown id.
    async fn delete(&self, id: &str) -> RepoResult<()>;
}

#[async_trait]
impl<R: TaskRepository + ?Sized> TaskRepository for Arc<R> {
    async fn list_all(&self, filter: Option<&TaskFilter>) -> RepoResult<Vec<Task>> {
        (**self).list_all(filter).await
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        (**self).get_by_id(id).await
    }

    async fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        (**self).insert(task).await
    }

    async fn update_fields(&self, task: &Task) -> RepoResult<()> {
        (**self).update_fields(task).await
    }

    async fn update_status(&self, id: &str, status: TaskStatus) -> RepoResult<()> {
        (**self).update_status(id, status).await
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        (**self).delete(id).await
    }
}

/// SQLite-backed repository.
///
/// Owns one initialized connection; each call runs on the blocking pool.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskRepository {
    /// Opens (or creates) the database file and initializes the schema.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already initialized connection.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        TaskStore::try_new(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lists the seeded status catalog.
    pub async fn list_statuses(&self) -> RepoResult<Vec<StatusRecord>> {
        self.run("list_statuses", |store| store.list_statuses())
            .await
    }

    /// Counts persisted tasks.
    pub async fn count(&self) -> RepoResult<u64> {
        self.run("count", |store| store.count()).await
    }

    /// Deletes every task. Statuses are kept.
    pub async fn clear_all(&self) -> RepoResult<()> {
        self.run("clear_all", |store| store.clear_all().map(|_| ()))
            .await
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&TaskStore<'_>) -> RepoResult<T> + Send + 'static,
    {
        let started_at = Instant::now();
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))?;
            f(&TaskStore::new_unchecked(&conn))
        })
        .await
        .map_err(|err| RepoError::Unavailable(format!("store worker failed: {err}")))
        .and_then(|result| result);

        match &result {
            Ok(_) => debug!(
                "event=task_store_op module=repo status=ok op={op} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=task_store_op module=repo status=error op={op} duration_ms={} constraint={} error={err}",
                started_at.elapsed().as_millis(),
                err.is_constraint_violation()
            ),
        }
        result
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn list_all(&self, filter: Option<&TaskFilter>) -> RepoResult<Vec<Task>> {
        let filter = filter.cloned();
        self.run("list_all", move |store| store.list_all(filter.as_ref()))
            .await
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        let id = id.to_string();
        self.run("get_by_id", move |store| store.get_by_id(&id))
            .await
    }

    async fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        let task = task.clone();
        self.run("insert", move |store| store.insert(&task)).await
    }

    async fn update_fields(&self, task: &Task) -> RepoResult<()> {
        let task = task.clone();
        self.run("update_fields", move |store| {
            store.update_fields(&task).map(|_| ())
        })
        .await
    }

    async fn update_status(&self, id: &str, status: TaskStatus) -> RepoResult<()> {
        let id = id.to_string();
        self.run("update_status", move |store| {
            store.update_status(&id, status).map(|_| ())
        })
        .await
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        let id = id.to_string();
        self.run("delete", move |store| store.delete(&id).map(|_| ()))
            .await
    }
}

//! In-memory task repository.
//!
//! Honours the same contract as the SQLite backend: validation before
//! writes, duplicate-id rejection, silent no-ops for unknown ids and
//! `createdAt` ordering with insertion order for ties. Used by tests and by
//! callers that do not need durability.

use crate::model::task::{Task, TaskFilter, TaskId, TaskStatus};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Volatile task repository backed by a `Vec` in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks.
    ///
    /// Reads through a poisoned lock: the count is still accurate even though
    /// repository operations report the store as unavailable.
    pub fn len(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Vec<Task>>> {
        self.tasks
            .lock()
            .map_err(|_| RepoError::Unavailable("in-memory task list lock poisoned".to_string()))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_all(&self, filter: Option<&TaskFilter>) -> RepoResult<Vec<Task>> {
        let tasks = self.lock()?;
        let mut listed = tasks
            .iter()
            .filter(|task| match filter {
                None => true,
                Some(TaskFilter::Status(status)) => task.status == *status,
                Some(TaskFilter::Date(date_time)) => task.date_time == *date_time,
            })
            .cloned()
            .collect::<Vec<_>>();
        // Stable sort keeps insertion order for equal timestamps.
        listed.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(listed)
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        let tasks = self.lock()?;
        Ok(tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;
        let task = task.with_defaults();

        let mut tasks = self.lock()?;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(RepoError::DuplicateId(task.id));
        }
        let id = task.id.clone();
        tasks.push(task);
        Ok(id)
    }

    async fn update_fields(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let mut tasks = self.lock()?;
        if let Some(existing) = tasks.iter_mut().find(|existing| existing.id == task.id) {
            existing.title = task.title.clone();
            existing.description = task.description.clone();
            existing.date_time = task.date_time.clone();
            existing.location = task.location.clone();
            existing.status = task.status;
        }
        Ok(())
    }

    async fn update_status(&self, id: &str, status: TaskStatus) -> RepoResult<()> {
        let mut tasks = self.lock()?;
        if let Some(existing) = tasks.iter_mut().find(|existing| existing.id == id) {
            existing.status = status;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        self.lock()?.retain(|task| task.id != id);
        Ok(())
    }
}

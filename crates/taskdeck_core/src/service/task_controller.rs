//! Reactive task controller.
//!
//! # Responsibility
//! - Hold the authoritative list of visible tasks plus loading/error flags
//!   and the active filter.
//! - Turn UI commands into repository calls and republish state.
//!
//! # Invariants
//! - Every successful mutation is followed by a full reload; the list is
//!   never patched locally.
//! - A failed command leaves the task list exactly as it was and records a
//!   non-empty error message.
//! - Repository failures never escape a command.
//! - `loading` is a flag, not a counter: with overlapping commands the last
//!   one to finish decides the final loading/error state.

use crate::model::task::{Task, TaskFilter, TaskStatus};
use crate::repo::task_repo::{RepoError, TaskRepository};
use log::{info, warn};
use serde::Serialize;
use std::fmt::Display;
use tokio::sync::watch;

pub const LOAD_TASKS_FAILED: &str = "Failed to load tasks";
pub const ADD_TASK_FAILED: &str = "Failed to add task";
pub const UPDATE_TASK_FAILED: &str = "Failed to update task";
pub const UPDATE_TASK_STATUS_FAILED: &str = "Failed to update task status";
pub const DELETE_TASK_FAILED: &str = "Failed to delete task";

/// Published controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskListState {
    /// Tasks in repository order.
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: Option<TaskFilter>,
}

impl TaskListState {
    /// Active status filter, if any.
    pub fn status_filter(&self) -> Option<TaskStatus> {
        match &self.filter {
            Some(TaskFilter::Status(status)) => Some(*status),
            _ => None,
        }
    }

    /// Active date filter, if any.
    pub fn date_filter(&self) -> Option<&str> {
        match &self.filter {
            Some(TaskFilter::Date(date_time)) => Some(date_time.as_str()),
            _ => None,
        }
    }
}

/// Command surface over a task repository with publish-on-change state.
pub struct TaskController<R: TaskRepository> {
    repo: R,
    state: watch::Sender<TaskListState>,
}

impl<R: TaskRepository> TaskController<R> {
    /// Creates a controller with an empty, unfiltered state.
    ///
    /// Nothing is loaded until `load` (or a command) runs.
    pub fn new(repo: R) -> Self {
        let (state, _) = watch::channel(TaskListState::default());
        Self { repo, state }
    }

    /// Read access to the injected repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Subscribes to state changes. Each publish marks the receiver changed.
    pub fn subscribe(&self) -> watch::Receiver<TaskListState> {
        self.state.subscribe()
    }

    /// Clones the current published state.
    pub fn snapshot(&self) -> TaskListState {
        self.state.borrow().clone()
    }

    /// Reloads the list under the active filter.
    ///
    /// On failure the previous list stays published and `error` is set.
    pub async fn load(&self) {
        self.begin();
        let filter = self.state.borrow().filter.clone();
        match self.repo.list_all(filter.as_ref()).await {
            Ok(tasks) => {
                let count = tasks.len();
                self.state.send_modify(|state| {
                    state.tasks = tasks;
                    state.loading = false;
                    state.error = None;
                });
                info!(
                    "event=tasks_load module=controller status=ok filter={} count={count}",
                    filter_label(filter.as_ref())
                );
            }
            Err(err) => self.fail("tasks_load", &err, LOAD_TASKS_FAILED),
        }
    }

    /// Inserts a task, then reloads.
    pub async fn add(&self, task: Task) {
        self.begin();
        match self.repo.insert(&task).await {
            Ok(id) => {
                info!("event=task_add module=controller status=ok task_id={id}");
                self.load().await;
            }
            Err(err) => self.fail("task_add", &err, ADD_TASK_FAILED),
        }
    }

    /// Overwrites every mutable field of a task, then reloads.
    pub async fn update_full(&self, task: Task) {
        self.begin();
        match self.repo.update_fields(&task).await {
            Ok(()) => {
                info!(
                    "event=task_update module=controller status=ok task_id={}",
                    task.id
                );
                self.load().await;
            }
            Err(err) => self.fail("task_update", &err, UPDATE_TASK_FAILED),
        }
    }

    /// Changes only a task's status, then reloads.
    pub async fn update_status_only(&self, id: &str, status: TaskStatus) {
        self.begin();
        match self.repo.update_status(id, status).await {
            Ok(()) => {
                info!(
                    "event=task_update_status module=controller status=ok task_id={id} task_status={status}"
                );
                self.load().await;
            }
            Err(err) => self.fail("task_update_status", &err, UPDATE_TASK_STATUS_FAILED),
        }
    }

    /// Deletes a task, then reloads.
    pub async fn remove(&self, id: &str) {
        self.begin();
        match self.repo.delete(id).await {
            Ok(()) => {
                info!("event=task_delete module=controller status=ok task_id={id}");
                self.load().await;
            }
            Err(err) => self.fail("task_delete", &err, DELETE_TASK_FAILED),
        }
    }

    /// Sets (or clears with `None`) the status filter and reloads.
    ///
    /// Clears any date filter.
    pub async fn set_status_filter(&self, status: Option<TaskStatus>) {
        self.apply_filter(status.map(TaskFilter::Status)).await;
    }

    /// Sets (or clears with `None`) the date filter and reloads.
    ///
    /// Clears any status filter. A blank value clears the filter too.
    pub async fn set_date_filter(&self, date_time: Option<String>) {
        self.apply_filter(date_time.map(TaskFilter::Date)).await;
    }

    /// Drops every filter and reloads.
    pub async fn clear_filters(&self) {
        self.apply_filter(None).await;
    }

    /// Finds a task in the published list without touching the repository.
    pub fn lookup_local(&self, id: &str) -> Option<Task> {
        self.state
            .borrow()
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
    }

    async fn apply_filter(&self, filter: Option<TaskFilter>) {
        let filter = filter.filter(|filter| match filter {
            TaskFilter::Date(value) => !value.trim().is_empty(),
            TaskFilter::Status(_) => true,
        });
        self.state.send_modify(|state| state.filter = filter);
        self.load().await;
    }

    fn begin(&self) {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    fn fail(&self, event: &str, err: &RepoError, fallback: &str) {
        warn!(
            "event={event} module=controller status=error constraint={} error={err}",
            err.is_constraint_violation()
        );
        let message = error_message(err, fallback);
        self.state.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
        });
    }
}

/// Uses the failure's own message, or `fallback` when it has none.
fn error_message(err: &impl Display, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn filter_label(filter: Option<&TaskFilter>) -> &'static str {
    match filter {
        None => "none",
        Some(TaskFilter::Status(_)) => "status",
        Some(TaskFilter::Date(_)) => "date",
    }
}

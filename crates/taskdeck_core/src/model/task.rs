//! Task domain model.
//!
//! # Responsibility
//! - Define the task record shared by storage, repository and controller.
//! - Define the status catalog and listing filters.
//! - Validate write-side invariants before anything reaches SQL.
//!
//! # Invariants
//! - `title` is never blank.
//! - `date_time` is never blank. It is an ISO-8601 string stored verbatim.
//! - `created_at` is assigned once at creation and never rewritten.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a task row.
pub type TaskId = String;

/// Lifecycle state of a task.
///
/// Mirrors the seeded `statuses` table: the stable key and the display name
/// are the same snake_case string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work is in progress. Default for new tasks.
    #[default]
    InProgress,
    /// Finished.
    Completed,
    /// Dropped and will not be completed.
    Cancelled,
}

impl TaskStatus {
    /// Every seeded status, in catalog order.
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// Stable key stored in `statuses.id` and `tasks.status_id`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Display name stored in `statuses.name`.
    pub fn display_name(self) -> &'static str {
        self.as_str()
    }

    /// Parses a stable key or display name. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value || status.display_name() == value)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One row of the status catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: String,
    pub name: String,
}

/// Exact-match restriction applied when listing tasks.
///
/// Status and date filters are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum TaskFilter {
    /// Match on the status display name.
    Status(TaskStatus),
    /// Match on the exact scheduled date-time string.
    Date(String),
}

/// Task record as persisted and as published to UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Empty means "generate on insert".
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Scheduled date-time as entered, e.g. `2024-06-01` or
    /// `2024-06-01T10:00:00`. Compared by exact string equality.
    pub date_time: String,
    pub location: Option<String>,
    pub status: TaskStatus,
    /// Creation timestamp. Empty means "stamp on insert".
    pub created_at: String,
}

impl Task {
    /// Creates an `in_progress` task with a generated id and creation time.
    pub fn new(title: impl Into<String>, date_time: impl Into<String>) -> Self {
        Self {
            id: generate_task_id(),
            title: title.into(),
            description: None,
            date_time: date_time.into(),
            location: None,
            status: TaskStatus::default(),
            created_at: now_timestamp(),
        }
    }

    /// Builder-style description setter.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder-style location setter.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Checks write-side invariants.
    ///
    /// The date-time is not parsed: any non-blank ISO-8601 form is kept as
    /// given. Empty `id` and `created_at` are accepted because the store
    /// defaults them on insert.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.date_time.trim().is_empty() {
            return Err(TaskValidationError::EmptyDateTime);
        }
        Ok(())
    }

    /// Returns a copy with `id` and `created_at` filled in when absent.
    pub fn with_defaults(&self) -> Self {
        let mut task = self.clone();
        if task.id.trim().is_empty() {
            task.id = generate_task_id();
        }
        if task.created_at.trim().is_empty() {
            task.created_at = now_timestamp();
        }
        task
    }
}

/// Write-side validation failure for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    EmptyDateTime,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::EmptyDateTime => write!(f, "task dateTime must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Generates a new globally unique task id.
pub fn generate_task_id() -> TaskId {
    Uuid::new_v4().to_string()
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Fixed width, so lexical order matches chronological order in SQL.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! Core task persistence and reactive state for taskdeck.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{StatusRecord, Task, TaskFilter, TaskId, TaskStatus, TaskValidationError};
pub use repo::memory_repo::InMemoryTaskRepository;
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use repo::task_store::TaskStore;
pub use service::task_controller::{TaskController, TaskListState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

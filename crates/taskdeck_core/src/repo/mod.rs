//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the async task repository contract consumed by services.
//! - Isolate SQLite query details from controller orchestration.
//!
//! # Invariants
//! - Write paths must call `Task::validate()` before persistence.
//! - Targeting a missing id is never an error: reads return `None`,
//!   writes affect zero rows.

pub mod memory_repo;
pub mod task_repo;
pub mod task_store;

//! Task domain model and status catalog.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own the closed set of task statuses seeded into storage.
//!
//! # Invariants
//! - Every task is identified by a stable string id that is never reused.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;

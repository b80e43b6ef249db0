//! Runtime configuration resolved from the environment.
//!
//! Recognized variables:
//! - `TASKDECK_DB_PATH`: SQLite file; defaults to `<tmp>/taskdeck.sqlite3`.
//! - `TASKDECK_LOG_LEVEL`: `trace|debug|info|warn|error`; defaults per build mode.
//! - `TASKDECK_LOG_DIR`: absolute log directory; logging stays off when unset.
//!
//! Blank values are treated as unset.

use crate::logging::{LogLevel, LoggingError};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "TASKDECK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "TASKDECK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "TASKDECK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "taskdeck.sqlite3";

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`, which maps a variable name to
    /// its raw value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_level = match read(LOG_LEVEL_VAR) {
            Some(raw) => LogLevel::parse(&raw)?,
            None => LogLevel::build_default(),
        };
        let log_dir = read(LOG_DIR_VAR).map(PathBuf::from);

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}

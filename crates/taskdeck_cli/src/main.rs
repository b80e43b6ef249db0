//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskdeck_core` wiring: config, logging, storage, controller.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use taskdeck_core::{init_logging, CoreConfig, SqliteTaskRepository, TaskController, TaskStatus};

#[tokio::main]
async fn main() -> ExitCode {
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level.as_str(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let repo = match SqliteTaskRepository::open(&config.db_path) {
        Ok(repo) => repo,
        Err(err) => {
            log::error!("event=cli_open module=cli status=error error={err}");
            eprintln!("failed to open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let controller = TaskController::new(repo);
    controller.load().await;
    let state = controller.snapshot();
    if let Some(error) = state.error {
        eprintln!("load failed: {error}");
        return ExitCode::FAILURE;
    }

    println!("db_path={}", config.db_path.display());
    println!("tasks={}", state.tasks.len());
    for status in TaskStatus::ALL {
        let count = state
            .tasks
            .iter()
            .filter(|task| task.status == status)
            .count();
        println!("  {status}={count}");
    }
    ExitCode::SUCCESS
}

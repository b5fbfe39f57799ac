//! Logging setup.
//!
//! The TUI owns the terminal, so everything goes to `gymbro.log` in the state
//! directory. The previous sessions' logs are shifted to `gymbro.log.1` ..
//! `gymbro.log.5` on startup.

use crate::error::{GymBroError, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "gymbro.log";
const MAX_LOG_FILES: u8 = 5;

/// Install the global subscriber. Level defaults to `info`, override with `RUST_LOG`.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    rotate_logs_on_startup(&log_dir.join(LOG_FILE))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("gymbro")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| GymBroError::Logging(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GymBroError::Logging(Box::new(e)))?;

    tracing::info!("gymbro v{} started", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }
    let (Some(log_dir), Some(log_name)) = (log_path.parent(), log_path.file_name()) else {
        return Ok(());
    };
    let log_name = log_name.to_string_lossy();

    let oldest = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for i in (1..MAX_LOG_FILES).rev() {
        let current = log_dir.join(format!("{log_name}.{i}"));
        if current.exists() {
            std::fs::rename(&current, log_dir.join(format!("{log_name}.{}", i + 1)))?;
        }
    }
    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;
    Ok(())
}

//! Logging system initialization
//!
//! Sets up tracing-based logging with file output to
//! `~/Library/Application Support/Bottlerack/logs/app.log` and rotation on
//! startup keeping 10 historical files. The embedding application calls
//! [`init_logging`] once, before constructing any store manager.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Error, Result};

/// Maximum number of historical log files to keep (app.log.1 through app.log.9)
const MAX_LOG_FILES: u8 = 9;

/// Initialize the logging system.
///
/// Log level defaults to INFO but can be configured via the `RUST_LOG`
/// environment variable. Rotates existing logs on startup to maintain a
/// history of the last 10 sessions.
pub fn init_logging() -> Result<()> {
    let log_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Library/Application Support/Bottlerack/logs");
    std::fs::create_dir_all(&log_dir)?;

    // Rotate existing log files on startup
    let log_path = log_dir.join("app.log");
    rotate_logs_on_startup(&log_path)?;

    // tracing_appender's rotation policies are time-based; session-based
    // retention is handled manually above, so the appender never rotates.
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("app")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false) // Disable ANSI colors for file output
        .with_target(true) // Include target module
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    tracing::info!("bottlerack v{} logging initialized", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// Rotate log files on application startup.
///
/// Maintains a history of the last 10 sessions: the oldest file
/// (`app.log.9`) is deleted, each numbered file shifts up by one, and the
/// current `app.log` becomes `app.log.1`. Runs unconditionally on every
/// startup so each session's logs are preserved separately.
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let log_dir = log_path
        .parent()
        .ok_or_else(|| Error::Io(std::io::Error::other("invalid log path")))?;
    let log_name = log_path
        .file_name()
        .ok_or_else(|| Error::Io(std::io::Error::other("invalid log filename")))?
        .to_string_lossy();

    let oldest_log = log_dir.join(format!("{log_name}.{MAX_LOG_FILES}"));
    if oldest_log.exists() {
        std::fs::remove_file(&oldest_log)?;
    }

    for i in (1..MAX_LOG_FILES).rev() {
        let current_log = log_dir.join(format!("{log_name}.{i}"));
        let next_log = log_dir.join(format!("{log_name}.{}", i + 1));
        if current_log.exists() {
            std::fs::rename(&current_log, &next_log)?;
        }
    }

    std::fs::rename(log_path, log_dir.join(format!("{log_name}.1")))?;
    Ok(())
}

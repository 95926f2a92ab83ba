//! Logging system initialization
//!
//! Installs a `tracing` subscriber that writes to `launcher.log` in a
//! caller-chosen directory. The previous sessions' logs are shifted to
//! `launcher.log.1` .. `launcher.log.9` on every start.

use crate::error::{Result, StringError, TileIconError};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Base name of the active log file
pub const LOG_FILE_NAME: &str = "launcher.log";

/// Number of previous sessions kept beside the active log
const MAX_LOG_FILES: u8 = 9;

/// Initialize the logging system
///
/// Log level defaults to INFO and can be overridden with `RUST_LOG`
/// (e.g. `RUST_LOG=tile_icons=debug` to see every fallback decision).
/// Fails if a global subscriber is already installed.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    rotate_logs_on_startup(&log_dir.join(LOG_FILE_NAME))?;

    // Rotation happens above, once per start; the appender only appends
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("launcher")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| TileIconError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| TileIconError::ConfigError(Box::new(e)))?;

    tracing::info!("Tile launcher core v{} started", env!("CARGO_PKG_VERSION"));

    Ok(())
}

/// `<dir>/<name>.<index>`
fn numbered(log_dir: &Path, log_name: &str, index: u8) -> PathBuf {
    log_dir.join(format!("{log_name}.{index}"))
}

/// Shift `launcher.log` into the numbered history
///
/// The oldest file (`.9`) is dropped, every other file moves up by one, and
/// the active log becomes `.1`. Gaps in the history are preserved. Does
/// nothing when there is no active log.
fn rotate_logs_on_startup(log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let (Some(log_dir), Some(log_name)) = (log_path.parent(), log_path.file_name()) else {
        return Err(TileIconError::ConfigError(StringError::new(format!(
            "Invalid log path {}",
            log_path.display()
        ))));
    };
    let log_name = log_name.to_string_lossy();

    let oldest = numbered(log_dir, &log_name, MAX_LOG_FILES);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }

    for index in (1..MAX_LOG_FILES).rev() {
        let from = numbered(log_dir, &log_name, index);
        if from.exists() {
            std::fs::rename(&from, numbered(log_dir, &log_name, index + 1))?;
        }
    }

    std::fs::rename(log_path, numbered(log_dir, &log_name, 1))?;
    tracing::info!("Log rotation completed on startup");

    Ok(())
}

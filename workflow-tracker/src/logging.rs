//! Structured logging setup
//!
//! The terminal UI owns stdout/stderr while it runs, so in that mode events go
//! to a log file through a non-blocking appender. One-shot CLI commands log to
//! stderr.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TrackerConfig;

const DEFAULT_LOG_FILE_NAME: &str = "workflow-tracker.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

/// Filter from `RUST_LOG` if present, else the configured level
pub fn build_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Directory and file name for the appender
fn split_log_path(path: &Path) -> (PathBuf, OsString) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from(DEFAULT_LOG_FILE_NAME));
    (dir, file_name)
}

/// Install the global subscriber.
///
/// In file mode the returned guard flushes the background writer when dropped;
/// keep it alive for as long as the UI runs. A subscriber that is already
/// installed is left alone.
pub fn init_tracing(config: &TrackerConfig, target: LogTarget) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = build_filter(&config.logging.level);

    match target {
        LogTarget::File => {
            let path = config.log_file();
            let (dir, file_name) = split_log_path(&path);
            std::fs::create_dir_all(&dir)
                .map_err(|e| anyhow::anyhow!("Failed to create log directory {}: {}", dir.display(), e))?;

            let file_appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let installed = fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .try_init()
                .is_ok();

            if installed {
                tracing::info!(log_file = %path.display(), "Logging initialized");
            }
            Ok(Some(guard))
        }
        LogTarget::Stderr => {
            let _ = fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
            Ok(None)
        }
    }
}

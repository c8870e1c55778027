//! Diagnostic logging
//!
//! A [`LogContext`] is built once at startup and installed as the default
//! subscriber for the current thread. Dropping it flushes the log file and
//! restores the previous subscriber.
//!
//! The log file is opened in append mode and every event is written as one
//! line with a single write, so several simultaneous invocations can share
//! it.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Log path {0:?} has no file name")]
    NoFileName(PathBuf),

    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Append-only log file, `None` to log to stderr only
    pub file: Option<PathBuf>,
    /// Level written to the file (`trace` .. `error`)
    pub file_level: String,
    /// Echo debug records to stderr, honoring `RUST_LOG`
    pub debug: bool,
}

/// Live logging configuration for one invocation
pub struct LogContext {
    log_file: Option<PathBuf>,
    _default: DefaultGuard,
    _worker: Option<WorkerGuard>,
}

impl LogContext {
    /// Build and install the subscriber
    ///
    /// A log file that cannot be opened is reported on stderr and skipped;
    /// stderr logging is always available.
    #[must_use]
    pub fn init(settings: &LogSettings) -> Self {
        let (writer, worker, log_file) = match settings.file.as_deref().map(open_log_file) {
            Some(Ok((writer, worker))) => (Some(writer), Some(worker), settings.file.clone()),
            Some(Err(e)) => {
                eprintln!("xdg-open-wsl: logging to stderr only: {e}");
                (None, None, None)
            }
            None => (None, None, None),
        };

        // Without --debug only warnings reach stderr, whatever RUST_LOG says
        let stderr_filter = if settings.debug {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
        } else {
            EnvFilter::new("warn")
        };
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(stderr_filter);

        let file_level = settings
            .file_level
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::DEBUG);
        let file_layer = writer.map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_level)
        });

        let subscriber = tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer);

        Self {
            log_file,
            _default: tracing::subscriber::set_default(subscriber),
            _worker: worker,
        }
    }

    /// Log file in use, if one could be opened
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

fn open_log_file(path: &Path) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)?;

    Ok(tracing_appender::non_blocking(appender))
}

//! Centralized file-based logging system
//!
//! Writes logs to files under the configured directory, separated by log type:
//! - main/ - All events as JSON
//! - error/ - Error and warning logs only
//! - ingest/ - Ingestion pipeline logs
//! - report/ - Report writer logs
//!
//! Console output goes to stderr; stdout carries reports.

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use super::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log subdirectories, one per file layer
const LOG_TYPES: [&str; 4] = ["main", "error", "ingest", "report"];

/// Initialize logging
///
/// Creates the log directories and sets up file appenders for different
/// log types. Returns WorkerGuards which must be kept alive for the
/// duration of the program.
///
/// # Errors
/// Fails if a log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Vec<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| LoggingError::Filter(e.to_string()))?;

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.file_output {
        for log_type in LOG_TYPES {
            fs::create_dir_all(config.dir.join(log_type))?;
        }

        // Main log - all events
        let (main_appender, main_guard) = create_appender(&config.dir, "main");
        guards.push(main_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(main_appender)
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .json()
                .boxed(),
        );

        // Error log - ERROR and WARN only
        let (error_appender, error_guard) = create_appender(&config.dir, "error");
        guards.push(error_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(error_appender)
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::WARN)
                .boxed(),
        );

        for target in ["ingest", "report"] {
            let (appender, guard) = create_appender(&config.dir, target);
            guards.push(guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true)
                    .with_filter(tracing_subscriber::filter::filter_fn(move |metadata| {
                        metadata.target().contains(target)
                    }))
                    .boxed(),
            );
        }
    }

    // Console layer
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .boxed(),
    );

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        target: "main",
        dir = %config.dir.display(),
        file_output = config.file_output,
        "Logging system initialized"
    );

    Ok(guards)
}

/// Create a daily rolling file appender
fn create_appender(base: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, base.join(name), name);
    tracing_appender::non_blocking(appender)
}

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_ingest {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "ingest", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_report {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "report", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}

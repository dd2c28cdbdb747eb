//! Lock-free trade statistics over tag/value messages
//!
//! Core library for zero-allocation ingestion and concurrent reporting.

pub mod core;
pub mod engine;
pub mod hot_path;
pub mod infrastructure;
pub mod parsing;
pub mod report;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use crate::core::{CounterSnapshot, Side, Symbol, SymbolStats};
pub use engine::{RunSummary, StatsEngine};
pub use hot_path::{Ingestor, MessageOutcome};
pub use infrastructure::config::{Config, ConfigError, EngineConfig, ReportConfig};
pub use parsing::{DecodeError, MessageEncoder, WireFormat};
pub use report::{ReportFormat, ReportWriter, StatsReader};

use thiserror::Error;

/// Main error type for the stats engine
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Task error: {0}")]
    Task(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StatsError>;

//! Infrastructure - cold path only
//!
//! This module contains non-latency-critical code:
//! - Configuration management
//! - Logging
//! - Message framing for the input stream

pub mod config;
pub mod logging;
pub mod source;

pub use config::{Config, ConfigError, EngineConfig, LoggingConfig, ReportConfig, SourceConfig};
pub use logging::{init_logging, LoggingError};
pub use source::MessageSource;

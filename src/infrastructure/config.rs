//! Configuration management
//!
//! Loads configuration from config.toml at startup.
//! All values are configurable to avoid hardcoded constants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::{SymbolArena, MAX_SYMBOL_LEN};
use crate::report::ReportFormat;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Table sizing
    #[serde(default)]
    pub engine: EngineConfig,

    /// Report cadence and format
    #[serde(default)]
    pub report: ReportConfig,

    /// Message input
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Symbol table sizing, fixed for the lifetime of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Maximum number of distinct symbols tracked
    #[serde(default = "default_slot_capacity")]
    pub slot_capacity: usize,

    /// Bytes reserved for symbol keys
    #[serde(default = "default_arena_bytes")]
    pub arena_bytes: usize,
}

/// Report writer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Interval between periodic reports in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default)]
    pub format: ReportFormat,

    /// Write one more report after the input ends
    #[serde(default = "default_true")]
    pub final_report: bool,
}

/// Message source; stdin when `path` is absent
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write log files in addition to stderr
    #[serde(default = "default_true")]
    pub file_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_capacity: default_slot_capacity(),
            arena_bytes: default_arena_bytes(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            format: ReportFormat::default(),
            final_report: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
            file_output: true,
        }
    }
}

fn default_slot_capacity() -> usize {
    4096
}

fn default_arena_bytes() -> usize {
    65_536 // 2048 max-length symbols
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Check sizing before any allocation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_capacity == 0 {
            return Err(ConfigError::Invalid(
                "engine.slot_capacity must be greater than zero".to_string(),
            ));
        }
        if self.slot_capacity > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "engine.slot_capacity {} exceeds {}",
                self.slot_capacity,
                u32::MAX
            )));
        }
        if self.arena_bytes < MAX_SYMBOL_LEN {
            return Err(ConfigError::Invalid(format!(
                "engine.arena_bytes {} is smaller than one symbol ({} bytes)",
                self.arena_bytes, MAX_SYMBOL_LEN
            )));
        }
        if self.arena_bytes > SymbolArena::MAX_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "engine.arena_bytes {} exceeds {}",
                self.arena_bytes,
                SymbolArena::MAX_CAPACITY
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from config.toml file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be parsed or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File not found - use defaults
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.report.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "report.interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading file
    IoError(std::io::Error),
    /// Parse error (invalid TOML)
    ParseError(String),
    /// Value out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::ParseError(_) | ConfigError::Invalid(_) => None,
        }
    }
}

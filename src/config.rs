//! Logger configuration and the facade constructor

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{JsonLogger, Level, RotatingFile, RotationPolicy, Stdout};

/// Number of rotated files kept next to the active log file
pub const MAX_BACKUPS: usize = 3;

/// Misconfiguration detected while building a logger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown log level: {0}")]
    UnknownLevel(String),
    #[error("unknown log driver: {0}")]
    UnknownDriver(String),
}

/// Logging backends that can be selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// JSON lines into a rotating file
    Json,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Json => "json",
        }
    }
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Driver::Json),
            other => Err(ConfigError::UnknownDriver(other.to_string())),
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Path of the active log file
    #[serde(default = "default_filename")]
    pub filename: PathBuf,

    /// Size in megabytes after which the file is rotated (default: 100)
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Days after which rotated files are removed (default: 7, 0 keeps them)
    #[serde(default = "default_max_day")]
    pub max_day: u64,

    /// Backend name; only "json" is recognized
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Initial minimum level: "debug", "info", "warn", "error" or "fatal"
    #[serde(default = "default_level")]
    pub level: String,

    /// Also write to stdout and record the call site of each record
    #[serde(default)]
    pub debug: bool,

    /// Logger name written into every record (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_filename() -> PathBuf {
    PathBuf::from("logs/app.log")
}

fn default_max_size() -> u64 {
    100
}

fn default_max_day() -> u64 {
    7
}

fn default_driver() -> String {
    Driver::Json.as_str().to_string()
}

fn default_level() -> String {
    Level::Info.as_str().to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            max_size: default_max_size(),
            max_day: default_max_day(),
            driver: default_driver(),
            level: default_level(),
            debug: false,
            name: None,
        }
    }
}

impl LoggerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Load configuration from file, or return default if not found
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Rotation limits for the log file
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new(self.max_size, self.max_day, MAX_BACKUPS)
    }
}

/// Build a logger from its configuration.
///
/// The driver and level names are checked before any file is touched.
pub fn new_logger(config: &LoggerConfig) -> Result<JsonLogger, ConfigError> {
    let driver: Driver = config.driver.parse()?;
    let level: Level = config.level.parse()?;

    let logger = match driver {
        Driver::Json => {
            let file = RotatingFile::new(&config.filename, config.rotation_policy());
            let mut builder = JsonLogger::builder()
                .level(level)
                .sink(Arc::new(file))
                .add_caller(config.debug);
            if config.debug {
                builder = builder.sink(Arc::new(Stdout));
            }
            if let Some(name) = &config.name {
                builder = builder.name(name.as_str());
            }
            builder.build()
        }
    };

    tracing::debug!(
        "Logging to {} at level {} (driver {})",
        config.filename.display(),
        level,
        driver.as_str()
    );
    Ok(logger)
}

/// Build a logger, panicking on misconfiguration.
///
/// A process must not run with a half-configured logger, so an unknown level or
/// driver stops it here, at startup.
pub fn new_logger_or_abort(config: &LoggerConfig) -> JsonLogger {
    match new_logger(config) {
        Ok(logger) => logger,
        Err(e) => panic!("{}", e),
    }
}

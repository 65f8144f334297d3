//! Severity levels and the runtime-adjustable threshold

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    /// Emitting at this level terminates the process
    Fatal = 4,
}

impl Level {
    /// All levels in increasing severity
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Lowercase name, as written into the `level` field of each record
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            _ => Level::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    /// Names are case-sensitive: only the five lowercase names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(ConfigError::UnknownLevel(other.to_string())),
        }
    }
}

/// Minimum-emit threshold shared between a logger and its children.
///
/// Reads and writes are single atomic operations, so `set` never blocks and
/// concurrent emitters observe either the old or the new threshold.
#[derive(Debug)]
pub struct AtomicLevel {
    inner: AtomicU8,
}

impl AtomicLevel {
    pub fn new(level: Level) -> Self {
        Self {
            inner: AtomicU8::new(level as u8),
        }
    }

    pub fn get(&self) -> Level {
        Level::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, level: Level) {
        self.inner.store(level as u8, Ordering::Release);
    }

    /// Whether a record at `level` passes the current threshold
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.get()
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

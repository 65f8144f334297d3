//! Logfacade - leveled JSON logging behind a small interface
//!
//! A [`logging::Logger`] is built once from a [`config::LoggerConfig`] and passed
//! to whatever needs it. Records go to a size-rotated file, and to stdout in
//! debug mode.

pub mod config;
pub mod logging;

pub use config::{new_logger, new_logger_or_abort, ConfigError, LoggerConfig};
pub use logging::{Extra, Level, Logger, LoggerExt};

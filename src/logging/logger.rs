//! The logger interface and its JSON-line implementation
//!
//! [`Logger`] is the object-safe core every backend implements. The leveled
//! methods (`debug`, `info`, `warn`, `error`, `fatal`) live on [`LoggerExt`],
//! which is implemented for every logger including `dyn Logger`, so that the
//! call site is captured correctly even through trait objects.
//!
//! # Fatal
//!
//! [`LoggerExt::fatal`] is not just another level. It always writes its record,
//! flushes every sink and then **terminates the process** through the logger's
//! [`ExitHook`]. It never returns.

use std::backtrace::Backtrace;
use std::fmt;
use std::io;
use std::panic::Location;
use std::sync::Arc;

use chrono::Local;

use super::encoder::{EncoderConfig, Entry};
use super::extra::Extra;
use super::field::translate_all;
use super::level::{AtomicLevel, Level};
use super::sink::{Sink, Tee};

/// Exit code used after a fatal record
pub const FATAL_EXIT_CODE: i32 = 1;

/// What happens after a fatal record has been written
pub trait ExitHook: Send + Sync {
    fn exit(&self, code: i32) -> !;
}

/// Ends the process with [`std::process::exit`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl ExitHook for ProcessExit {
    fn exit(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// Leveled logging with structured extras.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; every method may be called
/// concurrently, including `set_level`.
pub trait Logger: Send + Sync {
    /// Change the minimum level that gets written
    fn set_level(&self, level: Level);

    /// Current minimum level
    fn level(&self) -> Level;

    /// Whether a record at `level` would currently be written
    fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Write a record at `level` attributed to `caller`, if the level is enabled.
    ///
    /// [`Level::Fatal`] is handed to [`Logger::fatal_at`], so the process still
    /// terminates after the record is written.
    fn log_at(
        &self,
        level: Level,
        msg: &str,
        extras: &[Extra],
        caller: &'static Location<'static>,
    );

    /// Write a fatal record attributed to `caller`, flush, then exit.
    fn fatal_at(&self, msg: &str, extras: &[Extra], caller: &'static Location<'static>) -> !;
}

/// Leveled convenience methods, available on every [`Logger`].
///
/// The message is written as-is; extras become separate fields and are never
/// interpolated into it.
pub trait LoggerExt: Logger {
    #[track_caller]
    fn debug(&self, msg: &str, extras: &[Extra]) {
        self.log_at(Level::Debug, msg, extras, Location::caller());
    }

    #[track_caller]
    fn info(&self, msg: &str, extras: &[Extra]) {
        self.log_at(Level::Info, msg, extras, Location::caller());
    }

    #[track_caller]
    fn warn(&self, msg: &str, extras: &[Extra]) {
        self.log_at(Level::Warn, msg, extras, Location::caller());
    }

    #[track_caller]
    fn error(&self, msg: &str, extras: &[Extra]) {
        self.log_at(Level::Error, msg, extras, Location::caller());
    }

    /// Write a fatal record, flush, and terminate the process.
    ///
    /// The record is written whatever the current level. This call does not
    /// return.
    #[track_caller]
    fn fatal(&self, msg: &str, extras: &[Extra]) -> ! {
        self.fatal_at(msg, extras, Location::caller())
    }
}

impl<L: Logger + ?Sized> LoggerExt for L {}

struct Core {
    level: AtomicLevel,
    sink: Tee,
    encoder: EncoderConfig,
    add_caller: bool,
    stacktrace_level: Level,
    exit: Arc<dyn ExitHook>,
}

/// Logger writing one JSON object per record to its sinks
#[derive(Clone)]
pub struct JsonLogger {
    name: Option<String>,
    core: Arc<Core>,
}

impl JsonLogger {
    pub fn builder() -> JsonLoggerBuilder {
        JsonLoggerBuilder::default()
    }

    /// Child logger with a dotted name, sharing level, sinks and exit hook
    pub fn named(&self, name: &str) -> Self {
        let name = match &self.name {
            Some(parent) if !name.is_empty() => format!("{}.{}", parent, name),
            Some(parent) => parent.clone(),
            None => name.to_string(),
        };
        Self {
            name: (!name.is_empty()).then_some(name),
            core: Arc::clone(&self.core),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of destinations records are written to
    pub fn sink_count(&self) -> usize {
        self.core.sink.len()
    }

    /// Flush every sink
    pub fn flush(&self) -> io::Result<()> {
        self.core.sink.flush()
    }

    fn emit(&self, level: Level, msg: &str, extras: &[Extra], caller: &'static Location<'static>) {
        let entry = Entry {
            level,
            time: Local::now(),
            logger_name: self.name.as_deref(),
            caller: self.core.add_caller.then_some(caller),
            message: msg,
            fields: translate_all(extras),
            stacktrace: (level >= self.core.stacktrace_level)
                .then(|| Backtrace::force_capture().to_string()),
        };

        let bytes = match self.core.encoder.encode(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Dropped log record, encoding failed: {}", e);
                return;
            }
        };

        // Sink failures stay here; logging never fails the caller
        if let Err(e) = self.core.sink.write_record(&bytes) {
            tracing::warn!("Dropped log record, write failed: {}", e);
        }
    }
}

impl Logger for JsonLogger {
    fn set_level(&self, level: Level) {
        self.core.level.set(level);
    }

    fn level(&self) -> Level {
        self.core.level.get()
    }

    fn log_at(
        &self,
        level: Level,
        msg: &str,
        extras: &[Extra],
        caller: &'static Location<'static>,
    ) {
        if level == Level::Fatal {
            self.fatal_at(msg, extras, caller)
        }
        if !self.core.level.enabled(level) {
            return;
        }
        self.emit(level, msg, extras, caller);
    }

    fn fatal_at(&self, msg: &str, extras: &[Extra], caller: &'static Location<'static>) -> ! {
        self.emit(Level::Fatal, msg, extras, caller);
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush before exit: {}", e);
        }
        self.core.exit.exit(FATAL_EXIT_CODE)
    }
}

impl fmt::Debug for JsonLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLogger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("sinks", &self.sink_count())
            .field("add_caller", &self.core.add_caller)
            .field("stacktrace_level", &self.core.stacktrace_level)
            .finish()
    }
}

/// Assembles a [`JsonLogger`]
pub struct JsonLoggerBuilder {
    level: Level,
    name: Option<String>,
    sinks: Vec<Arc<dyn Sink>>,
    add_caller: bool,
    stacktrace_level: Level,
    encoder: EncoderConfig,
    exit: Arc<dyn ExitHook>,
}

impl Default for JsonLoggerBuilder {
    fn default() -> Self {
        Self {
            level: Level::Info,
            name: None,
            sinks: Vec::new(),
            add_caller: false,
            stacktrace_level: Level::Error,
            encoder: EncoderConfig::default(),
            exit: Arc::new(ProcessExit),
        }
    }
}

impl JsonLoggerBuilder {
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a destination; records go to every sink in the order added
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Attach the `file` field naming the call site
    pub fn add_caller(mut self, enabled: bool) -> Self {
        self.add_caller = enabled;
        self
    }

    /// Capture a stack trace for records at or above `level`
    pub fn stacktrace_level(mut self, level: Level) -> Self {
        self.stacktrace_level = level;
        self
    }

    pub fn encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn exit_hook(mut self, exit: Arc<dyn ExitHook>) -> Self {
        self.exit = exit;
        self
    }

    pub fn build(self) -> JsonLogger {
        JsonLogger {
            name: self.name.filter(|n| !n.is_empty()),
            core: Arc::new(Core {
                level: AtomicLevel::new(self.level),
                sink: Tee::new(self.sinks),
                encoder: self.encoder,
                add_caller: self.add_caller,
                stacktrace_level: self.stacktrace_level,
                exit: self.exit,
            }),
        }
    }
}

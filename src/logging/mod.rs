//! Leveled, structured logging
//!
//! Provides the [`Logger`] interface, the extra-to-field translation, a JSON
//! line encoder and the sinks records are written to (rotating file, stdout,
//! in-memory buffer).

mod buffer;
mod encoder;
mod extra;
mod field;
mod level;
mod logger;
mod rotate;
mod sink;

pub use buffer::RecordBuffer;
pub use encoder::{format_time, short_caller, EncoderConfig, Entry, TIME_FORMAT};
pub use extra::{Extra, Value};
pub use field::{translate, translate_all, Field, FieldKind};
pub use level::{AtomicLevel, Level};
pub use logger::{
    ExitHook, JsonLogger, JsonLoggerBuilder, Logger, LoggerExt, ProcessExit, FATAL_EXIT_CODE,
};
pub use rotate::{RotatingFile, RotationPolicy, DEFAULT_MAX_SIZE_MB};
pub use sink::{Sink, Stdout, Tee};

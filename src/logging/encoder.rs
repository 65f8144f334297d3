//! JSON line encoding of log entries

use std::panic::Location;

use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Local, Offset, TimeZone};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::field::{Field, FieldKind};
use super::level::Level;

/// ISO-8601 with milliseconds and numeric offset
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const UTC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a record time: `Z` for UTC, a numeric offset such as `+0800` otherwise
pub fn format_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let format = if time.offset().fix().local_minus_utc() == 0 {
        UTC_TIME_FORMAT
    } else {
        TIME_FORMAT
    };
    time.format(format).to_string()
}

/// Field names used for the fixed parts of every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub message_key: &'static str,
    pub level_key: &'static str,
    pub time_key: &'static str,
    pub name_key: &'static str,
    pub caller_key: &'static str,
    pub stacktrace_key: &'static str,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            message_key: "msg",
            level_key: "level",
            time_key: "time",
            name_key: "logger",
            caller_key: "file",
            stacktrace_key: "stacktrace",
        }
    }
}

/// Everything that goes into one record
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub level: Level,
    pub time: DateTime<Local>,
    pub logger_name: Option<&'a str>,
    pub caller: Option<&'static Location<'static>>,
    pub message: &'a str,
    pub fields: Vec<Field>,
    pub stacktrace: Option<String>,
}

/// Render a caller as `dir/file.rs:line`, keeping only the last directory
pub fn short_caller(location: &Location<'_>) -> String {
    let file = location.file();
    let mut cut = None;
    let mut seen = 0;
    for (idx, ch) in file.char_indices().rev() {
        if ch == '/' || ch == '\\' {
            seen += 1;
            if seen == 2 {
                cut = Some(idx + 1);
                break;
            }
        }
    }
    let short = match cut {
        Some(idx) => &file[idx..],
        None => file,
    };
    format!("{}:{}", short, location.line())
}

impl EncoderConfig {
    /// Encode an entry as a single JSON object followed by a newline
    pub fn encode(&self, entry: &Entry<'_>) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(256);
        serde_json::to_writer(
            &mut buf,
            &Record {
                config: self,
                entry,
            },
        )?;
        buf.push(b'\n');
        Ok(buf)
    }
}

struct Record<'a> {
    config: &'a EncoderConfig,
    entry: &'a Entry<'a>,
}

struct FieldValue<'a>(&'a FieldKind);

impl Serialize for FieldValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            FieldKind::Bool(b) => serializer.serialize_bool(*b),
            FieldKind::String(s) => serializer.serialize_str(s),
            FieldKind::Binary(b) => serializer.serialize_str(&BASE64_STANDARD.encode(b)),
            FieldKind::Reflect(v) => v.serialize(serializer),
        }
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let config = self.config;
        let entry = self.entry;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(config.level_key, entry.level.as_str())?;
        map.serialize_entry(
            config.time_key,
            &format_time(&entry.time),
        )?;
        if let Some(name) = entry.logger_name {
            map.serialize_entry(config.name_key, name)?;
        }
        if let Some(caller) = entry.caller {
            map.serialize_entry(config.caller_key, &short_caller(caller))?;
        }
        map.serialize_entry(config.message_key, entry.message)?;
        for field in &entry.fields {
            map.serialize_entry(&field.key, &FieldValue(&field.kind))?;
        }
        if let Some(trace) = &entry.stacktrace {
            map.serialize_entry(config.stacktrace_key, trace)?;
        }
        map.end()
    }
}

//! In-memory record sink
//!
//! A thread-safe ring buffer holding the most recent encoded records. Useful for
//! capturing output in tests or for showing recent activity without reading the
//! log file back.

use std::collections::VecDeque;
use std::io;
use std::sync::RwLock;

use super::sink::Sink;

/// Thread-safe ring buffer of encoded records
pub struct RecordBuffer {
    /// Record lines without their trailing newline (capped at max_records)
    records: RwLock<VecDeque<String>>,
    /// Maximum records to keep
    max_records: usize,
}

impl RecordBuffer {
    /// Create a new buffer keeping at most `max_records` records
    pub fn new(max_records: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(max_records.min(1024))),
            max_records,
        }
    }

    /// Get all record lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.records
            .read()
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get all records parsed as JSON, skipping any that do not parse
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Get the number of records in the buffer
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all records
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }
}

impl Sink for RecordBuffer {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        let line = String::from_utf8_lossy(record).trim_end().to_string();
        let mut records = self
            .records
            .write()
            .map_err(|_| io::Error::other("record buffer lock poisoned"))?;
        if self.max_records == 0 {
            return Ok(());
        }
        if records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(line);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

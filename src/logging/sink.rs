//! Record destinations
//!
//! A sink receives fully encoded records, one call per record. Implementations
//! must be safe to share between threads and must not interleave two records.

use std::io::{self, Write};
use std::sync::Arc;

/// Destination for encoded records
pub trait Sink: Send + Sync {
    /// Write one complete record
    fn write_record(&self, record: &[u8]) -> io::Result<()>;

    /// Push buffered data to its final destination
    fn flush(&self) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        (**self).write_record(record)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

impl Sink for Stdout {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        // The lock keeps concurrent records whole
        let mut out = io::stdout().lock();
        out.write_all(record)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Writes every record to each of its sinks
#[derive(Clone, Default)]
pub struct Tee {
    sinks: Vec<Arc<dyn Sink>>,
}

impl Tee {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for Tee {
    /// Every sink is attempted; the first failure is returned afterwards.
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.write_record(record) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn flush(&self) -> io::Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

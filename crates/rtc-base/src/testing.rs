//! Test sinks for asserting on logger output.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::logging::{LogRecord, LogSink, Severity};

/// A record captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub severity: Severity,
    pub message: String,
    pub line: String,
    pub timestamped: bool,
}

/// In-memory sink. Clones share the same buffer, so a test keeps one clone
/// and hands the other to the logger.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.lock().clone()
    }

    /// Snapshot of captured rendered lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.line.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemorySink {
    fn on_log_message(&mut self, record: &LogRecord<'_>, line: &str) -> io::Result<()> {
        self.lock().push(CapturedRecord {
            severity: record.severity,
            message: record.message.to_string(),
            line: line.to_string(),
            timestamped: record.timestamp.is_some(),
        });
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

/// Sink whose every write and flush fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl LogSink for FailingSink {
    fn on_log_message(&mut self, _record: &LogRecord<'_>, _line: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

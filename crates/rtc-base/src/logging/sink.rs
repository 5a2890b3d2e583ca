//! Log destinations.
//!
//! A sink accepts rendered records in the order they were logged. Write
//! failures are returned to the [`Logger`](super::Logger), which swallows
//! them; a sink never needs to protect callers from its own I/O errors.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use super::record::LogRecord;

/// Destination for rendered log records.
pub trait LogSink: Send {
    /// Write one record. `line` is the record's rendered form, without a
    /// trailing newline.
    ///
    /// # Errors
    ///
    /// Any I/O failure; the logger swallows it.
    fn on_log_message(&mut self, record: &LogRecord<'_>, line: &str) -> io::Result<()>;

    /// Flush buffered output.
    ///
    /// # Errors
    ///
    /// Any I/O failure; the logger swallows it.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Bounded label identifying the sink kind in diagnostics.
    fn kind(&self) -> &'static str {
        "custom"
    }
}

/// Where the primary sink writes.
pub enum SinkTarget {
    /// Standard error, the debug/console stream.
    Stderr,
    Stdout,
    /// Append to a file, opened on first write.
    File(PathBuf),
    Custom(Box<dyn LogSink>),
}

impl SinkTarget {
    pub(crate) fn into_sink(self) -> Box<dyn LogSink> {
        match self {
            SinkTarget::Stderr => Box::new(StreamSink::stderr()),
            SinkTarget::Stdout => Box::new(StreamSink::stdout()),
            SinkTarget::File(path) => Box::new(FileSink::lazy(path)),
            SinkTarget::Custom(sink) => sink,
        }
    }
}

impl std::fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkTarget::Stderr => f.write_str("Stderr"),
            SinkTarget::Stdout => f.write_str("Stdout"),
            SinkTarget::File(path) => f.debug_tuple("File").field(path).finish(),
            SinkTarget::Custom(sink) => f.debug_tuple("Custom").field(&sink.kind()).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stderr,
    Stdout,
}

/// Console sink writing one line per record.
#[derive(Debug)]
pub struct StreamSink {
    stream: Stream,
}

impl StreamSink {
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }
}

impl LogSink for StreamSink {
    fn on_log_message(&mut self, _record: &LogRecord<'_>, line: &str) -> io::Result<()> {
        match self.stream {
            Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
            Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            Stream::Stderr => io::stderr().flush(),
            Stream::Stdout => io::stdout().flush(),
        }
    }

    fn kind(&self) -> &'static str {
        match self.stream {
            Stream::Stderr => "stderr",
            Stream::Stdout => "stdout",
        }
    }
}

/// Appending file sink. Each record is flushed at its newline.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<LineWriter<File>>,
}

impl FileSink {
    /// Open `path` for appending now, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let writer = Some(open_append(&path)?);
        Ok(Self { path, writer })
    }

    /// Defer opening `path` until the first record.
    ///
    /// A failed open is retried on the next record.
    #[must_use]
    pub fn lazy(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn on_log_message(&mut self, _record: &LogRecord<'_>, line: &str) -> io::Result<()> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => open_append(&self.path)?,
        };
        writeln!(self.writer.insert(writer), "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.writer {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

fn open_append(path: &Path) -> io::Result<LineWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(LineWriter::new(file))
}

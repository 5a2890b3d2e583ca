//! Log records and their rendered form.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use super::severity::Severity;

/// How timestamps are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// `SSS:mmm` since the logger was created (monotonic).
    #[default]
    Elapsed,
    /// RFC 3339 UTC wall-clock time with millisecond precision.
    WallClock,
}

/// Timestamp attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Elapsed(Duration),
    WallClock(DateTime<Utc>),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Elapsed(elapsed) => write!(
                f,
                "{:03}:{:03}",
                elapsed.as_secs(),
                elapsed.subsec_millis()
            ),
            Timestamp::WallClock(at) => {
                f.write_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

/// One log call, handed to each accepting sink and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub severity: Severity,
    pub timestamp: Option<Timestamp>,
    /// Name (or id) of the logging thread, when thread tagging is on.
    pub thread: Option<String>,
    pub message: &'a str,
}

/// Renders `[SEVERITY] [timestamp] [thread] message`, omitting disabled parts.
impl fmt::Display for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity)?;
        if let Some(timestamp) = &self.timestamp {
            write!(f, "[{timestamp}] ")?;
        }
        if let Some(thread) = &self.thread {
            write!(f, "[{thread}] ")?;
        }
        f.write_str(self.message)
    }
}

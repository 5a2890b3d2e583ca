//! Diagnostic logging with severity filtering and optional timestamps.
//!
//! Components log through an injected [`Logger`] rather than a global. The
//! logger renders each [`LogRecord`] once and hands it to every [`LogSink`]
//! whose minimum severity it meets.
//!
//! ```
//! use rtc_base::logging::{Logger, Severity, SinkTarget};
//!
//! let logger = Logger::new();
//! logger.configure_sink(Severity::Info, SinkTarget::Stderr);
//! logger.enable_timestamps(true);
//! rtc_base::rtc_log!(logger, Severity::Info, "Hello {}!", "WebRTC");
//! ```

mod logger;
mod record;
mod severity;
mod sink;

pub use logger::{LogSinkConfig, Logger, LoggerState, SinkId};
pub use record::{LogRecord, Timestamp, TimestampFormat};
pub use severity::{ParseSeverityError, Severity};
pub use sink::{FileSink, LogSink, SinkTarget, StreamSink};

/// Log a formatted message through a [`Logger`].
///
/// The message is only formatted when some sink would accept `severity`.
#[macro_export]
macro_rules! rtc_log {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let severity = $severity;
        if logger.would_log(severity) {
            logger.log(severity, &::std::format!($($arg)+));
        }
    }};
}

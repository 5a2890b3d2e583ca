//! Severity-filtered logger with ordered delivery.
//!
//! A [`Logger`] owns a primary ("debug") sink set by
//! [`Logger::configure_sink`] plus any number of additional streams added with
//! [`Logger::add_sink`], each with its own minimum severity. Sinks and
//! configuration sit behind one mutex held across delivery, so every sink
//! receives records in the order `log` was called, including when the logger
//! is shared between threads.
//!
//! # States
//!
//! ```text
//! Uninitialized --configure--> Configured --first log--> Active
//! ```
//!
//! `log` while `Uninitialized` is dropped and does not change state.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use chrono::Utc;
use tracing::debug;

use super::record::{LogRecord, Timestamp, TimestampFormat};
use super::severity::Severity;
use super::sink::{LogSink, SinkTarget};

/// Lifecycle of a [`Logger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Uninitialized,
    Configured,
    Active,
}

/// Rendering and primary-sink filtering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSinkConfig {
    /// Minimum severity forwarded to the primary sink.
    pub min_severity: Severity,
    pub timestamps: bool,
    pub timestamp_format: TimestampFormat,
    pub thread_ids: bool,
}

impl Default for LogSinkConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::None,
            timestamps: false,
            timestamp_format: TimestampFormat::Elapsed,
            thread_ids: false,
        }
    }
}

/// Handle for a sink added with [`Logger::add_sink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

struct Stream {
    id: SinkId,
    min_severity: Severity,
    sink: Box<dyn LogSink>,
}

struct LoggerInner {
    state: LoggerState,
    config: LogSinkConfig,
    primary: Option<Box<dyn LogSink>>,
    streams: Vec<Stream>,
    next_sink_id: u64,
}

impl LoggerInner {
    fn mark_configured(&mut self) {
        if self.state == LoggerState::Uninitialized {
            self.state = LoggerState::Configured;
        }
    }

    fn min_severity(&self) -> Option<Severity> {
        let primary = self.primary.as_ref().map(|_| self.config.min_severity);
        let streams = self.streams.iter().map(|stream| stream.min_severity);
        primary.into_iter().chain(streams).min()
    }
}

/// Diagnostic logger handed to the components that log.
pub struct Logger {
    inner: Mutex<LoggerInner>,
    started: Instant,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Logger")
            .field("state", &inner.state)
            .field("config", &inner.config)
            .field("primary", &inner.primary.as_ref().map(|sink| sink.kind()))
            .field("streams", &inner.streams.len())
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Create an unconfigured logger. Elapsed timestamps count from here.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LoggerInner {
                state: LoggerState::Uninitialized,
                config: LogSinkConfig::default(),
                primary: None,
                streams: Vec::new(),
                next_sink_id: 0,
            }),
            started: Instant::now(),
        }
    }

    /// Replace the primary sink and its minimum severity.
    pub fn configure_sink(&self, min_severity: Severity, target: SinkTarget) {
        let sink = target.into_sink();
        let mut inner = self.lock();
        if let Some(mut previous) = inner.primary.replace(sink) {
            if let Err(e) = previous.flush() {
                debug!(sink = previous.kind(), error = %e, "Log sink flush failed");
            }
        }
        inner.config.min_severity = min_severity;
        inner.mark_configured();
    }

    /// Toggle the timestamp prefix. Filtering is unaffected.
    pub fn enable_timestamps(&self, enabled: bool) {
        let mut inner = self.lock();
        inner.config.timestamps = enabled;
        inner.mark_configured();
    }

    pub fn set_timestamp_format(&self, format: TimestampFormat) {
        let mut inner = self.lock();
        inner.config.timestamp_format = format;
        inner.mark_configured();
    }

    /// Toggle tagging records with the calling thread's name (or id).
    pub fn enable_thread_ids(&self, enabled: bool) {
        let mut inner = self.lock();
        inner.config.thread_ids = enabled;
        inner.mark_configured();
    }

    /// Add a stream receiving records at or above `min_severity`.
    pub fn add_sink(&self, sink: Box<dyn LogSink>, min_severity: Severity) -> SinkId {
        let mut inner = self.lock();
        let id = SinkId(inner.next_sink_id);
        inner.next_sink_id += 1;
        inner.streams.push(Stream {
            id,
            min_severity,
            sink,
        });
        inner.mark_configured();
        id
    }

    /// Remove a stream added with [`Logger::add_sink`]. Returns `false` if
    /// `id` is unknown.
    pub fn remove_sink(&self, id: SinkId) -> bool {
        let mut inner = self.lock();
        let Some(index) = inner.streams.iter().position(|stream| stream.id == id) else {
            return false;
        };
        let mut stream = inner.streams.remove(index);
        if let Err(e) = stream.sink.flush() {
            debug!(sink = stream.sink.kind(), error = %e, "Log sink flush failed");
        }
        true
    }

    #[must_use]
    pub fn state(&self) -> LoggerState {
        self.lock().state
    }

    #[must_use]
    pub fn config(&self) -> LogSinkConfig {
        self.lock().config
    }

    /// Lowest severity any sink accepts, or `None` with no sinks.
    #[must_use]
    pub fn min_severity(&self) -> Option<Severity> {
        self.lock().min_severity()
    }

    /// Whether a record at `severity` would reach at least one sink.
    #[must_use]
    pub fn would_log(&self, severity: Severity) -> bool {
        self.min_severity().is_some_and(|min| severity >= min)
    }

    /// Forward `message` to every sink whose minimum `severity` meets.
    ///
    /// Never fails: sink errors are reported to `tracing` at debug and
    /// otherwise dropped.
    pub fn log(&self, severity: Severity, message: &str) {
        let mut inner = self.lock();
        if inner.state == LoggerState::Uninitialized {
            return;
        }
        inner.state = LoggerState::Active;

        if !inner.min_severity().is_some_and(|min| severity >= min) {
            return;
        }

        let config = inner.config;
        let record = LogRecord {
            severity,
            timestamp: config
                .timestamps
                .then(|| self.timestamp(config.timestamp_format)),
            thread: config.thread_ids.then(current_thread_tag),
            message,
        };
        let line = record.to_string();

        if let Some(primary) = inner.primary.as_mut() {
            if severity >= config.min_severity {
                deliver(primary.as_mut(), &record, &line);
            }
        }
        for stream in &mut inner.streams {
            if severity >= stream.min_severity {
                deliver(stream.sink.as_mut(), &record, &line);
            }
        }
    }

    /// Flush every sink, swallowing errors.
    pub fn flush(&self) {
        let mut inner = self.lock();
        let mut failures = 0_usize;
        if let Some(primary) = inner.primary.as_mut() {
            failures += usize::from(primary.flush().is_err());
        }
        for stream in &mut inner.streams {
            failures += usize::from(stream.sink.flush().is_err());
        }
        if failures > 0 {
            debug!(failures, "Log sink flush failed");
        }
    }

    fn timestamp(&self, format: TimestampFormat) -> Timestamp {
        match format {
            TimestampFormat::Elapsed => Timestamp::Elapsed(self.started.elapsed()),
            TimestampFormat::WallClock => Timestamp::WallClock(Utc::now()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoggerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn deliver(sink: &mut dyn LogSink, record: &LogRecord<'_>, line: &str) {
    if let Err(e) = sink.on_log_message(record, line) {
        debug!(sink = sink.kind(), error = %e, "Log sink write failed");
    }
}

fn current_thread_tag() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::{FailingSink, MemorySink};
    use std::sync::Arc;

    fn configured(min: Severity) -> (Logger, MemorySink) {
        let logger = Logger::new();
        let sink = MemorySink::new();
        logger.configure_sink(min, SinkTarget::Custom(Box::new(sink.clone())));
        (logger, sink)
    }

    #[test]
    fn test_state_transitions() {
        let logger = Logger::new();
        assert_eq!(logger.state(), LoggerState::Uninitialized);

        logger.enable_timestamps(true);
        assert_eq!(logger.state(), LoggerState::Configured);

        logger.configure_sink(Severity::Info, SinkTarget::Custom(Box::new(MemorySink::new())));
        assert_eq!(logger.state(), LoggerState::Configured);

        logger.log(Severity::Info, "first");
        assert_eq!(logger.state(), LoggerState::Active);

        logger.log(Severity::Info, "second");
        assert_eq!(logger.state(), LoggerState::Active);

        // Reconfiguring does not leave Active
        logger.enable_timestamps(false);
        assert_eq!(logger.state(), LoggerState::Active);
    }

    #[test]
    fn test_log_before_configuration_is_dropped() {
        let logger = Logger::new();
        logger.log(Severity::Error, "too early");
        assert_eq!(logger.state(), LoggerState::Uninitialized);
        assert!(!logger.would_log(Severity::Error));
    }

    #[test]
    fn test_filtered_log_still_activates() {
        let (logger, sink) = configured(Severity::Warning);
        logger.log(Severity::Info, "ignored");

        assert_eq!(logger.state(), LoggerState::Active);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_filtering_for_every_severity_pair() {
        for min in Severity::ALL {
            for call in Severity::ALL {
                let (logger, sink) = configured(min);
                logger.log(call, "message");

                let forwarded = sink.records().len() == 1;
                assert_eq!(forwarded, call >= min, "min={min} call={call}");
            }
        }
    }

    #[test]
    fn test_records_forwarded_in_call_order() {
        let (logger, sink) = configured(Severity::Verbose);
        let severities = [
            Severity::Error,
            Severity::Verbose,
            Severity::Warning,
            Severity::Info,
            Severity::Error,
        ];
        for (i, severity) in severities.iter().enumerate() {
            logger.log(*severity, &format!("message {i}"));
        }

        let messages: Vec<String> = sink.records().into_iter().map(|r| r.message).collect();
        let expected: Vec<String> = (0..severities.len()).map(|i| format!("message {i}")).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_timestamp_toggle_does_not_change_filtering() {
        let calls = [
            Severity::Verbose,
            Severity::Info,
            Severity::Warning,
            Severity::Error,
        ];

        let (plain_logger, plain) = configured(Severity::Warning);
        let (stamped_logger, stamped) = configured(Severity::Warning);
        stamped_logger.enable_timestamps(true);

        for severity in calls {
            plain_logger.log(severity, "m");
            stamped_logger.log(severity, "m");
        }

        let plain_severities: Vec<Severity> = plain.records().iter().map(|r| r.severity).collect();
        let stamped_severities: Vec<Severity> =
            stamped.records().iter().map(|r| r.severity).collect();
        assert_eq!(plain_severities, stamped_severities);
        assert!(plain.records().iter().all(|r| !r.timestamped));
        assert!(stamped.records().iter().all(|r| r.timestamped));
    }

    #[test]
    fn test_elapsed_timestamp_rendering() {
        let (logger, sink) = configured(Severity::Info);
        logger.enable_timestamps(true);
        logger.log(Severity::Info, "Hello WebRTC!");

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        let line = lines.first().unwrap();
        assert!(line.starts_with("[INFO] ["), "{line}");
        assert!(line.ends_with("] Hello WebRTC!"), "{line}");
        // [INFO] [SSS:mmm] Hello WebRTC!
        assert_eq!(line.len(), "[INFO] [000:000] Hello WebRTC!".len());
    }

    #[test]
    fn test_wall_clock_timestamp_rendering() {
        let (logger, sink) = configured(Severity::Info);
        logger.enable_timestamps(true);
        logger.set_timestamp_format(TimestampFormat::WallClock);
        logger.log(Severity::Info, "now");

        let lines = sink.lines();
        let line = lines.first().unwrap();
        assert!(line.contains('T') && line.contains("Z] now"), "{line}");
    }

    #[test]
    fn test_thread_ids() {
        let (logger, sink) = configured(Severity::Info);
        logger.enable_thread_ids(true);

        thread::Builder::new()
            .name("media-worker".to_string())
            .spawn(move || logger.log(Severity::Info, "from worker"))
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(sink.lines(), vec!["[INFO] [media-worker] from worker".to_string()]);
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        let logger = Logger::new();
        let memory = MemorySink::new();
        logger.configure_sink(Severity::Info, SinkTarget::Custom(Box::new(FailingSink)));
        logger.add_sink(Box::new(memory.clone()), Severity::Info);

        logger.log(Severity::Info, "still delivered");
        logger.flush();

        assert_eq!(memory.lines(), vec!["[INFO] still delivered".to_string()]);
    }

    #[test]
    fn test_streams_filter_independently() {
        let (logger, primary) = configured(Severity::Warning);
        let verbose = MemorySink::new();
        let errors = MemorySink::new();
        logger.add_sink(Box::new(verbose.clone()), Severity::Verbose);
        logger.add_sink(Box::new(errors.clone()), Severity::Error);

        assert_eq!(logger.min_severity(), Some(Severity::Verbose));

        logger.log(Severity::Verbose, "v");
        logger.log(Severity::Warning, "w");
        logger.log(Severity::Error, "e");

        assert_eq!(primary.lines(), vec!["[WARNING] w", "[ERROR] e"]);
        assert_eq!(verbose.lines(), vec!["[VERBOSE] v", "[WARNING] w", "[ERROR] e"]);
        assert_eq!(errors.lines(), vec!["[ERROR] e"]);
    }

    #[test]
    fn test_remove_sink() {
        let (logger, _primary) = configured(Severity::Error);
        let extra = MemorySink::new();
        let id = logger.add_sink(Box::new(extra.clone()), Severity::Verbose);

        logger.log(Severity::Info, "before");
        assert!(logger.remove_sink(id));
        assert!(!logger.remove_sink(id));
        logger.log(Severity::Info, "after");

        assert_eq!(extra.lines(), vec!["[INFO] before"]);
        assert_eq!(logger.min_severity(), Some(Severity::Error));
    }

    #[test]
    fn test_reconfigure_replaces_primary_sink() {
        let (logger, first) = configured(Severity::Info);
        let second = MemorySink::new();

        logger.log(Severity::Info, "one");
        logger.configure_sink(Severity::Info, SinkTarget::Custom(Box::new(second.clone())));
        logger.log(Severity::Info, "two");

        assert_eq!(first.lines(), vec!["[INFO] one"]);
        assert_eq!(second.lines(), vec!["[INFO] two"]);
    }

    #[test]
    fn test_concurrent_logging_preserves_per_thread_order() {
        let (logger, sink) = configured(Severity::Info);
        let logger = Arc::new(logger);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    for i in 0..50 {
                        logger.log(Severity::Info, &format!("{t}:{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let messages: Vec<String> = sink.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages.len(), 200);
        for t in 0..4 {
            let seen: Vec<usize> = messages
                .iter()
                .filter_map(|m| m.strip_prefix(&format!("{t}:")))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_rtc_log_macro_skips_filtered_formatting() {
        struct Loud;
        impl std::fmt::Display for Loud {
            #[allow(clippy::panic)]
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                panic!("formatted a filtered record");
            }
        }

        let (logger, sink) = configured(Severity::Warning);
        crate::rtc_log!(logger, Severity::Info, "{}", Loud);
        crate::rtc_log!(logger, Severity::Error, "code {}", 7);

        assert_eq!(sink.lines(), vec!["[ERROR] code 7"]);
    }
}

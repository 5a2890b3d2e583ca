//! Hello WebRTC configuration.
//!
//! Every variable is optional. With none set the bootstrap logs at `Info`
//! with elapsed timestamps to stderr.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use rtc_base::logging::{Severity, SinkTarget, TimestampFormat};
use thiserror::Error;

/// Default minimum severity for the console sink.
pub const DEFAULT_LOG_SEVERITY: Severity = Severity::Info;

/// Default readiness line.
pub const DEFAULT_HELLO_MESSAGE: &str = "Hello WebRTC!";

/// Console stream receiving the primary log sink's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Console {
    #[default]
    Stderr,
    Stdout,
}

impl Console {
    #[must_use]
    pub fn sink_target(self) -> SinkTarget {
        match self {
            Console::Stderr => SinkTarget::Stderr,
            Console::Stdout => SinkTarget::Stdout,
        }
    }
}

/// Hello WebRTC configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Minimum severity for the console and file sinks (default: info).
    pub log_severity: Severity,

    /// Prefix records with a timestamp (default: true).
    pub log_timestamps: bool,

    /// Timestamp rendering (default: elapsed).
    pub timestamp_format: TimestampFormat,

    /// Prefix records with the logging thread (default: false).
    pub log_threads: bool,

    /// Console stream for the primary sink (default: stderr).
    pub console: Console,

    /// Optional file receiving a copy of every forwarded record.
    pub log_file: Option<PathBuf>,

    /// Message logged once the bootstrap is ready.
    pub hello_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_severity: DEFAULT_LOG_SEVERITY,
            log_timestamps: true,
            timestamp_format: TimestampFormat::Elapsed,
            log_threads: false,
            console: Console::Stderr,
            log_file: None,
            hello_message: DEFAULT_HELLO_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending variable.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_severity = match vars.get("RTC_LOG_SEVERITY") {
            Some(value) => value.parse::<Severity>().map_err(|e| {
                ConfigError::InvalidValue(format!("RTC_LOG_SEVERITY: {e}"))
            })?,
            None => defaults.log_severity,
        };

        let log_timestamps = match vars.get("RTC_LOG_TIMESTAMPS") {
            Some(value) => parse_flag("RTC_LOG_TIMESTAMPS", value)?,
            None => defaults.log_timestamps,
        };

        let timestamp_format = match vars.get("RTC_LOG_TIMESTAMP_FORMAT") {
            Some(value) => parse_timestamp_format(value)?,
            None => defaults.timestamp_format,
        };

        let log_threads = match vars.get("RTC_LOG_THREADS") {
            Some(value) => parse_flag("RTC_LOG_THREADS", value)?,
            None => defaults.log_threads,
        };

        let console = match vars.get("RTC_LOG_CONSOLE") {
            Some(value) => parse_console(value)?,
            None => defaults.console,
        };

        let log_file = vars
            .get("RTC_LOG_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let hello_message = vars
            .get("RTC_HELLO_MESSAGE")
            .cloned()
            .unwrap_or(defaults.hello_message);

        Ok(Config {
            log_severity,
            log_timestamps,
            timestamp_format,
            log_threads,
            console,
            log_file,
            hello_message,
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{name}: expected a boolean, got {value:?}"
        ))),
    }
}

fn parse_timestamp_format(value: &str) -> Result<TimestampFormat, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "elapsed" => Ok(TimestampFormat::Elapsed),
        "wall_clock" | "wallclock" => Ok(TimestampFormat::WallClock),
        _ => Err(ConfigError::InvalidValue(format!(
            "RTC_LOG_TIMESTAMP_FORMAT: expected elapsed or wall_clock, got {value:?}"
        ))),
    }
}

fn parse_console(value: &str) -> Result<Console, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "stderr" => Ok(Console::Stderr),
        "stdout" => Ok(Console::Stdout),
        _ => Err(ConfigError::InvalidValue(format!(
            "RTC_LOG_CONSOLE: expected stderr or stdout, got {value:?}"
        ))),
    }
}

//! Log severities.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Ordered severity used for filtering.
///
/// `Verbose < Info < Warning < Error < None`. `None` as a sink minimum
/// suppresses everything except records logged at `None` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Verbose,
    Info,
    Warning,
    Error,
    None,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 5] = [
        Severity::Verbose,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::None,
    ];

    /// Upper-case tag used in rendered lines.
    #[must_use]
    pub fn as_tag(self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::None => "NONE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown log severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbose" => Ok(Severity::Verbose),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "none" => Ok(Severity::None),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

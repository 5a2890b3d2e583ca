//! Hello WebRTC error types.
//!
//! Every bootstrap failure maps to a non-zero process exit code. The secure
//! transport is already released by the time one of these reaches `main`.

use std::io;
use std::path::PathBuf;

use rtc_base::errors::{InitError, ShutdownError};
use thiserror::Error;

use crate::config::ConfigError;

/// Bootstrap error type.
///
/// Maps to process exit codes:
/// - `Config`, `LogFile`: 2
/// - `Init`: 3
/// - `Shutdown`: 4
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The configured log file could not be opened.
    #[error("Failed to open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Secure transport initialization failed.
    #[error("Secure transport initialization failed: {0}")]
    Init(#[from] InitError),

    /// Secure transport shutdown failed.
    #[error("Secure transport shutdown failed: {0}")]
    Shutdown(#[from] ShutdownError),
}

impl BootstrapError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Config(_) | BootstrapError::LogFile { .. } => 2,
            BootstrapError::Init(_) => 3,
            BootstrapError::Shutdown(_) => 4,
        }
    }

    /// Returns a bounded label string for the error variant (for structured logs).
    #[must_use]
    pub fn error_type_label(&self) -> &'static str {
        match self {
            BootstrapError::Config(_) => "config",
            BootstrapError::LogFile { .. } => "log_file",
            BootstrapError::Init(InitError::AlreadyInitialized) => "already_initialized",
            BootstrapError::Init(InitError::Transport(_)) => "transport",
            BootstrapError::Shutdown(ShutdownError::NotInitialized) => "not_initialized",
        }
    }
}

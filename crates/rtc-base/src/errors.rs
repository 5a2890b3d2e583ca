//! Secure transport lifecycle errors.
//!
//! Initialization and shutdown report explicit failures to the caller.
//! Logging has no error type: sink failures never reach callers.

use thiserror::Error;

/// Errors raised by the underlying TLS library during initialization.
///
/// Treated as pass-through: callers report them, they do not inspect them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TLS library rejected the provider configuration.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The provider's secure random source could not produce bytes.
    #[error("Secure random source unavailable")]
    RandomUnavailable,

    /// The context was used after its registry shut down.
    #[error("Secure transport context used after shutdown")]
    ContextReleased,
}

impl From<rustls::crypto::GetRandomFailed> for TransportError {
    fn from(_: rustls::crypto::GetRandomFailed) -> Self {
        TransportError::RandomUnavailable
    }
}

/// Secure transport initialization errors.
#[derive(Debug, Error)]
pub enum InitError {
    /// A context is already live; shut it down before initializing again.
    #[error("Secure transport already initialized")]
    AlreadyInitialized,

    /// The TLS library failed its startup self check.
    #[error("Secure transport initialization failed: {0}")]
    Transport(#[from] TransportError),
}

/// Secure transport shutdown errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShutdownError {
    /// Shutdown without a prior successful initialize.
    #[error("Secure transport not initialized")]
    NotInitialized,
}

//! Base utilities shared by Hello WebRTC components.
//!
//! - [`ssl`] - secure transport (TLS) bootstrap with scoped teardown
//! - [`logging`] - severity-filtered log sinks with optional timestamps
//! - [`errors`] - error types for the secure transport lifecycle

#![warn(clippy::pedantic)]

/// Module for secure transport lifecycle errors
pub mod errors;

/// Module for severity-filtered diagnostic logging
pub mod logging;

/// Module for the secure transport context
pub mod ssl;

/// Module for test utilities (capture sinks)
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

//! Hello WebRTC Library
//!
//! Bootstrap sequence for the Hello WebRTC smoke test:
//!
//! 1. Initialize the secure transport subsystem
//! 2. Configure the diagnostic log sink
//! 3. Emit the readiness line
//! 4. Shut the secure transport down (also on every early return)
//!
//! # Modules
//!
//! - [`bootstrap`] - The ordered startup/teardown sequence
//! - [`config`] - Configuration from environment
//! - [`errors`] - Error types with process exit codes

pub mod bootstrap;
pub mod config;
pub mod errors;

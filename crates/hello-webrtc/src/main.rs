//! Hello WebRTC
//!
//! Smoke test for the real-time communication stack: brings the secure
//! transport up, logs one line, and tears it down again.
//!
//! # Startup Flow
//!
//! 1. Initialize tracing (`RUST_LOG`, default `warn`)
//! 2. Load configuration from environment
//! 3. Initialize the process-wide secure transport
//! 4. Configure the console log sink (stderr, Info, timestamps)
//! 5. Log the readiness line
//! 6. Shut the secure transport down and exit 0
//!
//! Any failure exits non-zero before the readiness line.

#![warn(clippy::pedantic)]

use std::process::ExitCode;

use hello_webrtc::bootstrap;
use hello_webrtc::config::Config;
use hello_webrtc::errors::BootstrapError;
use rtc_base::logging::Logger;
use rtc_base::ssl::SecureTransport;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Diagnostics go to stderr; the log sink owns the readiness line
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(
                error = %e,
                error_type = e.error_type_label(),
                exit_code = e.exit_code(),
                "Bootstrap failed"
            );
            ExitCode::from(e.exit_code())
        }
    }
}

fn try_main() -> Result<(), BootstrapError> {
    let config = Config::from_env()?;
    let logger = Logger::new();

    bootstrap::run(
        &config,
        SecureTransport::process_wide(),
        &logger,
        config.console.sink_target(),
    )
}

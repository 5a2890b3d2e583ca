//! Ordered startup and teardown.
//!
//! The secure transport context is acquired first and held for the whole
//! sequence. Any `?` after acquisition drops the context, which shuts the
//! transport down before the error reaches the caller.

use rtc_base::logging::{FileSink, Logger, Severity, SinkTarget};
use rtc_base::ssl::SecureTransport;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::errors::BootstrapError;

/// Run the bootstrap sequence.
///
/// `target` is the primary (console) sink; a configured log file is added
/// alongside it at the same severity.
///
/// # Errors
///
/// - [`BootstrapError::Init`] if the secure transport cannot be initialized.
/// - [`BootstrapError::LogFile`] if the configured log file cannot be opened.
/// - [`BootstrapError::Shutdown`] if the transport was shut down elsewhere
///   before the sequence finished.
#[instrument(skip_all)]
pub fn run(
    config: &Config,
    transport: &SecureTransport,
    logger: &Logger,
    target: SinkTarget,
) -> Result<(), BootstrapError> {
    let context = transport.initialize()?;
    debug!(generation = context.generation(), "Secure transport ready");

    configure_logger(config, logger, target)?;

    logger.log(Severity::Info, &config.hello_message);
    logger.flush();

    context.shutdown()?;
    info!("Bootstrap complete");
    Ok(())
}

fn configure_logger(
    config: &Config,
    logger: &Logger,
    target: SinkTarget,
) -> Result<(), BootstrapError> {
    logger.configure_sink(config.log_severity, target);
    logger.enable_timestamps(config.log_timestamps);
    logger.set_timestamp_format(config.timestamp_format);
    logger.enable_thread_ids(config.log_threads);

    if let Some(path) = &config.log_file {
        let sink = FileSink::open(path).map_err(|source| BootstrapError::LogFile {
            path: path.clone(),
            source,
        })?;
        logger.add_sink(Box::new(sink), config.log_severity);
        debug!(path = %path.display(), "Log file sink added");
    }

    let effective = logger.config();
    debug!(
        min_severity = %effective.min_severity,
        timestamps = effective.timestamps,
        timestamp_format = ?effective.timestamp_format,
        thread_ids = effective.thread_ids,
        console = ?config.console,
        "Log sink configured"
    );
    Ok(())
}

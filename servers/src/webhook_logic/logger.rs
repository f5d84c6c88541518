use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// # Setup Logging
///
/// Configures the `tracing` subscriber for the webhook server.
///
/// Logging is set up to:
/// - Read the log level from the `RUST_LOG` environment variable, falling
///   back to the configured level.
/// - Write logs to both standard output (console) and a daily rotating file.
/// - Console logs are human-readable with ANSI color support.
/// - File logs are JSON-formatted for structured analysis.
///
/// Returns the `WorkerGuard` of the non-blocking file appender; the caller
/// must keep it alive for the lifetime of the process so buffered log lines
/// are flushed on shutdown.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<WorkerGuard> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    // Daily rotating file appender named after the binary.
    let file_appender = rolling::daily(log_dir, "server_webhook");
    let (non_blocking_appender, guard) = non_blocking(file_appender);

    // Console layer for stdout, with target information and ANSI colors.
    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    // JSON-formatted file layer for structured logging.
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .json();

    // Environment filter from RUST_LOG, else the configured level.
    let env_filter: EnvFilter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized with level: {}", log_level);
    Ok(guard)
}

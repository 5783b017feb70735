//! Structured Logger
//!
//! Wraps `tracing` to provide a human console layer, a daily-rotated NDJSON
//! file layer, and environment-based level control.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for rolled logs: `lectern.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "lectern.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `level`. Fails if the log directory cannot be
/// created. Returns `Ok(false)` if a global subscriber was already installed
/// (e.g. by a test harness); the existing one is kept.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> Result<bool> {
    let log_dir = log_dir.as_ref();
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .with_context(|| format!("Failed to open log directory: {}", log_dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok())
}

/// Console-only logger for contexts without a writable log directory.
pub fn init_console_logger(level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok()
}

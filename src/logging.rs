// Tracing setup. RUST_LOG always wins over the configured level.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_PREFIX: &str = "idswatch.log";

pub fn env_filter(level: &str, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("idswatch={}", level)))
}

/// One-shot commands log to stderr so stdout stays clean for tables and JSON
pub fn init_stderr(level: &str, verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter(level, verbose))
        .try_init();
}

/// The dashboard owns the terminal, so watch mode logs to a daily file.
/// Keep the guard alive until exit or buffered lines are lost.
pub fn init_file(directory: &Path, level: &str, verbose: bool) -> Result<WorkerGuard> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory: {}", directory.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(level, verbose))
        .try_init();
    Ok(guard)
}

//! Structured logging for pipewatch itself, using `tracing-subscriber` and
//! `tracing-appender`.
//!
//! Two modes:
//! - **CLI** ([`init_cli`]): console-only for one-shot subcommands
//! - **File** ([`init_file`]): JSON file layer (daily rotation) + console
//!   layer, selected with `--log-dir`
//!
//! Pipelines that want to write logs pipewatch can read use
//! [`crate::bootstrap`] instead.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Holds the non-blocking writer guard for file logging.
///
/// The [`WorkerGuard`] must be kept alive for the duration of the process.
/// Dropping it flushes pending log entries and closes the file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// `RUST_LOG` filter, falling back to `default` when unset or invalid.
pub(crate) fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialise file logging.
///
/// Writes JSON logs to `{logs_dir}/pipewatch.log.YYYY-MM-DD` with daily
/// rotation, plus human-readable output to stderr. Both are controlled by
/// `RUST_LOG` (default: `info`).
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_file(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "pipewatch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(json_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install global tracing subscriber")?;

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise console logging for CLI subcommands.
///
/// Emits human-readable output to stderr only, default level `warn` so the
/// tables on stdout stay clean. Controlled by `RUST_LOG`. Does nothing if a
/// subscriber is already installed.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .try_init();
}

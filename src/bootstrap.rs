//! Logging bootstrap for pipeline processes.
//!
//! A pipeline calls [`init_pipeline`] once at startup. It loads `.env`,
//! creates `<base>/log/<pipeline>/`, trims old run logs, and installs a
//! subscriber that writes `<name>_<YYYYMMDD_HHMMSS>.log` in the plain layout
//! the parser reads:
//!
//! ```text
//! 2024-01-01 10:00:00 INFO Starting etl_orders
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, Event, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::classifier::TIMESTAMP_FORMAT;
use crate::discovery::{self, LOG_EXTENSION};
use crate::logging::env_filter;

/// Name of the directory under the base dir that holds pipeline logs.
pub const LOG_DIR_NAME: &str = "log";

/// Layout of the run stamp embedded in run-log file names.
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Layer type writing run logs to a file.
pub type RunLogLayer<S> =
    tracing_subscriber::fmt::Layer<S, DefaultFields, RunLogFormat, NonBlocking>;

/// Errors raised while preparing a pipeline's log directory.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The log directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An old log file could not be removed.
    #[error("failed to remove old log {}: {source}", path.display())]
    Prune {
        /// File that was being removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The log file appender could not be opened.
    #[error("failed to open run log: {0}")]
    Appender(#[from] InitError),
}

/// Options for [`init_pipeline`].
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Env file, resolved against the base dir first, then the working dir.
    pub env_file: String,
    /// Log subdirectory name; defaults to the pipeline name.
    pub log_subdir: Option<String>,
    /// Older run logs of this pipeline to keep next to the new one.
    pub backup_count: usize,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            env_file: ".env".to_owned(),
            log_subdir: None,
            backup_count: 5,
        }
    }
}

/// A pipeline process with logging installed.
///
/// Keep it alive until the pipeline exits; dropping it flushes the log file.
pub struct PipelineRun {
    /// Base directory the pipeline was initialised from.
    pub base_dir: PathBuf,
    /// Directory holding this pipeline's run logs.
    pub log_dir: PathBuf,
    /// Run log written by this process.
    pub log_file: PathBuf,
    _guard: WorkerGuard,
}

/// Event formatter producing `"<YYYY-MM-DD HH:MM:SS> <LEVEL> <message>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLogFormat;

impl<S, N> FormatEvent<S, N> for RunLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = Local::now().format(TIMESTAMP_FORMAT);
        write!(writer, "{now} {} ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn run_log_stem(name: &str, stamp: &str) -> String {
    format!("{name}_{stamp}")
}

/// Whether `file` is exactly `<name>_<YYYYMMDD_HHMMSS>.log`.
///
/// Run logs of `orders_daily` share the `orders_` prefix and must not count
/// as runs of `orders`.
fn is_run_log_of(file: &str, name: &str) -> bool {
    let Some(stamp) = file
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(LOG_EXTENSION))
        .and_then(|rest| rest.strip_suffix('.'))
    else {
        return false;
    };

    stamp.len() == "YYYYMMDD_HHMMSS".len()
        && NaiveDateTime::parse_from_str(stamp, RUN_STAMP_FORMAT).is_ok()
}

/// Build a layer writing run logs for `name` into `log_dir`.
///
/// Returns the layer, the guard that flushes it on drop, and the log path.
///
/// # Errors
///
/// Returns [`BootstrapError::Appender`] if the log file cannot be opened.
pub fn run_log_layer<S>(
    log_dir: &Path,
    name: &str,
) -> Result<(RunLogLayer<S>, WorkerGuard, PathBuf), BootstrapError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let stamp = Local::now().format(RUN_STAMP_FORMAT).to_string();
    let stem = run_log_stem(name, &stamp);
    let log_file = log_dir.join(format!("{stem}.{LOG_EXTENSION}"));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(stem)
        .filename_suffix(LOG_EXTENSION)
        .build(log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .event_format(RunLogFormat)
        .with_ansi(false)
        .with_writer(non_blocking);

    Ok((layer, guard, log_file))
}

/// Remove all but the newest `keep` run logs of `name` in `log_dir`.
///
/// Returns how many files were removed.
///
/// # Errors
///
/// Returns [`BootstrapError::Prune`] if a file cannot be deleted.
pub fn prune_old_logs(log_dir: &Path, name: &str, keep: usize) -> Result<usize, BootstrapError> {
    let mut removed: usize = 0;

    for file in discovery::list_log_files(log_dir)
        .into_iter()
        .filter(|file| is_run_log_of(file, name))
        .skip(keep)
    {
        let path = log_dir.join(&file);
        fs::remove_file(&path).map_err(|source| BootstrapError::Prune {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "removed old run log");
        removed = removed.saturating_add(1);
    }

    Ok(removed)
}

fn load_env(base_dir: &Path, env_file: &str) {
    let env_path = base_dir.join(env_file);
    let loaded = if env_path.is_file() {
        dotenvy::from_path(&env_path)
    } else {
        dotenvy::from_filename(env_file).map(|_| ())
    };
    if let Err(e) = loaded {
        debug!(env_file, error = %e, "no env file loaded");
    }
}

/// Initialise environment and logging for a pipeline process.
///
/// Logs go to `<base_dir>/log/<log_subdir or name>/` and to stderr, both in
/// the run-log layout. The file always receives `INFO` and above so the
/// monitor can classify the run; `RUST_LOG` only tunes the console. At most
/// `backup_count` older run logs of the same pipeline are kept.
///
/// # Errors
///
/// Returns an error if the log directory cannot be prepared, the log file
/// cannot be opened, or a global subscriber is already installed.
pub fn init_pipeline(
    base_dir: &Path,
    name: &str,
    options: &BootstrapOptions,
) -> anyhow::Result<PipelineRun> {
    load_env(base_dir, &options.env_file);

    let log_dir = base_dir
        .join(LOG_DIR_NAME)
        .join(options.log_subdir.as_deref().unwrap_or(name));
    fs::create_dir_all(&log_dir).map_err(|source| BootstrapError::CreateDir {
        path: log_dir.clone(),
        source,
    })?;

    prune_old_logs(&log_dir, name, options.backup_count)?;

    let (file_layer, guard, log_file) = run_log_layer(&log_dir, name)?;
    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(RunLogFormat)
        .with_writer(io::stderr)
        .with_filter(env_filter("info"));

    tracing_subscriber::registry()
        .with(file_layer.with_filter(LevelFilter::INFO))
        .with(console_layer)
        .try_init()
        .with_context(|| format!("failed to install logging for pipeline '{name}'"))?;

    info!("Pipeline '{name}' initialized");
    info!("Base directory: {}", base_dir.display());
    info!("Log directory: {}", log_dir.display());

    Ok(PipelineRun {
        base_dir: base_dir.to_path_buf(),
        log_dir,
        log_file,
        _guard: guard,
    })
}

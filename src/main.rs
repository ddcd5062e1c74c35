//! Pipewatch CLI entry point.
//!
//! Provides `status`, `pipelines`, `logs`, and `show` subcommands over the
//! pipeline log root.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use pipewatch::config::{load_default_config, Config};
use pipewatch::{discovery, explorer, logging, report, summary};

/// Pipewatch — run-status monitor for batch data-pipeline logs.
#[derive(Parser)]
#[command(name = "pipewatch", version, about)]
struct Cli {
    /// Path to a `pipewatch.toml` config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log root directory (overrides config and `PIPEWATCH_LOG_ROOT`).
    #[arg(long, global = true)]
    log_root: Option<PathBuf>,

    /// Also write pipewatch's own logs as JSON into this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Show the status of the newest run of every pipeline.
    Status {
        /// Print rows as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// List pipeline names under the log root.
    Pipelines,
    /// List a pipeline's log files, newest first.
    Logs {
        /// Pipeline name.
        pipeline: String,
    },
    /// Show parsed details, tracebacks, and the tail of one log.
    Show {
        /// Pipeline name.
        pipeline: String,
        /// Log file name (defaults to the newest).
        #[arg(long)]
        file: Option<String>,
        /// Number of trailing lines to preview.
        #[arg(long)]
        tail: Option<usize>,
        /// Print the parsed record as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = match cli.log_dir.as_deref() {
        Some(dir) => Some(logging::init_file(dir)?),
        None => {
            logging::init_cli();
            None
        }
    };

    let mut config = load_default_config(cli.config.as_deref())?;
    if let Some(root) = cli.log_root {
        config.monitor.log_root = root;
    }
    debug!(log_root = %config.monitor.log_root.display(), "configuration loaded");

    match cli.command {
        Command::Status { json } => handle_status(&config, json).await,
        Command::Pipelines => handle_pipelines(&config),
        Command::Logs { pipeline } => handle_logs(&config, &pipeline),
        Command::Show {
            pipeline,
            file,
            tail,
            json,
        } => handle_show(&config, &pipeline, file, tail, json),
    }
}

/// Print the pipeline overview.
async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let root = &config.monitor.log_root;
    let pipelines = summary::collect_pipelines(root);
    if pipelines.is_empty() {
        anyhow::bail!("no pipeline directories found under {}", root.display());
    }

    let rows = if config.monitor.concurrent {
        summary::aggregate_concurrent(pipelines).await
    } else {
        summary::aggregate(&pipelines)
    };
    info!(pipelines = rows.len(), "pipeline overview built");

    if json {
        let out = serde_json::to_string_pretty(&rows).context("failed to serialize summary")?;
        println!("{out}");
    } else {
        print!("{}", report::render_summary(&rows));
    }
    Ok(())
}

/// Print pipeline names.
fn handle_pipelines(config: &Config) -> anyhow::Result<()> {
    for pipeline in discovery::list_pipelines(&config.monitor.log_root) {
        println!("{}", pipeline.name);
    }
    Ok(())
}

fn pipeline_dir(config: &Config, pipeline: &str) -> anyhow::Result<PathBuf> {
    let dir = config.monitor.log_root.join(pipeline);
    if !dir.is_dir() {
        anyhow::bail!(
            "pipeline '{pipeline}' not found under {}",
            config.monitor.log_root.display()
        );
    }
    Ok(dir)
}

/// Print a pipeline's log files, newest first.
fn handle_logs(config: &Config, pipeline: &str) -> anyhow::Result<()> {
    let dir = pipeline_dir(config, pipeline)?;
    let files = discovery::list_log_files(&dir);
    if files.is_empty() {
        eprintln!("No log files found for `{pipeline}`.");
    }
    for file in files {
        println!("{file}");
    }
    Ok(())
}

/// Print the detail view of one log file.
fn handle_show(
    config: &Config,
    pipeline: &str,
    file: Option<String>,
    tail: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let dir = pipeline_dir(config, pipeline)?;
    let file = match file {
        Some(file) => file,
        None => {
            newest_log(&dir).with_context(|| format!("no log files found for `{pipeline}`"))?
        }
    };

    let tail = tail.unwrap_or(config.explorer.tail_lines);
    let details = explorer::explore(&dir, &file, tail);

    if json {
        let out = serde_json::to_string_pretty(&details.record)
            .context("failed to serialize log record")?;
        println!("{out}");
    } else {
        print!("{}", report::render_details(&details));
    }
    Ok(())
}

fn newest_log(dir: &Path) -> Option<String> {
    discovery::list_log_files(dir).into_iter().next()
}

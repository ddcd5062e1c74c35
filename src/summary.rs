//! Per-pipeline summary of the newest run.
//!
//! For each pipeline the newest log file is parsed and reduced to one
//! [`PipelineSummaryRow`]. Pipelines never affect each other: a missing or
//! unreadable log only changes its own row.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::classifier::TIMESTAMP_FORMAT;
use crate::discovery;
use crate::parser;
use crate::status::RunStatus;

/// Placeholder shown for fields a row has no value for.
pub const NOT_AVAILABLE: &str = "N/A";

/// Status column of a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryStatus {
    /// Status of the newest parsed run.
    Run(RunStatus),
    /// The pipeline directory holds no log files.
    NoLogs,
}

impl SummaryStatus {
    /// Human label for the status.
    pub fn label(self) -> &'static str {
        match self {
            Self::Run(status) => status.label(),
            Self::NoLogs => "No Logs",
        }
    }

    /// Traffic-light indicator shown next to the label.
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Run(RunStatus::Success) => "🟢",
            Self::Run(RunStatus::Fail) => "🔴",
            Self::Run(RunStatus::Running) => "🟠",
            Self::Run(RunStatus::Unknown) | Self::NoLogs => "⚪",
        }
    }
}

impl fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.indicator(), self.label())
    }
}

impl Serialize for SummaryStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A pipeline and its log files, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineLogs {
    /// Pipeline name (directory basename).
    pub name: String,
    /// Pipeline directory.
    pub dir: PathBuf,
    /// Log file names inside `dir`, index 0 being the newest.
    pub log_files: Vec<String>,
}

/// One row of the pipeline overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummaryRow {
    /// Pipeline name.
    pub pipeline_name: String,
    /// Status of the newest run, or [`SummaryStatus::NoLogs`].
    pub status: SummaryStatus,
    /// Modification time of the newest log file.
    #[serde(with = "crate::parser::serde_timestamp")]
    pub last_run: Option<NaiveDateTime>,
    /// Runtime of the newest run in minutes.
    pub completed_in_minutes: Option<f64>,
    /// Rolling window of the newest run.
    pub rolling_window: Option<String>,
}

impl PipelineSummaryRow {
    /// Row for a pipeline with no log files.
    pub fn no_logs(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            status: SummaryStatus::NoLogs,
            last_run: None,
            completed_in_minutes: None,
            rolling_window: None,
        }
    }

    /// `last_run` formatted for display, or `N/A`.
    pub fn last_run_display(&self) -> String {
        self.last_run
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }

    /// `completed_in_minutes` formatted for display, or `N/A`.
    pub fn completed_in_display(&self) -> String {
        self.completed_in_minutes
            .map(format_minutes)
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }

    /// `rolling_window` for display, or `N/A`.
    pub fn rolling_window_display(&self) -> &str {
        self.rolling_window.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

/// Format minutes the way the overview shows them (`5.0`, `0.33`).
pub fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{minutes:.1}")
    } else {
        format!("{minutes}")
    }
}

/// Discover every pipeline under `root` together with its log files.
pub fn collect_pipelines(root: &Path) -> Vec<PipelineLogs> {
    discovery::list_pipelines(root)
        .into_iter()
        .map(|pipeline| {
            let log_files = discovery::list_log_files(&pipeline.path);
            PipelineLogs {
                name: pipeline.name,
                dir: pipeline.path,
                log_files,
            }
        })
        .collect()
}

/// Build the summary row for one pipeline.
pub fn summarize(pipeline: &PipelineLogs) -> PipelineSummaryRow {
    let Some(latest) = pipeline.log_files.first() else {
        return PipelineSummaryRow::no_logs(pipeline.name.clone());
    };

    let path = pipeline.dir.join(latest);
    let record = parser::parse_file(&path);
    let last_run = modified_time(&path);

    debug!(
        pipeline = %pipeline.name,
        file = %latest,
        status = %record.status,
        "summarized pipeline"
    );

    PipelineSummaryRow {
        pipeline_name: pipeline.name.clone(),
        status: SummaryStatus::Run(record.status),
        last_run,
        completed_in_minutes: record.runtime_minutes,
        rolling_window: record.rolling_window.filter(|w| !w.is_empty()),
    }
}

/// Summarize every pipeline in order, one row each.
pub fn aggregate(pipelines: &[PipelineLogs]) -> Vec<PipelineSummaryRow> {
    pipelines.iter().map(summarize).collect()
}

/// Summarize pipelines on tokio's blocking pool, one task per pipeline.
///
/// Rows come back in input order. A task that fails to complete yields an
/// `unknown` row for its pipeline.
pub async fn aggregate_concurrent(pipelines: Vec<PipelineLogs>) -> Vec<PipelineSummaryRow> {
    let handles: Vec<_> = pipelines
        .into_iter()
        .map(|pipeline| {
            let name = pipeline.name.clone();
            let handle = tokio::task::spawn_blocking(move || summarize(&pipeline));
            (name, handle)
        })
        .collect();

    let mut rows = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        match handle.await {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(pipeline = %name, error = %e, "summary task failed");
                rows.push(PipelineSummaryRow {
                    pipeline_name: name,
                    status: SummaryStatus::Run(RunStatus::Unknown),
                    last_run: None,
                    completed_in_minutes: None,
                    rolling_window: None,
                });
            }
        }
    }
    rows
}

/// Local modification time of a file, truncated to whole seconds.
fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let local: DateTime<Local> = modified.into();
    let naive = local.naive_local();
    Some(naive.with_nanosecond(0).unwrap_or(naive))
}

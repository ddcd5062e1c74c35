//! Single-pass parser that folds a run log into a [`ParsedLogRecord`].
//!
//! The scan threads one [`ScanState`] accumulator through the lines of a log
//! and consumes it into an immutable record at the end. Content is never an
//! error: anything the classifiers do not recognise is simply left out of the
//! record. Only reading the file can fail, and [`parse_file`] absorbs that
//! into a [`RunStatus::Unknown`] record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classifier;
use crate::status::{self, RunStatus, StatusEvidence};

/// Structured view of one run log. Recomputed on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedLogRecord {
    /// Job/ETL unit named by the first `INFO Starting <unit>` line.
    pub unit_name: Option<String>,
    /// Final classification of the run.
    pub status: RunStatus,
    /// Timestamp of the first timestamped line.
    #[serde(with = "serde_timestamp")]
    pub start_time: Option<NaiveDateTime>,
    /// Timestamp of the most recent timestamped line.
    #[serde(with = "serde_timestamp")]
    pub end_time: Option<NaiveDateTime>,
    /// `end_time - start_time` in minutes, rounded to two decimals.
    pub runtime_minutes: Option<f64>,
    /// Descriptor from the last `Rolling Window:` line.
    pub rolling_window: Option<String>,
    /// Number of lines carrying the error marker.
    pub error_count: usize,
    /// Captured blocks following error lines, in order of appearance.
    pub tracebacks: Vec<String>,
}

/// Why a log file could not be turned into text.
#[derive(Debug, thiserror::Error)]
pub enum LogReadError {
    /// The file does not exist.
    #[error("log file not found: {}", path.display())]
    NotFound {
        /// Path that was opened.
        path: PathBuf,
    },

    /// Any other I/O failure (permissions, a directory, ...).
    #[error("failed to read log file {}: {source}", path.display())]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The bytes are not valid UTF-8.
    #[error("log file {} is not valid UTF-8", path.display())]
    InvalidUtf8 {
        /// Path that was opened.
        path: PathBuf,
    },
}

/// Mutable accumulator for one forward scan.
#[derive(Debug, Default)]
pub struct ScanState {
    unit_name: Option<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    rolling_window: Option<String>,
    failed: bool,
    error_count: usize,
    succeeded: bool,
    in_traceback: bool,
    traceback_buffer: Vec<String>,
    tracebacks: Vec<String>,
}

impl ScanState {
    /// Start an empty scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one line into the accumulator.
    ///
    /// Lines are expected to keep their terminators so that captured
    /// tracebacks preserve the original line breaks.
    pub fn feed(&mut self, line: &str) {
        if classifier::match_success(line) {
            self.succeeded = true;
        }

        if self.unit_name.is_none() {
            if let Some(unit) = classifier::match_unit_start(line) {
                self.unit_name = Some(unit.to_owned());
            }
        }

        if let Some(ts) = classifier::match_leading_timestamp(line) {
            if self.start_time.is_none() {
                self.start_time = Some(ts);
            }
            self.end_time = Some(ts);
        }

        if let Some(window) = classifier::match_rolling_window(line) {
            self.rolling_window = Some(window.to_owned());
        }

        if classifier::match_error(line) {
            self.failed = true;
            self.error_count = self.error_count.saturating_add(1);
            self.traceback_buffer.clear();
            self.in_traceback = true;
            return;
        }

        if self.in_traceback {
            if line.trim().is_empty() {
                self.flush_traceback();
                self.in_traceback = false;
            } else {
                self.traceback_buffer.push(line.to_owned());
            }
        }
    }

    fn flush_traceback(&mut self) {
        if !self.traceback_buffer.is_empty() {
            self.tracebacks.push(self.traceback_buffer.concat());
            self.traceback_buffer.clear();
        }
    }

    /// Close the scan and produce the final record.
    pub fn finish(mut self) -> ParsedLogRecord {
        // A block still open at end of input counts.
        self.flush_traceback();

        let runtime_minutes = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(runtime_minutes(start, end)),
            _ => None,
        };

        let status = status::resolve(&StatusEvidence {
            failed: self.failed,
            error_count: self.error_count,
            succeeded: self.succeeded,
        });

        ParsedLogRecord {
            unit_name: self.unit_name,
            status,
            start_time: self.start_time,
            end_time: self.end_time,
            runtime_minutes,
            rolling_window: self.rolling_window,
            error_count: self.error_count,
            tracebacks: self.tracebacks,
        }
    }
}

/// Minutes between two timestamps, rounded to two decimals. May be negative.
fn runtime_minutes(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let seconds = end.signed_duration_since(start).num_seconds();
    #[allow(clippy::cast_precision_loss)]
    let minutes = seconds as f64 / 60.0;
    (minutes * 100.0).round() / 100.0
}

/// Parse a sequence of lines (terminators included) into a record.
pub fn parse_lines<'a, I>(lines: I) -> ParsedLogRecord
where
    I: IntoIterator<Item = &'a str>,
{
    let mut state = ScanState::new();
    for line in lines {
        state.feed(line);
    }
    state.finish()
}

/// Parse a whole log held in memory.
pub fn parse_text(text: &str) -> ParsedLogRecord {
    parse_lines(text.split_inclusive('\n'))
}

/// Read a log file as UTF-8 text.
///
/// # Errors
///
/// Returns [`LogReadError`] if the file is missing, unreadable, or not UTF-8.
pub fn read_log_text(path: &Path) -> Result<String, LogReadError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LogReadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LogReadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    String::from_utf8(bytes).map_err(|_| LogReadError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}

/// Parse a log file, degrading to an `Unknown` record if it cannot be read.
pub fn parse_file(path: &Path) -> ParsedLogRecord {
    match read_log_text(path) {
        Ok(text) => {
            let record = parse_text(&text);
            debug!(
                path = %path.display(),
                status = %record.status,
                errors = record.error_count,
                "parsed log file"
            );
            record
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable log file, status unknown");
            ParsedLogRecord::default()
        }
    }
}

/// Serde adapter writing optional timestamps in the run-log layout.
pub(crate) mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    use crate::classifier::TIMESTAMP_FORMAT;

    pub(crate) fn serialize<S>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.collect_str(&ts.format(TIMESTAMP_FORMAT)),
            None => serializer.serialize_none(),
        }
    }
}

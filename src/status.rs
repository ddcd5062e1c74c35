//! Run status and the rule that derives it from scanned evidence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Final classification of a single pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The log could not be read.
    #[default]
    Unknown,
    /// No error and no success marker yet; the run is incomplete.
    Running,
    /// A success marker was seen and no error.
    Success,
    /// At least one error marker was seen.
    Fail,
}

impl RunStatus {
    /// Lowercase label used in tables and JSON.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Facts accumulated by a completed scan that decide the final status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusEvidence {
    /// Sticky failure hint, set by the first error marker.
    pub failed: bool,
    /// Number of error markers seen.
    pub error_count: usize,
    /// Whether any line carried a success marker.
    pub succeeded: bool,
}

/// Decide the status of a fully scanned log.
///
/// Errors outrank success markers, and a log with neither is still running.
/// Never returns [`RunStatus::Unknown`].
pub fn resolve(evidence: &StatusEvidence) -> RunStatus {
    if evidence.failed || evidence.error_count > 0 {
        RunStatus::Fail
    } else if evidence.succeeded {
        RunStatus::Success
    } else {
        RunStatus::Running
    }
}

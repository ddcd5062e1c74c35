//! Pipeline and log-file discovery under the log root.
//!
//! Layout: `<log_root>/<pipeline>/<name>_<YYYYMMDD_HHMMSS>.log`. Both listings
//! swallow filesystem errors and return whatever they could read, so one bad
//! directory never hides the others.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Extension (without the dot) of run-log files.
pub const LOG_EXTENSION: &str = "log";

/// A pipeline directory found under the log root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDir {
    /// Directory basename.
    pub name: String,
    /// Full path of the directory.
    pub path: PathBuf,
}

/// List the pipeline directories directly under `root`, sorted by name.
///
/// Returns an empty list if `root` is missing or unreadable.
pub fn list_pipelines(root: &Path) -> Vec<PipelineDir> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "cannot list log root");
            return Vec::new();
        }
    };

    let mut pipelines: Vec<PipelineDir> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = utf8_name(&entry)?;
            Some(PipelineDir {
                name,
                path: entry.path(),
            })
        })
        .collect();

    pipelines.sort_by(|a, b| a.name.cmp(&b.name));
    pipelines
}

/// List `.log` files in `dir`, newest first.
///
/// Ordering is reverse lexicographic on the file name, which is newest first
/// for names that embed a sortable timestamp. Returns an empty list on error.
pub fn list_log_files(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list pipeline directory");
            return Vec::new();
        }
    };

    let mut files: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| utf8_name(&entry))
        .filter(|name| is_log_file_name(name))
        .collect();

    files.sort_by(|a, b| b.cmp(a));
    files
}

fn utf8_name(entry: &fs::DirEntry) -> Option<String> {
    let name = entry.file_name().into_string();
    if let Err(raw) = &name {
        debug!(path = %entry.path().display(), name = ?raw, "skipping non-UTF-8 name");
    }
    name.ok()
}

fn is_log_file_name(name: &str) -> bool {
    Path::new(name).extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION)
}

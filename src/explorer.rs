//! Detail view of a single run log: parsed metadata plus a tail preview.

use std::path::Path;

use tracing::warn;

use crate::parser::{self, LogReadError, ParsedLogRecord};

/// Everything the detail view shows for one log file.
#[derive(Debug)]
pub struct LogDetails {
    /// Name of the inspected file.
    pub file_name: String,
    /// Parsed record (`unknown` status if the file could not be read).
    pub record: ParsedLogRecord,
    /// Last lines of the file, or why they could not be read.
    pub preview: Result<String, LogReadError>,
}

/// Parse `dir/file_name` and capture its last `tail` lines.
///
/// The file is read once; record and preview always describe the same bytes.
pub fn explore(dir: &Path, file_name: &str, tail: usize) -> LogDetails {
    let path = dir.join(file_name);

    let (record, preview) = match parser::read_log_text(&path) {
        Ok(text) => (parser::parse_text(&text), Ok(tail_lines(&text, tail))),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable log file, status unknown");
            (ParsedLogRecord::default(), Err(e))
        }
    };

    LogDetails {
        file_name: file_name.to_owned(),
        record,
        preview,
    }
}

/// Return the last `n` lines of `text`, terminators kept.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let start = lines.len().saturating_sub(n);
    lines.get(start..).map(|tail| tail.concat()).unwrap_or_default()
}

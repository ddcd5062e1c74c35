//! Line-level pattern matchers for pipeline run logs.
//!
//! Each matcher looks at a single line and reports one fact about it. They
//! hold no state and never fail: a line that does not carry the fact is a
//! plain `None`/`false`, whatever else it contains.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// `strftime` layout of the timestamp that prefixes run-log lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker preceding the unit name on the line that opens a run.
pub const UNIT_START_MARKER: &str = "INFO Starting";

/// Marker preceding the rolling-window descriptor.
pub const ROLLING_WINDOW_MARKER: &str = "Rolling Window:";

/// Substring identifying an error line.
pub const ERROR_MARKER: &str = "ERROR";

/// Substrings identifying a successful load.
pub const SUCCESS_MARKERS: [&str; 2] = ["Inserted", "All records inserted"];

static UNIT_START: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"INFO Starting\s+(\w+)").ok());

static LEADING_TIMESTAMP: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2})").ok()
});

/// Return the unit name from an `INFO Starting <unit>` line.
pub fn match_unit_start(line: &str) -> Option<&str> {
    if !line.contains(UNIT_START_MARKER) {
        return None;
    }
    let regex = UNIT_START.as_ref()?;
    regex
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Return the timestamp at column 0 of the line.
///
/// Digits that look like a timestamp but do not name a real calendar time
/// (month 13, 25 o'clock, ...) are not a match.
pub fn match_leading_timestamp(line: &str) -> Option<NaiveDateTime> {
    let regex = LEADING_TIMESTAMP.as_ref()?;
    let raw = regex.captures(line)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

/// Return the trimmed text after the last `Rolling Window:` marker.
pub fn match_rolling_window(line: &str) -> Option<&str> {
    line.rsplit_once(ROLLING_WINDOW_MARKER)
        .map(|(_, descriptor)| descriptor.trim())
}

/// Whether the line carries the error marker anywhere.
pub fn match_error(line: &str) -> bool {
    line.contains(ERROR_MARKER)
}

/// Whether the line carries one of the success markers anywhere.
pub fn match_success(line: &str) -> bool {
    SUCCESS_MARKERS.iter().any(|marker| line.contains(marker))
}

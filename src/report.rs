//! Plain-text rendering of summaries and log details.

use std::fmt::Write as _;

use crate::classifier::TIMESTAMP_FORMAT;
use crate::explorer::LogDetails;
use crate::summary::PipelineSummaryRow;

const SUMMARY_HEADERS: [&str; 6] = [
    "#",
    "Pipeline",
    "Status",
    "Last Run",
    "Completed In (min)",
    "Rolling Window",
];

/// Render the pipeline overview as an aligned, 1-indexed table.
pub fn render_summary(rows: &[PipelineSummaryRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            [
                index.saturating_add(1).to_string(),
                row.pipeline_name.clone(),
                row.status.to_string(),
                row.last_run_display(),
                row.completed_in_display(),
                row.rolling_window_display().to_owned(),
            ]
        })
        .collect();

    let mut widths = SUMMARY_HEADERS.map(display_width);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut out = String::new();
    push_row(&mut out, &SUMMARY_HEADERS.map(str::to_owned), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(display_width(cell));
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Terminal columns taken by `cell`. Status indicators render double width.
fn display_width(cell: &str) -> usize {
    cell.chars()
        .map(|c| match c {
            '\u{26AA}'..='\u{26AB}' | '\u{1F300}'..='\u{1FAFF}' => 2,
            _ => 1,
        })
        .fold(0, usize::saturating_add)
}

fn or_none<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_owned(), |v| v.to_string())
}

/// Render the detail view of one log: metadata, tracebacks, preview.
pub fn render_details(details: &LogDetails) -> String {
    let record = &details.record;
    let mut out = String::new();

    let _ = writeln!(out, "Log: {}", details.file_name);
    let _ = writeln!(out);
    let _ = writeln!(out, "ETL:            {}", or_none(record.unit_name.as_deref()));
    let _ = writeln!(
        out,
        "Start Time:     {}",
        or_none(record.start_time.map(|ts| ts.format(TIMESTAMP_FORMAT)))
    );
    let _ = writeln!(
        out,
        "Rolling Window: {}",
        or_none(record.rolling_window.as_deref())
    );
    let _ = writeln!(out, "Status:         {}", record.status);
    let _ = writeln!(out, "Error Count:    {}", record.error_count);

    if !record.tracebacks.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Tracebacks:");
        for (index, traceback) in record.tracebacks.iter().enumerate() {
            let _ = writeln!(out, "--- #{} ---", index.saturating_add(1));
            out.push_str(traceback);
            if !traceback.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    let _ = writeln!(out);
    match &details.preview {
        Ok(preview) => {
            let _ = writeln!(out, "Log Preview:");
            out.push_str(preview);
            if !preview.is_empty() && !preview.ends_with('\n') {
                out.push('\n');
            }
        }
        Err(e) => {
            let _ = writeln!(out, "Failed to read log: {e}");
        }
    }

    out
}

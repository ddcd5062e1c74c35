//! Pipewatch — run-status monitor for batch data-pipeline logs.
//!
//! Reads the human-readable logs that pipeline runs leave under a log root
//! (one directory per pipeline, one file per run), classifies each run as
//! success, failure, or still running, and reduces the newest run of every
//! pipeline into a summary table.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod parser;
pub mod status;

pub mod discovery;
pub mod explorer;
pub mod summary;

pub mod bootstrap;
pub mod config;
pub mod logging;
pub mod report;

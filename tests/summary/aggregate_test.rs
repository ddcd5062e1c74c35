//! Tests for building the pipeline overview.

use std::path::Path;

use chrono::{DateTime, Local};
use filetime::FileTime;

use pipewatch::status::RunStatus;
use pipewatch::summary::{
    aggregate, aggregate_concurrent, collect_pipelines, PipelineLogs, SummaryStatus, NOT_AVAILABLE,
};

const MTIME_SECS: i64 = 1_704_103_500;

fn write_log(dir: &Path, name: &str, contents: &str) {
    std::fs::create_dir_all(dir).expect("create pipeline dir");
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write log");
    filetime::set_file_mtime(&path, FileTime::from_unix_time(MTIME_SECS, 0)).expect("set mtime");
}

fn expected_last_run() -> chrono::NaiveDateTime {
    DateTime::from_timestamp(MTIME_SECS, 0)
        .expect("valid timestamp")
        .with_timezone(&Local)
        .naive_local()
}

#[test]
fn empty_log_list_yields_no_logs_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rows = aggregate(&[PipelineLogs {
        name: "idle".to_owned(),
        dir: dir.path().join("idle"),
        log_files: Vec::new(),
    }]);

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.pipeline_name, "idle");
    assert_eq!(row.status, SummaryStatus::NoLogs);
    assert_eq!(row.last_run_display(), NOT_AVAILABLE);
    assert_eq!(row.completed_in_display(), NOT_AVAILABLE);
    assert_eq!(row.rolling_window_display(), NOT_AVAILABLE);
}

#[test]
fn newest_listed_file_is_summarized() {
    let dir = tempfile::tempdir().expect("tempdir");
    let orders = dir.path().join("orders");
    write_log(
        &orders,
        "orders_20240102_100000.log",
        "2024-01-02 10:00:00 INFO Starting etl_orders\n\
         2024-01-02 10:00:05 Rolling Window: 7 days\n\
         2024-01-02 10:05:00 INFO All records inserted\n",
    );
    write_log(
        &orders,
        "orders_20240101_100000.log",
        "2024-01-01 10:00:00 ERROR old failure\n",
    );

    let rows = aggregate(&[PipelineLogs {
        name: "orders".to_owned(),
        dir: orders,
        log_files: vec![
            "orders_20240102_100000.log".to_owned(),
            "orders_20240101_100000.log".to_owned(),
        ],
    }]);

    let row = &rows[0];
    assert_eq!(row.status, SummaryStatus::Run(RunStatus::Success));
    assert_eq!(row.last_run, Some(expected_last_run()));
    assert_eq!(row.completed_in_minutes, Some(5.0));
    assert_eq!(row.completed_in_display(), "5.0");
    assert_eq!(row.rolling_window_display(), "7 days");
}

#[test]
fn missing_timestamps_and_window_show_sentinels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loads = dir.path().join("loads");
    write_log(&loads, "loads_1.log", "INFO Starting load\nRolling Window:\n");

    let rows = aggregate(&[PipelineLogs {
        name: "loads".to_owned(),
        dir: loads,
        log_files: vec!["loads_1.log".to_owned()],
    }]);

    let row = &rows[0];
    assert_eq!(row.status, SummaryStatus::Run(RunStatus::Running));
    assert_eq!(row.completed_in_display(), NOT_AVAILABLE);
    assert_eq!(row.rolling_window_display(), NOT_AVAILABLE);
    assert!(row.last_run.is_some());
}

#[test]
fn unreadable_newest_log_only_affects_its_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let broken = dir.path().join("broken");
    std::fs::create_dir_all(&broken).expect("create dir");
    let healthy = dir.path().join("healthy");
    write_log(&healthy, "healthy_1.log", "ERROR boom\n");

    let rows = aggregate(&[
        PipelineLogs {
            name: "broken".to_owned(),
            dir: broken,
            log_files: vec!["gone.log".to_owned()],
        },
        PipelineLogs {
            name: "healthy".to_owned(),
            dir: healthy,
            log_files: vec!["healthy_1.log".to_owned()],
        },
    ]);

    assert_eq!(rows[0].status, SummaryStatus::Run(RunStatus::Unknown));
    assert_eq!(rows[0].last_run_display(), NOT_AVAILABLE);
    assert_eq!(rows[1].status, SummaryStatus::Run(RunStatus::Fail));
}

#[test]
fn collect_pipelines_reads_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_log(&dir.path().join("b_pipeline"), "b_20240101_000000.log", "");
    write_log(&dir.path().join("b_pipeline"), "b_20240301_000000.log", "");
    std::fs::create_dir_all(dir.path().join("a_pipeline")).expect("create dir");

    let pipelines = collect_pipelines(dir.path());
    let names: Vec<&str> = pipelines.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a_pipeline", "b_pipeline"]);
    assert!(pipelines[0].log_files.is_empty());
    assert_eq!(
        pipelines[1].log_files,
        vec![
            "b_20240301_000000.log".to_owned(),
            "b_20240101_000000.log".to_owned()
        ]
    );
}

#[tokio::test]
async fn concurrent_aggregation_matches_sequential() {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, body) in [
        ("alpha", "2024-01-01 10:00:00 INFO Inserted 1 rows\n"),
        ("beta", "2024-01-01 10:00:00 ERROR boom\n"),
        ("gamma", "2024-01-01 10:00:00 INFO Starting gamma\n"),
    ] {
        write_log(&dir.path().join(name), &format!("{name}_1.log"), body);
    }
    std::fs::create_dir_all(dir.path().join("delta")).expect("create dir");

    let pipelines = collect_pipelines(dir.path());
    let sequential = aggregate(&pipelines);
    let concurrent = aggregate_concurrent(pipelines).await;

    assert_eq!(sequential, concurrent);
    let statuses: Vec<&str> = concurrent.iter().map(|row| row.status.label()).collect();
    assert_eq!(statuses, vec!["success", "fail", "running", "No Logs"]);
}

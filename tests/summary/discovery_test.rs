//! Tests for pipeline and log-file discovery.

use pipewatch::discovery::{list_log_files, list_pipelines};

#[test]
fn missing_root_lists_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(list_pipelines(&dir.path().join("nope")).is_empty());
    assert!(list_log_files(&dir.path().join("nope")).is_empty());
}

#[test]
fn pipelines_are_directories_sorted_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["milestone", "ayapay", "mbx"] {
        std::fs::create_dir_all(dir.path().join(name)).expect("create dir");
    }
    std::fs::write(dir.path().join("stray.log"), "").expect("write file");

    let pipelines = list_pipelines(dir.path());
    let names: Vec<&str> = pipelines.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ayapay", "mbx", "milestone"]);
    assert_eq!(pipelines[0].path, dir.path().join("ayapay"));
}

#[test]
fn root_that_is_a_file_lists_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("not_a_dir");
    std::fs::write(&file, "x").expect("write file");
    assert!(list_pipelines(&file).is_empty());
    assert!(list_log_files(&file).is_empty());
}

#[test]
fn log_files_newest_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in [
        "orders_20240101_100000.log",
        "orders_20240315_080000.log",
        "orders_20231231_235959.log",
        "notes.txt",
        "orders.log.1",
    ] {
        std::fs::write(dir.path().join(name), "").expect("write file");
    }
    std::fs::create_dir_all(dir.path().join("archive.log")).expect("create dir");

    assert_eq!(
        list_log_files(dir.path()),
        vec![
            "orders_20240315_080000.log".to_owned(),
            "orders_20240101_100000.log".to_owned(),
            "orders_20231231_235959.log".to_owned(),
        ]
    );
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_names_are_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("orders")).expect("create dir");
    std::fs::create_dir_all(dir.path().join(OsStr::from_bytes(b"bad\xffdir"))).expect("create dir");
    let orders = dir.path().join("orders");
    std::fs::write(orders.join("orders_20240101_100000.log"), "").expect("write file");
    std::fs::write(orders.join(OsStr::from_bytes(b"bad\xff.log")), "").expect("write file");

    let names: Vec<String> = list_pipelines(dir.path()).into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["orders".to_owned()]);
    assert_eq!(
        list_log_files(&orders),
        vec!["orders_20240101_100000.log".to_owned()]
    );
}

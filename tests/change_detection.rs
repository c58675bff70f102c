// tests/change_detection.rs

mod common;
use crate::common::write_file;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;

use sitepipe::copy::{is_stale, ChangeRecord, SourceFile};
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::fs::RealFileSystem;

type TestResult = Result<(), Box<dyn Error>>;

fn source(root: &Path, rel: &str) -> SourceFile {
    SourceFile {
        path: root.join("src").join(rel),
        rel: PathBuf::from(rel),
    }
}

fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn staleness_truth_table_on_real_files() -> TestResult {
    let tmp = TempDir::new()?;
    let root = tmp.path();
    let dist = root.join("dist");
    let fs = RealFileSystem;

    write_file(root, "src/missing.js", "a");
    write_file(root, "src/newer.js", "b");
    write_file(root, "dist/newer.js", "old b");
    write_file(root, "src/equal.js", "c");
    write_file(root, "dist/equal.js", "c");
    write_file(root, "src/older.js", "d");
    write_file(root, "dist/older.js", "d");

    set_mtime(&root.join("src/newer.js"), 2_000);
    set_mtime(&root.join("dist/newer.js"), 1_000);
    set_mtime(&root.join("src/equal.js"), 1_500);
    set_mtime(&root.join("dist/equal.js"), 1_500);
    set_mtime(&root.join("src/older.js"), 1_000);
    set_mtime(&root.join("dist/older.js"), 2_000);

    assert!(is_stale(&fs, &source(root, "missing.js"), &dist)?);
    assert!(is_stale(&fs, &source(root, "newer.js"), &dist)?);
    assert!(!is_stale(&fs, &source(root, "equal.js"), &dist)?);
    assert!(!is_stale(&fs, &source(root, "older.js"), &dist)?);
    Ok(())
}

#[test]
fn record_is_read_fresh_each_time() -> TestResult {
    let tmp = TempDir::new()?;
    let root = tmp.path();
    let dist = root.join("dist");
    let fs = RealFileSystem;

    write_file(root, "src/app.js", "v1");
    write_file(root, "dist/app.js", "v1");
    set_mtime(&root.join("src/app.js"), 1_000);
    set_mtime(&root.join("dist/app.js"), 1_000);

    let file = source(root, "app.js");
    let record = ChangeRecord::read(&fs, &file, &dist)?;
    assert_eq!(record.destination, dist.join("app.js"));
    assert_eq!(record.source_modified, UNIX_EPOCH + Duration::from_secs(1_000));
    assert!(!record.is_stale(&fs)?);

    // An edit after the last build is picked up by the next read.
    set_mtime(&root.join("src/app.js"), 3_000);
    assert!(ChangeRecord::read(&fs, &file, &dist)?.is_stale(&fs)?);
    Ok(())
}

#[test]
fn copying_makes_a_file_fresh_until_the_source_changes_again() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("src/js/app.js", "v1");
    let file = SourceFile {
        path: PathBuf::from("src/js/app.js"),
        rel: PathBuf::from("app.js"),
    };
    let dest = Path::new("dist/js");

    assert!(is_stale(&fs, &file, dest)?);

    fs.add_file("dist/js/app.js", "v1");
    assert!(!is_stale(&fs, &file, dest)?);

    fs.add_file("src/js/app.js", "v2");
    assert!(is_stale(&fs, &file, dest)?);
    Ok(())
}

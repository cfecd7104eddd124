//! Integration tests for the fingerprint scanner.

use std::fs;

use raze_scan::{FileId, FingerprintScanner, ScanConfig, ScanError};
use tempfile::TempDir;

#[test]
fn test_identical_content_shares_hash() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "same bytes").unwrap();
    fs::write(temp.path().join("b.txt"), "same bytes").unwrap();
    fs::write(temp.path().join("c.txt"), "other bytes").unwrap();

    let inventory = FingerprintScanner::new()
        .scan(&ScanConfig::new(temp.path()))
        .unwrap();
    let hashes: Vec<_> = inventory.records.iter().map(|r| r.content_hash).collect();

    assert_eq!(hashes.len(), 3);
    assert_eq!(hashes[0], hashes[1]);
    assert_ne!(hashes[0], hashes[2]);
}

#[test]
fn test_ids_are_stable_across_scans() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("report.md"), "# title").unwrap();

    let scanner = FingerprintScanner::new();
    let first = scanner.scan(&ScanConfig::new(temp.path())).unwrap();
    let second = scanner.scan(&ScanConfig::new(temp.path())).unwrap();

    assert_eq!(first.records[0].id, second.records[0].id);
    assert_eq!(
        first.records[0].id,
        FileId::from_path(&first.records[0].path)
    );
}

#[test]
fn test_hidden_files_skipped_when_configured() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".secret"), "x").unwrap();
    fs::write(temp.path().join("visible.txt"), "y").unwrap();

    let config = ScanConfig::builder()
        .root(temp.path())
        .include_hidden(false)
        .build()
        .unwrap();
    let inventory = FingerprintScanner::new().scan(&config).unwrap();

    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.records[0].file_name(), "visible.txt");
}

#[cfg(unix)]
#[test]
fn test_symlinks_excluded() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("real.txt"), "data").unwrap();
    std::os::unix::fs::symlink(temp.path().join("real.txt"), temp.path().join("link.txt"))
        .unwrap();

    let inventory = FingerprintScanner::new()
        .scan(&ScanConfig::new(temp.path()))
        .unwrap();

    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.records[0].file_name(), "real.txt");
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let result = FingerprintScanner::new().scan(&ScanConfig::new(temp.path().join("nope")));
    assert!(matches!(result, Err(ScanError::NotFound { .. })));
}

#[test]
fn test_file_root_is_not_a_directory() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let result = FingerprintScanner::new().scan(&ScanConfig::new(&file));
    assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
}

#[test]
fn test_progress_reports_final_snapshot() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("one.txt"), "1").unwrap();
    fs::write(temp.path().join("two.txt"), "2").unwrap();

    let scanner = FingerprintScanner::new();
    let mut rx = scanner.subscribe();
    scanner.scan(&ScanConfig::new(temp.path())).unwrap();

    let mut last = None;
    while let Ok(progress) = rx.try_recv() {
        last = Some(progress);
    }
    let last = last.unwrap();
    assert_eq!(last.files_scanned, 2);
    assert_eq!(last.files_total, 2);
}

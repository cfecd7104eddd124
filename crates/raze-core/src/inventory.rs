//! Scanned inventory container and statistics.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::record::{FileId, FileRecord};

/// Summary statistics for a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryStats {
    /// Total size in bytes.
    pub total_size: u64,
    /// Total number of files recorded.
    pub total_files: u64,
    /// Total number of directories walked.
    pub total_dirs: u64,
    /// Files that received a content hash.
    pub hashed_files: u64,
    /// Files skipped because of per-file errors.
    pub skipped_files: u64,
    /// Largest file (path, size).
    pub largest_file: Option<(PathBuf, u64)>,
}

impl InventoryStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a recorded file.
    pub fn record_file(&mut self, record: &FileRecord) {
        self.total_files += 1;
        self.total_size += record.size;
        if record.content_hash.is_some() {
            self.hashed_files += 1;
        }
        if self.largest_file.as_ref().is_none_or(|(_, s)| record.size > *s) {
            self.largest_file = Some((record.path.clone(), record.size));
        }
    }

    /// Record a directory.
    pub fn record_dir(&mut self) {
        self.total_dirs += 1;
    }

    /// Record a file that could not be fingerprinted.
    pub fn record_skip(&mut self) {
        self.skipped_files += 1;
    }
}

/// Complete set of file records for one scan, sorted by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// Canonical root path that was scanned.
    pub root: PathBuf,

    /// One record per regular file, sorted by path.
    pub records: Vec<FileRecord>,

    /// When this scan was performed.
    pub scanned_at: SystemTime,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// Summary statistics.
    pub stats: InventoryStats,

    /// Warnings encountered during scan.
    pub warnings: Vec<ScanWarning>,
}

impl Inventory {
    /// Create a new inventory; records are sorted by path.
    pub fn new(
        root: PathBuf,
        mut records: Vec<FileRecord>,
        config: ScanConfig,
        stats: InventoryStats,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            root,
            records,
            scanned_at: SystemTime::now(),
            scan_duration,
            config,
            stats,
            warnings,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no files were recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total size of all recorded files.
    pub fn total_size(&self) -> u64 {
        self.stats.total_size
    }

    /// Build an id lookup table over the records.
    pub fn index(&self) -> HashMap<&FileId, &FileRecord> {
        self.records.iter().map(|r| (&r.id, r)).collect()
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord {
            id: FileId::from_path(path.as_ref()),
            path: PathBuf::from(path),
            size,
            mtime: 0.0,
            mime_type: "text/plain".to_string(),
            content_hash: None,
        }
    }

    #[test]
    fn test_stats_record_file() {
        let mut stats = InventoryStats::new();
        stats.record_file(&record("/a.txt", 1024));
        stats.record_file(&record("/b.txt", 10));

        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 1034);
        assert_eq!(stats.hashed_files, 0);
        assert_eq!(stats.largest_file, Some((PathBuf::from("/a.txt"), 1024)));
    }

    #[test]
    fn test_inventory_sorts_records() {
        let inventory = Inventory::new(
            PathBuf::from("/"),
            vec![record("/z.txt", 1), record("/a.txt", 2), record("/m/b.txt", 3)],
            ScanConfig::new("/"),
            InventoryStats::default(),
            Duration::ZERO,
            Vec::new(),
        );

        let paths: Vec<_> = inventory.records.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/a.txt"),
                PathBuf::from("/m/b.txt"),
                PathBuf::from("/z.txt")
            ]
        );
        assert_eq!(inventory.index().len(), 3);
    }
}

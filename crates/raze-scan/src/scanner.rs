//! JWalk-based parallel fingerprint scanner.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, UNIX_EPOCH};

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use raze_core::{
    ContentHash, FileId, FileRecord, Inventory, InventoryStats, ScanConfig, ScanError,
    ScanWarning, WarningKind,
};

use crate::progress::ScanProgress;

/// Number of fingerprinted files between progress snapshots.
const PROGRESS_INTERVAL: u64 = 1000;

/// Parallel scanner producing an [`Inventory`] of fingerprinted files.
pub struct FingerprintScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl FingerprintScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the configured root.
    ///
    /// Only a missing or non-directory root is fatal; everything else is
    /// reported through [`Inventory::warnings`].
    pub fn scan(&self, config: &ScanConfig) -> Result<Inventory, ScanError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let mut stats = InventoryStats::new();
        let mut warnings = Vec::new();

        let paths = self.collect_files(config, &root_path, &mut stats, &mut warnings)?;
        debug!(root = %root_path.display(), files = paths.len(), "walk complete");

        let results = if config.threads == 0 {
            self.fingerprint_all(&paths, config.max_hash_size, start)
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| ScanError::InvalidConfig {
                    message: format!("failed to build thread pool: {e}"),
                })?;
            pool.install(|| self.fingerprint_all(&paths, config.max_hash_size, start))
        };

        let mut records = Vec::with_capacity(results.len());
        for (record, warning) in results {
            if let Some(warning) = warning {
                warnings.push(warning);
            }
            match record {
                Some(record) => {
                    stats.record_file(&record);
                    records.push(record);
                }
                None => stats.record_skip(),
            }
        }

        let scan_duration = start.elapsed();
        let _ = self.progress_tx.send(ScanProgress {
            files_scanned: stats.total_files,
            files_total: paths.len() as u64,
            bytes_scanned: stats.total_size,
            current_path: root_path.clone(),
            errors_count: warnings.len() as u64,
            elapsed: scan_duration,
        });

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "scan finished with warnings");
        }

        Ok(Inventory::new(
            root_path,
            records,
            config.clone(),
            stats,
            scan_duration,
            warnings,
        ))
    }

    /// Walk the tree and collect regular file paths.
    fn collect_files(
        &self,
        config: &ScanConfig,
        root_path: &Path,
        stats: &mut InventoryStats,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<PathBuf>, ScanError> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let ignore = config.ignore_matcher().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(false)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                if ignore.is_empty() {
                    return;
                }
                children.retain(|entry| match entry {
                    Ok(entry) => !ignore.is_match(entry.file_name()),
                    Err(_) => true,
                });
            });

        let mut paths = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    debug!(path = %path.display(), error = %err, "walk error");
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            if entry.depth == 0 {
                continue;
            }

            // Symlinks and special files are not part of the inventory.
            let file_type = entry.file_type();
            if file_type.is_dir() {
                stats.record_dir();
            } else if file_type.is_file() {
                paths.push(entry.path());
            }
        }

        Ok(paths)
    }

    /// Fingerprint every path on the current rayon pool.
    fn fingerprint_all(
        &self,
        paths: &[PathBuf],
        max_hash_size: u64,
        start: Instant,
    ) -> Vec<(Option<FileRecord>, Option<ScanWarning>)> {
        let done = AtomicU64::new(0);
        let bytes = AtomicU64::new(0);
        let total = paths.len() as u64;

        paths
            .par_iter()
            .map(|path| {
                let result = fingerprint_file(path, max_hash_size);

                if let Some(record) = &result.0 {
                    bytes.fetch_add(record.size, Ordering::Relaxed);
                }
                let count = done.fetch_add(1, Ordering::Relaxed) + 1;
                if count % PROGRESS_INTERVAL == 0 {
                    let _ = self.progress_tx.send(ScanProgress {
                        files_scanned: count,
                        files_total: total,
                        bytes_scanned: bytes.load(Ordering::Relaxed),
                        current_path: path.clone(),
                        errors_count: 0,
                        elapsed: start.elapsed(),
                    });
                }

                result
            })
            .collect()
    }
}

impl Default for FingerprintScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint a single file.
///
/// A metadata failure drops the file; a hashing failure keeps the record
/// without a content hash. Either way the problem is returned as a warning.
pub fn fingerprint_file(
    path: &Path,
    max_hash_size: u64,
) -> (Option<FileRecord>, Option<ScanWarning>) {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "skipping file");
            return (
                None,
                Some(ScanWarning::from_io(path, &err, WarningKind::MetadataError)),
            );
        }
    };

    let size = metadata.len();
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let mut warning = None;
    let content_hash = if size <= max_hash_size {
        match hash_file(path) {
            Ok(hash) => Some(hash),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "hash failed");
                warning = Some(ScanWarning::from_io(path, &err, WarningKind::HashError));
                None
            }
        }
    } else {
        None
    };

    let record = FileRecord {
        id: FileId::from_path(path),
        path: path.to_path_buf(),
        size,
        mtime,
        mime_type,
        content_hash,
    };

    (Some(record), warning)
}

/// Compute the full BLAKE3 hash of a file.
fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());

        let scanner = FingerprintScanner::new();
        let inventory = scanner.scan(&config).unwrap();

        assert_eq!(inventory.len(), 4);
        assert_eq!(inventory.stats.total_dirs, 3);
        assert_eq!(inventory.stats.hashed_files, 4);
        assert!(inventory.total_size() > 0);
        assert!(!inventory.has_warnings());
    }

    #[test]
    fn test_records_sorted_by_path() {
        let temp = create_test_tree();
        let inventory = FingerprintScanner::new()
            .scan(&ScanConfig::new(temp.path()))
            .unwrap();

        for pair in inventory.records.windows(2) {
            assert!(pair[0].path < pair[1].path);
        }
    }

    #[test]
    fn test_ignore_patterns() {
        let temp = create_test_tree();
        let config = ScanConfig::builder()
            .root(temp.path())
            .ignore_patterns(vec!["dir2".to_string()])
            .build()
            .unwrap();

        let inventory = FingerprintScanner::new().scan(&config).unwrap();

        assert_eq!(inventory.len(), 3);
        assert!(
            !inventory
                .records
                .iter()
                .any(|r| r.path.components().any(|c| c.as_os_str() == "dir2"))
        );
    }

    #[test]
    fn test_fingerprint_file_respects_hash_cap() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "0123456789").unwrap();

        let (record, warning) = fingerprint_file(&path, 10);
        let record = record.unwrap();
        assert!(warning.is_none());
        assert!(record.content_hash.is_some());
        assert_eq!(record.mime_type, "text/plain");
        assert_eq!(record.size, 10);

        let (record, _) = fingerprint_file(&path, 9);
        assert!(record.unwrap().content_hash.is_none());
    }

    #[test]
    fn test_fingerprint_missing_file_warns() {
        let temp = TempDir::new().unwrap();
        let (record, warning) = fingerprint_file(&temp.path().join("gone.bin"), 100);
        assert!(record.is_none());
        assert_eq!(warning.unwrap().kind, WarningKind::MetadataError);
    }
}

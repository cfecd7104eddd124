//! Fingerprinting scanner for raze.
//!
//! This crate walks a directory tree in parallel and produces one
//! [`FileRecord`] per regular file.
//!
//! # Overview
//!
//! - **Parallel traversal** via jwalk on the rayon pool
//! - **Parallel fingerprinting** (stat, mime guess, BLAKE3) via rayon
//! - **Progress updates** via broadcast channels
//! - **Per-file errors** become warnings and never abort the scan
//!
//! # Example
//!
//! ```rust,no_run
//! use raze_scan::{FingerprintScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let scanner = FingerprintScanner::new();
//! let inventory = scanner.scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", inventory.total_size());
//! println!("Total files: {}", inventory.len());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use raze_scan::FingerprintScanner;
//!
//! let scanner = FingerprintScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("Fingerprinted {} files", progress.files_scanned);
//!     }
//! });
//! ```

mod progress;
mod scanner;

pub use progress::ScanProgress;
pub use scanner::{FingerprintScanner, fingerprint_file};

// Re-export core types for convenience
pub use raze_core::{
    ContentHash, FileId, FileRecord, Inventory, InventoryStats, ScanConfig, ScanError,
    ScanWarning, WarningKind,
};

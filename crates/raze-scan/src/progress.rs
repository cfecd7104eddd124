//! Scan progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Number of files fingerprinted so far.
    pub files_scanned: u64,
    /// Number of files discovered by the walk.
    pub files_total: u64,
    /// Total bytes fingerprinted so far.
    pub bytes_scanned: u64,
    /// Most recently fingerprinted path.
    pub current_path: PathBuf,
    /// Number of warnings encountered.
    pub errors_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fraction of discovered files already fingerprinted.
    pub fn fraction_done(&self) -> f64 {
        if self.files_total == 0 {
            1.0
        } else {
            self.files_scanned as f64 / self.files_total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let progress = ScanProgress {
            files_scanned: 50,
            files_total: 200,
            elapsed: Duration::from_secs(5),
            ..Default::default()
        };
        assert_eq!(progress.files_per_second(), 10.0);
        assert_eq!(progress.fraction_done(), 0.25);
        assert_eq!(ScanProgress::default().fraction_done(), 1.0);
    }
}

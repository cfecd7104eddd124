//! Quarantine areas and their retention.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ApplyError, check_root};

/// Folder under the apply root that holds every quarantine run.
pub const QUARANTINE_DIR: &str = ".quarantine";

/// Timestamp format naming each run.
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Prefix of apply audit logs.
pub const AUDIT_PREFIX: &str = ".raze-audit-";

/// Prefix of restore audit logs.
pub const RESTORE_PREFIX: &str = ".raze-restore-";

/// Pick a run stamp for `now` that no earlier run has used.
///
/// The plain timestamp is preferred; on a clash `-1`, `-2`, ... is appended.
/// A stamp is taken if its quarantine folder or its audit log exists.
pub fn unique_stamp(root: &Path, audit_dir: &Path, prefix: &str, now: DateTime<Local>) -> String {
    let base = now.format(STAMP_FORMAT).to_string();
    let taken = |stamp: &str| {
        root.join(QUARANTINE_DIR).join(stamp).exists()
            || audit_dir.join(format!("{prefix}{stamp}.jsonl")).exists()
    };

    if !taken(&base) {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// The quarantine folder for one apply run, created on first use.
#[derive(Debug)]
pub struct QuarantineArea {
    path: PathBuf,
    created: bool,
}

impl QuarantineArea {
    /// Describe `<root>/.quarantine/<stamp>` without touching the disk.
    pub fn new(root: &Path, stamp: &str) -> Self {
        Self {
            path: root.join(QUARANTINE_DIR).join(stamp),
            created: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the folder has been created by this run.
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Create the folder if needed and return it.
    pub fn ensure(&mut self) -> io::Result<&Path> {
        if !self.created {
            fs::create_dir_all(&self.path)?;
            self.created = true;
            debug!(path = %self.path.display(), "created quarantine area");
        }
        Ok(&self.path)
    }
}

/// Parse a run folder name (`YYYYmmdd-HHMMSS` with an optional `-N`).
pub fn parse_stamp(name: &str) -> Option<DateTime<Local>> {
    let (head, tail) = if name.len() > 15 && name.is_char_boundary(15) {
        name.split_at(15)
    } else {
        (name, "")
    };
    if !tail.is_empty() {
        let digits = tail.strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    let naive = NaiveDateTime::parse_from_str(head, STAMP_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// What a purge removed or would remove.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeReport {
    /// Expired run folders (removed unless dry-run).
    pub expired: Vec<PathBuf>,
    /// Run folders still inside the retention window.
    pub kept: usize,
    /// Entries whose names are not run stamps.
    pub ignored: Vec<PathBuf>,
    /// Expired folders that could not be removed.
    pub failed: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Remove quarantine runs older than `retention_days` relative to `now`.
///
/// Entries that are not run folders are left alone.
pub fn purge_expired(
    root: &Path,
    retention_days: u32,
    now: DateTime<Local>,
    dry_run: bool,
) -> Result<PurgeReport, ApplyError> {
    check_root(root)?;
    let mut report = PurgeReport {
        dry_run,
        ..Default::default()
    };

    let area = root.join(QUARANTINE_DIR);
    let entries = match fs::read_dir(&area) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(ApplyError::io(&area, e)),
    };

    let window = TimeDelta::try_days(i64::from(retention_days)).unwrap_or(TimeDelta::MAX);
    let mut runs: Vec<(PathBuf, Option<DateTime<Local>>)> = entries
        .flatten()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| {
            let stamp = parse_stamp(&e.file_name().to_string_lossy());
            (e.path(), stamp)
        })
        .collect();
    runs.sort();

    for (path, stamp) in runs {
        let Some(stamp) = stamp else {
            report.ignored.push(path);
            continue;
        };
        if now.signed_duration_since(stamp) <= window {
            report.kept += 1;
            continue;
        }
        if !dry_run {
            if let Err(e) = fs::remove_dir_all(&path) {
                warn!(path = %path.display(), error = %e, "failed to purge quarantine run");
                report.failed.push(path);
                continue;
            }
            info!(path = %path.display(), "purged quarantine run");
        }
        report.expired.push(path);
    }

    Ok(report)
}

//! Append-only NDJSON audit log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;

/// Kind of operation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOp {
    Move,
    Delete,
    Restore,
    Meta,
}

/// Outcome of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Simulated; nothing changed.
    DryRun,
    /// Moved into its category folder.
    Moved,
    /// Moved into the quarantine area.
    Quarantined,
    /// Moved back to where it came from.
    Restored,
    /// The source no longer exists.
    SkipNotFound,
    /// An I/O error prevented the operation.
    SkipError,
    /// Run metadata.
    Done,
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub op: AuditOp,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarantine: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    /// A record for an operation on `src`.
    pub fn new(op: AuditOp, status: AuditStatus, src: impl Into<PathBuf>) -> Self {
        Self {
            op,
            status,
            src: Some(src.into()),
            dst: None,
            reason: None,
            error: None,
            quarantine: None,
            retention_days: None,
            at: Utc::now(),
        }
    }

    /// The closing record of an apply run.
    pub fn meta(quarantine: impl Into<PathBuf>, retention_days: u32) -> Self {
        Self {
            op: AuditOp::Meta,
            status: AuditStatus::Done,
            src: None,
            dst: None,
            reason: None,
            error: None,
            quarantine: Some(quarantine.into()),
            retention_days: Some(retention_days),
            at: Utc::now(),
        }
    }

    pub fn with_dst(mut self, dst: impl Into<PathBuf>) -> Self {
        self.dst = Some(dst.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Whether this record moved a file that a restore can move back.
    pub fn is_reversible(&self) -> bool {
        matches!(self.status, AuditStatus::Moved | AuditStatus::Quarantined)
            && self.src.is_some()
            && self.dst.is_some()
    }
}

/// Single writer appending records to an audit log.
#[derive(Debug)]
pub struct AuditWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl AuditWriter {
    /// Open `path` for appending, creating it if needed.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ApplyError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ApplyError::audit(&path, e))?;
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Append one record as a JSON line.
    pub fn write(&mut self, record: &AuditRecord) -> Result<(), ApplyError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| ApplyError::audit(&self.path, e.into()))?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .map_err(|e| ApplyError::audit(&self.path, e))?;
        self.written += 1;
        Ok(())
    }

    /// Flush to disk.
    pub fn finish(mut self) -> Result<PathBuf, ApplyError> {
        self.file
            .flush()
            .and_then(|()| self.file.sync_all())
            .map_err(|e| ApplyError::audit(&self.path, e))?;
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Lazy reader over an audit log.
///
/// ```rust,ignore
/// for record in AuditLog::read(".raze-audit-20240101-120000.jsonl")? {
///     println!("{:?}", record?.status);
/// }
/// ```
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl AuditLog {
    /// Open an audit log for reading.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, ApplyError> {
        let path = path.into();
        let file = File::open(&path).map_err(|e| ApplyError::audit(&path, e))?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }
}

impl Iterator for AuditLog {
    type Item = Result<AuditRecord, ApplyError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(ApplyError::audit(&self.path, e))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|source| {
                ApplyError::AuditRecord {
                    path: self.path.clone(),
                    line: self.line,
                    source,
                }
            }));
        }
    }
}

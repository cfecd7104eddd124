//! Error types for plan execution.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use raze_plan::PlanError;

/// Fatal errors while applying, restoring, or purging.
///
/// Per-item failures are not errors; they become audit records.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The root directory does not exist.
    #[error("Root not found: {path}")]
    RootNotFound { path: PathBuf },

    /// The root is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The plan could not be read.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The audit log could not be written or read.
    #[error("Audit log error at {path}: {source}")]
    Audit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line of the audit log is not a valid record.
    #[error("Invalid audit record at {path}:{line}: {source}")]
    AuditRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// I/O failure on a path outside any single plan item.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ApplyError {
    /// Create an audit log error for a path.
    pub fn audit(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Audit {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an I/O error for a path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Fail unless `root` is an existing directory.
pub(crate) fn check_root(root: &Path) -> Result<(), ApplyError> {
    match root.metadata() {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ApplyError::NotADirectory {
            path: root.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ApplyError::RootNotFound {
            path: root.to_path_buf(),
        }),
        Err(e) => Err(ApplyError::io(root, e)),
    }
}

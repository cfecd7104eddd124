//! Error types for plan persistence.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading or writing a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file does not exist.
    #[error("Plan not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O failure on the plan file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The plan file is not a valid plan document.
    #[error("Invalid plan at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The plan could not be encoded.
    #[error("Failed to encode plan: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PlanError {
    /// Create an I/O error for a path, mapping a missing file to `NotFound`.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

//! Error types for the organize pipeline.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use raze_classify::ClassifyError;
use raze_core::ScanError;
use raze_plan::PlanError;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The scan could not start (missing root, not a directory, bad config).
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The classifier could not be set up.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// The plan could not be encoded or written.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A configuration file is not valid TOML for this schema.
    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An output artifact could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An output artifact could not be encoded.
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PipelineError {
    /// Create a write error for a path.
    pub fn write(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

//! Layered configuration loaded from TOML.
//!
//! Every section is optional; missing fields take their defaults.
//!
//! ```toml
//! [scan]
//! max_hash_size = 5000000
//! ignore_patterns = ["node_modules", "*.iso"]
//!
//! [similarity]
//! text_threshold = 8
//!
//! [classifier]
//! endpoint = "http://localhost:11434"
//! model = "llama3"
//!
//! [plan]
//! storage_rate_per_gb = 0.023
//!
//! [apply]
//! retention_days = 30
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use raze_analyze::SimilarityConfig;
use raze_classify::ClassifierConfig;
use raze_core::{DEFAULT_MAX_HASH_SIZE, ScanConfig, ScanError};
use raze_ops::{AUDIT_PREFIX, ApplyOptions, QUARANTINE_DIR, RESTORE_PREFIX};
use raze_plan::PlanOptions;

use crate::error::PipelineError;

/// Environment variable that overrides the classifier API key.
pub const API_KEY_ENV: &str = "RAZE_API_KEY";

/// Scan settings that do not depend on the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub max_hash_size: u64,
    pub max_depth: Option<u32>,
    /// Extra glob patterns to skip, on top of raze's own artifacts.
    pub ignore_patterns: Vec<String>,
    pub threads: usize,
    pub include_hidden: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_hash_size: DEFAULT_MAX_HASH_SIZE,
            max_depth: None,
            ignore_patterns: Vec::new(),
            threads: 0,
            include_hidden: true,
        }
    }
}

impl ScanSettings {
    /// Build a scan config for `root`.
    ///
    /// Quarantine folders and audit logs are always ignored so a run never
    /// plans moves for its own artifacts.
    pub fn to_scan_config(&self, root: &Path) -> Result<ScanConfig, ScanError> {
        let mut patterns = vec![
            QUARANTINE_DIR.to_string(),
            format!("{AUDIT_PREFIX}*.jsonl"),
            format!("{RESTORE_PREFIX}*.jsonl"),
        ];
        patterns.extend(self.ignore_patterns.iter().cloned());

        ScanConfig::builder()
            .root(root)
            .max_hash_size(self.max_hash_size)
            .max_depth(self.max_depth)
            .ignore_patterns(patterns)
            .threads(self.threads)
            .include_hidden(self.include_hidden)
            .build()
            .map_err(|e| ScanError::InvalidConfig {
                message: e.to_string(),
            })
    }
}

/// Everything configurable about a raze run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RazeConfig {
    pub scan: ScanSettings,
    pub similarity: SimilarityConfig,
    pub classifier: ClassifierConfig,
    pub plan: PlanOptions,
    pub apply: ApplyOptions,
}

impl RazeConfig {
    /// Default config file location: `<config dir>/raze/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("raze").join("config.toml"))
    }

    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| PipelineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and defaults otherwise. The API key from
    /// the environment wins over the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PipelineError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) => match Self::from_file(&path) {
                    Ok(config) => config,
                    Err(PipelineError::ConfigRead { source, .. })
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        debug!(path = %path.display(), "no config file, using defaults");
                        Self::default()
                    }
                    Err(e) => return Err(e),
                },
                None => Self::default(),
            },
        };
        config.apply_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Override the classifier key when `key` is set and non-empty.
    pub fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.classifier.api_key = Some(key);
        }
    }
}

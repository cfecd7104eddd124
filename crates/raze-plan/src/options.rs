//! Plan construction options.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Name suffixes treated as temporary files.
pub const DEFAULT_TEMP_SUFFIXES: &[&str] = &[".tmp", ".log", ".bak", ".old", "~"];

/// Options for [`build_plan`](crate::build_plan).
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct PlanOptions {
    /// Storage price per GiB per month. Costs are omitted when not positive.
    #[builder(default)]
    pub storage_rate_per_gb: f64,

    /// Name suffixes that mark a file as temporary, matched case-insensitively.
    #[builder(default = "default_temp_suffixes()")]
    pub temp_suffixes: Vec<String>,

    /// Time spent producing the plan, recorded in the summary.
    #[builder(default)]
    #[serde(skip)]
    pub elapsed: Option<Duration>,
}

impl PlanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(rate) = self.storage_rate_per_gb {
            if !rate.is_finite() {
                return Err("Storage rate must be a finite number".to_string());
            }
        }
        Ok(())
    }
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            storage_rate_per_gb: 0.0,
            temp_suffixes: default_temp_suffixes(),
            elapsed: None,
        }
    }
}

impl PlanOptions {
    /// Create a new options builder.
    pub fn builder() -> PlanOptionsBuilder {
        PlanOptionsBuilder::default()
    }

    /// Whether per-category costs should be computed.
    pub fn has_rate(&self) -> bool {
        self.storage_rate_per_gb > 0.0
    }

    /// Whether a file name ends in a temp suffix, ignoring case.
    pub fn is_temp_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.temp_suffixes
            .iter()
            .any(|suffix| name.ends_with(&suffix.to_lowercase()))
    }
}

fn default_temp_suffixes() -> Vec<String> {
    DEFAULT_TEMP_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

//! Plan document types.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use raze_core::FileId;

use crate::error::PlanError;

/// Why a file is suggested for quarantine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeleteReason {
    /// Byte-identical to the first file of its group.
    ExactDuplicate,
    /// Text simhash within the threshold of the cluster seed.
    NearDuplicateText,
    /// Image pHash within the threshold of the cluster seed.
    NearDuplicateImage,
    /// Name ends in a temporary-file suffix.
    TempSuffix,
}

impl DeleteReason {
    /// Confidence attached to deletes of this kind.
    pub fn confidence(self) -> f64 {
        match self {
            Self::ExactDuplicate => 0.99,
            Self::NearDuplicateText | Self::NearDuplicateImage => 0.70,
            Self::TempSuffix => 0.60,
        }
    }
}

/// Move a file into its category folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    #[serde(alias = "id")]
    pub file_id: FileId,
    #[serde(alias = "from")]
    pub from_path: PathBuf,
    /// Destination folder relative to the apply root, e.g. `Documents/recipes/`.
    #[serde(alias = "to")]
    pub to_folder: String,
    /// `<Bucket>:<Label>` of the category.
    pub reason: String,
}

/// Send a file to quarantine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    #[serde(alias = "id")]
    pub file_id: FileId,
    pub path: PathBuf,
    pub reason: DeleteReason,
    pub confidence: f64,
    /// Index of the near-duplicate cluster, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
}

/// Storage footprint of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub bytes: u64,
    #[serde(alias = "gb")]
    pub gigabytes: f64,
    #[serde(alias = "monthly_cost")]
    pub estimated_monthly_cost: f64,
}

/// Headline numbers for a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSummary {
    pub files_scanned: usize,
    pub duplicate_clusters: usize,
    pub near_duplicate_clusters: usize,
    pub image_similarity_clusters: usize,
    pub suggested_deletions: usize,
    pub suggested_moves: usize,
    pub storage_rate_per_gb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_sec: Option<f64>,
}

/// A reorganization plan: moves, quarantine deletes, and per-category costs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub summary: PlanSummary,
    pub moves: Vec<Move>,
    pub deletes: Vec<Delete>,
    pub cluster_costs: IndexMap<String, CostEntry>,
}

impl Plan {
    /// True when there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.deletes.is_empty()
    }

    /// Total number of operations.
    pub fn len(&self) -> usize {
        self.moves.len() + self.deletes.len()
    }

    /// Parse a plan from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PlanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a plan file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
        Self::from_json(&text).map_err(|source| PlanError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write a plan file, replacing any existing one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlanError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| PlanError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_names() {
        assert_eq!(DeleteReason::NearDuplicateText.to_string(), "near_duplicate_text");
        assert_eq!(
            "temp_suffix".parse::<DeleteReason>().unwrap(),
            DeleteReason::TempSuffix
        );
        assert_eq!(
            serde_json::to_string(&DeleteReason::ExactDuplicate).unwrap(),
            "\"exact_duplicate\""
        );
    }

    #[test]
    fn test_accepts_short_field_names() {
        let plan = Plan::from_json(
            r#"{
                "summary": {"files_scanned": 2},
                "moves": [{"id": "a1", "from": "/d/a.txt", "to": "Documents/notes/", "reason": "Documents:Notes"}],
                "deletes": [{"id": "b2", "path": "/d/b.tmp", "reason": "temp_suffix", "confidence": 0.6}],
                "cluster_costs": {"Documents:Notes": {"bytes": 10, "gb": 0.0, "monthly_cost": 0.0}}
            }"#,
        )
        .unwrap();

        assert_eq!(plan.summary.files_scanned, 2);
        assert_eq!(plan.moves[0].file_id, FileId::from("a1"));
        assert_eq!(plan.moves[0].to_folder, "Documents/notes/");
        assert_eq!(plan.deletes[0].cluster, None);
        assert_eq!(plan.cluster_costs["Documents:Notes"].bytes, 10);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_missing_sections_default() {
        let plan = Plan::from_json("{}").unwrap();
        assert!(plan.is_empty());
        assert!(plan.cluster_costs.is_empty());
    }

    #[test]
    fn test_cluster_omitted_when_absent() {
        let delete = Delete {
            file_id: FileId::from("x"),
            path: PathBuf::from("/x"),
            reason: DeleteReason::ExactDuplicate,
            confidence: 0.99,
            cluster: None,
        };
        let value = serde_json::to_value(&delete).unwrap();
        assert!(value.get("cluster").is_none());
    }
}

//! Classification inputs, outputs, and response validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use raze_core::{Bucket, FileId, FileRecord};

/// Label used for files no discovered category claimed.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Label substituted when a category arrives without one.
pub const DEFAULT_LABEL: &str = "Cluster";

/// Longest label kept, in characters.
pub const MAX_LABEL_CHARS: usize = 80;

/// Confidence used when a category omits it or sends garbage.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Lightweight metadata sent to the classifier for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: FileId,
    pub name: String,
    pub path: String,
    pub ext: String,
    pub mime: String,
    pub size: u64,
    pub snippet: String,
}

impl FileDescriptor {
    /// Describe a record, attaching at most `max_snippet` characters of text.
    pub fn from_record(record: &FileRecord, snippet: Option<&str>, max_snippet: usize) -> Self {
        let snippet = snippet
            .map(|s| s.chars().take(max_snippet).collect())
            .unwrap_or_default();
        Self {
            id: record.id.clone(),
            name: record.file_name(),
            path: record.path.to_string_lossy().into_owned(),
            ext: record.extension(),
            mime: record.mime_type.clone(),
            size: record.size,
            snippet,
        }
    }
}

/// A content-derived category inside one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub bucket: Bucket,
    pub label: String,
    pub file_ids: Vec<FileId>,
    pub rationale: String,
    pub confidence: f64,
}

impl CategoryAssignment {
    /// Key used for costs and summaries: `<Bucket>:<Label>`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.bucket, self.label)
    }
}

/// One category as proposed by the classifier, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedCategory {
    pub label: String,
    pub file_ids: Vec<String>,
    pub rationale: String,
    pub confidence: f64,
}

/// A validated classifier response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    pub categories: Vec<ProposedCategory>,
    pub uncategorized: Vec<String>,
}

impl BatchResponse {
    /// Validate a decoded JSON document.
    ///
    /// Anything that is not an object, and any category that is not an
    /// object, is ignored rather than rejected.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let categories = obj
            .get("categories")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(ProposedCategory::from_value).collect())
            .unwrap_or_default();

        let uncategorized = obj.get("uncategorized").map(id_list).unwrap_or_default();

        Self {
            categories,
            uncategorized,
        }
    }
}

impl ProposedCategory {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let label = obj
            .get("label")
            .and_then(scalar_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());
        let label: String = label.chars().take(MAX_LABEL_CHARS).collect();
        let label = label.trim_end().to_string();

        let rationale = obj
            .get("rationale")
            .and_then(scalar_string)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Some(Self {
            label,
            file_ids: obj.get("file_ids").map(id_list).unwrap_or_default(),
            rationale,
            confidence: normalize_confidence(obj.get("confidence")),
        })
    }
}

/// Clamp a confidence into `[0, 1]`; missing or non-numeric values become 0.5.
pub fn normalize_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Strings and numbers become strings; everything else is dropped.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn id_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(scalar_string).collect())
        .unwrap_or_default()
}

//! Everything learned about an inventory before planning.

use std::collections::HashMap;

use indexmap::IndexMap;

use raze_analyze::Detections;
use raze_classify::CategoryAssignment;
use raze_core::FileId;

/// Detector output, projections, and categories for one scan.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub detections: Detections,
    /// File ids by top-level mime type.
    pub types: IndexMap<String, Vec<FileId>>,
    /// File ids by age bucket.
    pub ages: IndexMap<String, Vec<FileId>>,
    pub assignments: Vec<CategoryAssignment>,
    /// Truncated text excerpts of text-like files.
    pub excerpts: HashMap<FileId, String>,
}

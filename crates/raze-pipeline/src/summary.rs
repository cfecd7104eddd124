//! Short text summaries of clusters and categories.

use std::collections::HashMap;

use indexmap::IndexMap;

use raze_classify::CategoryAssignment;
use raze_core::{FileId, FileRecord};

use crate::analysis::Analysis;

/// Longest summary kept, in characters.
pub const MAX_SUMMARY_CHARS: usize = 800;

/// Characters of each snippet quoted in a summary.
pub const SNIPPET_CHARS: usize = 160;

/// Snippets quoted per summary.
pub const MAX_SNIPPETS: usize = 2;

/// Describe a group of files: count, total size, and up to two snippets.
pub fn summarize_cluster(
    file_ids: &[FileId],
    index: &HashMap<&FileId, &FileRecord>,
    excerpts: &HashMap<FileId, String>,
) -> String {
    let total: u64 = file_ids
        .iter()
        .filter_map(|id| index.get(id))
        .map(|r| r.size)
        .sum();
    let mut parts = vec![format!("Files: {}, Total bytes: {}", file_ids.len(), total)];

    let snippets = file_ids
        .iter()
        .filter_map(|id| {
            let text = excerpts.get(id)?.trim().replace('\n', " ");
            if text.is_empty() {
                return None;
            }
            let short_id: String = id.as_str().chars().take(6).collect();
            let quoted: String = text.chars().take(SNIPPET_CHARS).collect();
            Some(format!("Snippet[{short_id}]: {quoted}"))
        })
        .take(MAX_SNIPPETS);
    parts.extend(snippets);

    parts.join(" | ").chars().take(MAX_SUMMARY_CHARS).collect()
}

/// Summary of a discovered category.
pub fn summarize_category(category: &CategoryAssignment) -> String {
    format!("{} (conf {:.2})", category.rationale, category.confidence)
}

/// Summaries keyed like the graph nodes they describe.
pub fn build_summaries(records: &[FileRecord], analysis: &Analysis) -> IndexMap<String, String> {
    let index: HashMap<&FileId, &FileRecord> = records.iter().map(|r| (&r.id, r)).collect();
    let excerpts = &analysis.excerpts;
    let mut out = IndexMap::new();

    for group in &analysis.detections.exact.groups {
        out.insert(
            dup_key(&group.hash.to_hex()),
            summarize_cluster(&group.file_ids, &index, excerpts),
        );
    }
    for (mime, ids) in &analysis.types {
        out.insert(format!("type:{mime}"), summarize_cluster(ids, &index, excerpts));
    }
    for (label, ids) in &analysis.ages {
        out.insert(format!("age:{label}"), summarize_cluster(ids, &index, excerpts));
    }
    for (i, cluster) in analysis.detections.text.iter().enumerate() {
        out.insert(
            format!("neardup:{i}"),
            summarize_cluster(&cluster.file_ids, &index, excerpts),
        );
    }
    for (i, cluster) in analysis.detections.image.iter().enumerate() {
        out.insert(
            format!("imgsim:{i}"),
            summarize_cluster(&cluster.file_ids, &index, excerpts),
        );
    }
    for category in &analysis.assignments {
        out.insert(category_key(category), summarize_category(category));
    }

    out
}

/// Key of an exact duplicate group: `dup:<first 8 hex chars>`.
pub fn dup_key(hash_hex: &str) -> String {
    let end = hash_hex.len().min(8);
    format!("dup:{}", &hash_hex[..end])
}

/// Key of a category: `sub:<Bucket>:<Label>`.
pub fn category_key(category: &CategoryAssignment) -> String {
    format!("sub:{}", category.key())
}

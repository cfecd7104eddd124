//! Merging batch responses into a partition of one bucket.

use std::collections::{HashMap, HashSet};

use raze_core::{Bucket, FileId};

use crate::types::{BatchResponse, CategoryAssignment, ProposedCategory, UNCATEGORIZED};

/// Rationale attached to files no category claimed.
pub const UNCATEGORIZED_RATIONALE: &str =
    "Files not confidently assigned to any discovered content-based subcategory.";

/// Confidence attached to the uncategorized remainder.
pub const UNCATEGORIZED_CONFIDENCE: f64 = 0.5;

/// Merge batch responses, joining categories whose labels match case-insensitively.
///
/// The first spelling of a label is kept. Id lists are concatenated and
/// deduplicated in first-seen order. The highest confidence wins, along
/// with the rationale that came with it.
pub fn merge_batches(batches: Vec<BatchResponse>) -> Vec<ProposedCategory> {
    let mut merged: Vec<ProposedCategory> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for batch in batches {
        for category in batch.categories {
            let key = category.label.to_lowercase();
            match index.get(&key) {
                Some(&i) => {
                    let existing = &mut merged[i];
                    existing.file_ids.extend(category.file_ids);
                    if category.confidence > existing.confidence {
                        existing.confidence = category.confidence;
                        existing.rationale = category.rationale;
                    }
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(category);
                }
            }
        }
    }

    for category in &mut merged {
        let mut seen = HashSet::new();
        category.file_ids.retain(|id| seen.insert(id.clone()));
    }

    merged
}

/// Turn merged categories into a total partition of `bucket_ids`.
///
/// Unknown ids are dropped, each remaining id goes to its highest-confidence
/// category (earliest on ties), empty categories disappear, and leftovers
/// land in [`UNCATEGORIZED`].
pub fn assign_unique(
    bucket: Bucket,
    categories: Vec<ProposedCategory>,
    bucket_ids: &[FileId],
) -> Vec<CategoryAssignment> {
    let known: HashMap<&str, &FileId> = bucket_ids.iter().map(|id| (id.as_str(), id)).collect();

    // Winner per id: (category index, confidence).
    let mut winners: HashMap<&str, (usize, f64)> = HashMap::new();
    for (idx, category) in categories.iter().enumerate() {
        for id in &category.file_ids {
            let Some((&key, _)) = known.get_key_value(id.as_str()) else {
                continue;
            };
            let entry = winners.entry(key).or_insert((idx, category.confidence));
            if category.confidence > entry.1 {
                *entry = (idx, category.confidence);
            }
        }
    }

    let mut out: Vec<CategoryAssignment> = Vec::new();
    let mut emitted: HashSet<&str> = HashSet::new();
    for (idx, category) in categories.iter().enumerate() {
        let file_ids: Vec<FileId> = category
            .file_ids
            .iter()
            .filter(|id| winners.get(id.as_str()).is_some_and(|(w, _)| *w == idx))
            .filter_map(|id| known.get(id.as_str()).copied())
            .filter(|&id| emitted.insert(id.as_str()))
            .cloned()
            .collect();
        if file_ids.is_empty() {
            continue;
        }
        out.push(CategoryAssignment {
            bucket,
            label: category.label.clone(),
            file_ids,
            rationale: category.rationale.clone(),
            confidence: category.confidence,
        });
    }

    let rest: Vec<FileId> = bucket_ids
        .iter()
        .filter(|id| !winners.contains_key(id.as_str()))
        .cloned()
        .collect();
    add_uncategorized(bucket, &mut out, rest);

    out
}

/// Append `ids` to the bucket's uncategorized category, creating it if needed.
fn add_uncategorized(bucket: Bucket, out: &mut Vec<CategoryAssignment>, ids: Vec<FileId>) {
    if ids.is_empty() {
        return;
    }
    match out
        .iter_mut()
        .find(|c| c.label.eq_ignore_ascii_case(UNCATEGORIZED))
    {
        Some(existing) => existing.file_ids.extend(ids),
        None => out.push(CategoryAssignment {
            bucket,
            label: UNCATEGORIZED.to_string(),
            file_ids: ids,
            rationale: UNCATEGORIZED_RATIONALE.to_string(),
            confidence: UNCATEGORIZED_CONFIDENCE,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposed(label: &str, ids: &[&str], rationale: &str, confidence: f64) -> ProposedCategory {
        ProposedCategory {
            label: label.to_string(),
            file_ids: ids.iter().map(|s| s.to_string()).collect(),
            rationale: rationale.to_string(),
            confidence,
        }
    }

    fn ids(values: &[&str]) -> Vec<FileId> {
        values.iter().map(|s| FileId::from(*s)).collect()
    }

    fn batch(categories: Vec<ProposedCategory>) -> BatchResponse {
        BatchResponse {
            categories,
            uncategorized: Vec::new(),
        }
    }

    #[test]
    fn test_same_label_keeps_higher_confidence() {
        let merged = merge_batches(vec![
            batch(vec![proposed("Recipes", &["a"], "low", 0.6)]),
            batch(vec![proposed("recipes", &["b", "a"], "high", 0.9)]),
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].label, "Recipes");
        assert_eq!(merged[0].confidence, 0.9);
        assert_eq!(merged[0].rationale, "high");
        assert_eq!(merged[0].file_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_lower_confidence_does_not_replace_rationale() {
        let merged = merge_batches(vec![
            batch(vec![proposed("X", &["a"], "first", 0.8)]),
            batch(vec![proposed("x", &["b"], "second", 0.3)]),
        ]);
        assert_eq!(merged[0].rationale, "first");
        assert_eq!(merged[0].confidence, 0.8);
    }

    #[test]
    fn test_highest_confidence_wins_ties_go_first() {
        let bucket_ids = ids(&["a", "b", "c"]);
        let out = assign_unique(
            Bucket::Documents,
            vec![
                proposed("One", &["a", "b"], "", 0.7),
                proposed("Two", &["b", "c"], "", 0.9),
                proposed("Three", &["a"], "", 0.7),
            ],
            &bucket_ids,
        );

        let labels: Vec<&str> = out.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["One", "Two"]);
        assert_eq!(out[0].file_ids, ids(&["a"]));
        assert_eq!(out[1].file_ids, ids(&["b", "c"]));
    }

    #[test]
    fn test_unknown_ids_dropped_and_rest_uncategorized() {
        let bucket_ids = ids(&["a", "b", "c"]);
        let out = assign_unique(
            Bucket::Images,
            vec![
                proposed("Cats", &["a", "ghost"], "cats", 0.8),
                proposed("Empty", &["phantom"], "", 0.9),
            ],
            &bucket_ids,
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].file_ids, ids(&["a"]));
        assert_eq!(out[1].label, UNCATEGORIZED);
        assert_eq!(out[1].file_ids, ids(&["b", "c"]));
        assert_eq!(out[1].rationale, UNCATEGORIZED_RATIONALE);
        assert_eq!(out[1].confidence, 0.5);
        assert!(out.iter().all(|c| c.bucket == Bucket::Images));
    }

    #[test]
    fn test_existing_uncategorized_is_extended() {
        let bucket_ids = ids(&["a", "b"]);
        let out = assign_unique(
            Bucket::Other,
            vec![proposed("uncategorized", &["a"], "model said so", 0.4)],
            &bucket_ids,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "uncategorized");
        assert_eq!(out[0].file_ids, ids(&["a", "b"]));
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let bucket_ids = ids(&["a", "b", "c", "d", "e"]);
        let out = assign_unique(
            Bucket::Documents,
            vec![
                proposed("P", &["a", "b", "x"], "", 0.3),
                proposed("Q", &["b", "c", "c"], "", 0.6),
            ],
            &bucket_ids,
        );

        let mut all: Vec<&str> = out
            .iter()
            .flat_map(|c| c.file_ids.iter().map(FileId::as_str))
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
    }
}

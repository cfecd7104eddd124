//! Plan construction from detections and category assignments.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use raze_analyze::{Cluster, Detections};
use raze_classify::CategoryAssignment;
use raze_core::{FileId, FileRecord};

use crate::options::PlanOptions;
use crate::plan::{CostEntry, Delete, DeleteReason, Move, Plan, PlanSummary};

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Build a plan. Pure: the filesystem is not touched.
///
/// Every cluster member after the first becomes a delete, as does every
/// file with a temp suffix, so a file may appear in more than one delete.
/// Every assigned file becomes a move into `<Bucket>/<slug>/`.
pub fn build_plan(
    records: &[FileRecord],
    detections: &Detections,
    assignments: &[CategoryAssignment],
    options: &PlanOptions,
) -> Plan {
    let index: HashMap<&FileId, &FileRecord> = records.iter().map(|r| (&r.id, r)).collect();
    let mut deletes = Vec::new();

    for group in &detections.exact.groups {
        for id in group.file_ids.iter().skip(1) {
            push_delete(&mut deletes, &index, id, DeleteReason::ExactDuplicate, None);
        }
    }
    push_cluster_deletes(&mut deletes, &index, &detections.text, DeleteReason::NearDuplicateText);
    push_cluster_deletes(&mut deletes, &index, &detections.image, DeleteReason::NearDuplicateImage);

    for record in records {
        if options.is_temp_name(&record.file_name()) {
            push_delete(&mut deletes, &index, &record.id, DeleteReason::TempSuffix, None);
        }
    }

    let mut moves = Vec::new();
    for category in assignments {
        let folder = format!("{}/{}/", category.bucket, slugify(&category.label));
        let reason = category.key();
        for id in &category.file_ids {
            let Some(record) = index.get(id) else {
                debug!(file_id = %id, "assigned id not in inventory, no move");
                continue;
            };
            moves.push(Move {
                file_id: id.clone(),
                from_path: record.path.clone(),
                to_folder: folder.clone(),
                reason: reason.clone(),
            });
        }
    }

    let cluster_costs = if options.has_rate() {
        category_costs(&index, assignments, options.storage_rate_per_gb)
    } else {
        IndexMap::new()
    };

    let summary = PlanSummary {
        files_scanned: records.len(),
        duplicate_clusters: detections.exact.groups.len(),
        near_duplicate_clusters: detections.text.len(),
        image_similarity_clusters: detections.image.len(),
        suggested_deletions: deletes.len(),
        suggested_moves: moves.len(),
        storage_rate_per_gb: options.storage_rate_per_gb,
        elapsed_sec: options.elapsed.map(|d| round_to(d.as_secs_f64(), 2)),
    };

    Plan {
        summary,
        moves,
        deletes,
        cluster_costs,
    }
}

fn push_cluster_deletes(
    deletes: &mut Vec<Delete>,
    index: &HashMap<&FileId, &FileRecord>,
    clusters: &[Cluster],
    reason: DeleteReason,
) {
    for (i, cluster) in clusters.iter().enumerate() {
        for id in cluster.redundant() {
            push_delete(deletes, index, id, reason, Some(i));
        }
    }
}

fn push_delete(
    deletes: &mut Vec<Delete>,
    index: &HashMap<&FileId, &FileRecord>,
    id: &FileId,
    reason: DeleteReason,
    cluster: Option<usize>,
) {
    let Some(record) = index.get(id) else {
        debug!(file_id = %id, %reason, "cluster member not in inventory, no delete");
        return;
    };
    deletes.push(Delete {
        file_id: id.clone(),
        path: record.path.clone(),
        reason,
        confidence: reason.confidence(),
        cluster,
    });
}

fn category_costs(
    index: &HashMap<&FileId, &FileRecord>,
    assignments: &[CategoryAssignment],
    rate: f64,
) -> IndexMap<String, CostEntry> {
    let mut bytes: IndexMap<String, u64> = IndexMap::new();
    for category in assignments {
        let total: u64 = category
            .file_ids
            .iter()
            .filter_map(|id| index.get(id))
            .map(|r| r.size)
            .sum();
        *bytes.entry(category.key()).or_default() += total;
    }

    bytes
        .into_iter()
        .map(|(key, bytes)| {
            let gb = bytes as f64 / BYTES_PER_GB;
            let entry = CostEntry {
                bytes,
                gigabytes: round_to(gb, 4),
                estimated_monthly_cost: round_to(gb * rate, 4),
            };
            (key, entry)
        })
        .collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Folder-safe form of a category label.
///
/// Lower-cases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, trims dashes, and falls back to `cluster`.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;
    for c in label.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "cluster".to_string()
    } else {
        slug
    }
}

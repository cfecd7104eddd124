//! Exact duplicate detection by content hash.
//!
//! Hashes are computed during the scan, so this is a single grouping pass.
//! Groups keep first-seen order, which follows the inventory's path order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use raze_core::{ContentHash, FileId, FileRecord};

use crate::hamming::{Cluster, ClusterKind};

/// A group of duplicate files sharing the same content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub hash: ContentHash,

    /// Size of each file in bytes.
    pub size: u64,

    /// Ids of all duplicate files, first-seen first.
    pub file_ids: Vec<FileId>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.file_ids.len()
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.file_ids.len().saturating_sub(1)
    }

    /// View this group as an exact cluster.
    pub fn to_cluster(&self) -> Cluster {
        Cluster {
            kind: ClusterKind::Exact,
            file_ids: self.file_ids.clone(),
        }
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups of duplicate files in first-seen order.
    pub groups: Vec<DuplicateGroup>,

    /// Total size of all duplicate files.
    pub total_duplicate_size: u64,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of files that had a content hash.
    pub files_analyzed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of duplicate groups.
    pub group_count: usize,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Get total number of duplicate files across all groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.file_ids.len()).sum()
    }
}

/// Group records by content hash. Records without a hash are ignored.
pub fn find_exact_duplicates(records: &[FileRecord]) -> DuplicateReport {
    let mut by_hash: IndexMap<ContentHash, (u64, Vec<FileId>)> = IndexMap::new();
    let mut files_analyzed = 0u64;

    for record in records {
        let Some(hash) = record.content_hash else {
            continue;
        };
        files_analyzed += 1;
        by_hash
            .entry(hash)
            .or_insert_with(|| (record.size, Vec::new()))
            .1
            .push(record.id.clone());
    }

    let groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, (_, ids))| ids.len() > 1)
        .map(|(hash, (size, file_ids))| DuplicateGroup {
            hash,
            size,
            wasted_bytes: size * (file_ids.len() as u64 - 1),
            file_ids,
        })
        .collect();

    let total_duplicate_size = groups.iter().map(|g| g.size * g.count() as u64).sum();
    let total_wasted_space = groups.iter().map(|g| g.wasted_bytes).sum();
    let files_with_duplicates = groups.iter().map(|g| g.count() as u64).sum();
    let group_count = groups.len();

    DuplicateReport {
        groups,
        total_duplicate_size,
        total_wasted_space,
        files_analyzed,
        files_with_duplicates,
        group_count,
    }
}

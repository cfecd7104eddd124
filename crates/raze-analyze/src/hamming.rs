//! Hamming distance and greedy seed clustering over 64-bit fingerprints.

use serde::{Deserialize, Serialize};

use raze_core::FileId;

/// A 64-bit fingerprint attached to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// File the fingerprint was computed for.
    pub file_id: FileId,
    /// The fingerprint bits.
    pub hash: u64,
}

impl Fingerprint {
    /// Create a new fingerprint.
    pub fn new(file_id: FileId, hash: u64) -> Self {
        Self { file_id, hash }
    }
}

/// Text simhash of a file excerpt.
pub type TextFingerprint = Fingerprint;

/// Perceptual hash of an image.
pub type ImageFingerprint = Fingerprint;

/// Kind of similarity a cluster was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    /// Identical content hash.
    Exact,
    /// Near-duplicate text (simhash).
    Text,
    /// Perceptually similar images (pHash).
    Image,
}

/// An ordered group of at least two related files.
///
/// The first id is the seed; plan building keeps it and proposes the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// How the members are related.
    pub kind: ClusterKind,
    /// Member ids, seed first.
    pub file_ids: Vec<FileId>,
}

impl Cluster {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.file_ids.len()
    }

    /// True if there are no members.
    pub fn is_empty(&self) -> bool {
        self.file_ids.is_empty()
    }

    /// The member that is kept.
    pub fn seed(&self) -> Option<&FileId> {
        self.file_ids.first()
    }

    /// Members proposed for removal (everything after the seed).
    pub fn redundant(&self) -> &[FileId] {
        self.file_ids.get(1..).unwrap_or_default()
    }
}

/// Number of differing bits.
#[inline]
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Greedy seed-based single-link clustering.
///
/// Items are visited in order. Each unvisited item becomes a seed and absorbs
/// every later unvisited item within `threshold` bits of the seed itself.
/// Membership is never transitive through non-seed members. Singletons are
/// discarded.
pub fn cluster_by_hamming(items: &[Fingerprint], threshold: u32, kind: ClusterKind) -> Vec<Cluster> {
    let mut visited = vec![false; items.len()];
    let mut clusters = Vec::new();

    for i in 0..items.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let seed = &items[i];
        let mut members = vec![seed.file_id.clone()];

        for j in (i + 1)..items.len() {
            if !visited[j] && hamming_distance(seed.hash, items[j].hash) <= threshold {
                visited[j] = true;
                members.push(items[j].file_id.clone());
            }
        }

        if members.len() > 1 {
            clusters.push(Cluster {
                kind,
                file_ids: members,
            });
        }
    }

    clusters
}

//! Fingerprinting and clustering over a whole inventory.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use raze_core::{FileId, FileRecord};

use crate::config::SimilarityConfig;
use crate::duplicates::{DuplicateReport, find_exact_duplicates};
use crate::excerpt::{ExcerptSource, truncate_chars};
use crate::hamming::{Cluster, ClusterKind, ImageFingerprint, TextFingerprint, cluster_by_hamming};
use crate::phash::{is_image_path, phash64};
use crate::simhash::{simhash64, tokenize};

/// Text gathered for an inventory.
#[derive(Debug, Clone, Default)]
pub struct TextScan {
    /// Truncated excerpts by file id, only for files with at least one word.
    pub excerpts: HashMap<FileId, String>,
    /// Simhash of each file's full text, in inventory order.
    pub fingerprints: Vec<TextFingerprint>,
}

/// Everything the detector found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detections {
    /// Exact duplicate groups.
    pub exact: DuplicateReport,
    /// Near-duplicate text clusters.
    pub text: Vec<Cluster>,
    /// Perceptually similar image clusters.
    pub image: Vec<Cluster>,
}

impl Detections {
    /// Exact groups as clusters.
    pub fn exact_clusters(&self) -> Vec<Cluster> {
        self.exact.groups.iter().map(|g| g.to_cluster()).collect()
    }

    /// Total number of clusters of every kind.
    pub fn cluster_count(&self) -> usize {
        self.exact.groups.len() + self.text.len() + self.image.len()
    }
}

/// Runs the exact, text and image detectors.
pub struct SimilarityDetector {
    config: SimilarityConfig,
}

impl SimilarityDetector {
    /// Create a new detector with default config.
    pub fn new() -> Self {
        Self {
            config: SimilarityConfig::default(),
        }
    }

    /// Create a new detector with custom config.
    pub fn with_config(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Read excerpts and compute text fingerprints in parallel.
    pub fn scan_text(&self, records: &[FileRecord], source: &dyn ExcerptSource) -> TextScan {
        let shingle_size = self.config.shingle_size;
        let excerpt_chars = self.config.excerpt_chars;

        let found: Vec<(FileId, String, u64)> = records
            .par_iter()
            .filter_map(|record| {
                let text = source.excerpt(&record.path, &record.mime_type)?;
                // No tokens means every such file shares one fingerprint.
                if tokenize(&text).is_empty() {
                    debug!(path = %record.path.display(), "excerpt has no words, skipped");
                    return None;
                }
                let hash = simhash64(&text, shingle_size);
                let excerpt = truncate_chars(&text, excerpt_chars).to_string();
                Some((record.id.clone(), excerpt, hash))
            })
            .collect();

        let mut scan = TextScan::default();
        for (id, excerpt, hash) in found {
            scan.fingerprints.push(TextFingerprint::new(id.clone(), hash));
            scan.excerpts.insert(id, excerpt);
        }
        debug!(files = scan.fingerprints.len(), "text fingerprints computed");
        scan
    }

    /// Compute perceptual hashes for image files in parallel.
    ///
    /// Files that fail to decode are left out.
    pub fn image_fingerprints(&self, records: &[FileRecord]) -> Vec<ImageFingerprint> {
        if !self.config.detect_images {
            return Vec::new();
        }

        records
            .par_iter()
            .filter(|record| is_image_path(&record.path))
            .filter_map(|record| match phash64(&record.path) {
                Ok(hash) => Some(ImageFingerprint::new(record.id.clone(), hash)),
                Err(err) => {
                    debug!(path = %record.path.display(), error = %err, "image skipped");
                    None
                }
            })
            .collect()
    }

    /// Cluster precomputed fingerprints and group exact duplicates.
    pub fn detect(
        &self,
        records: &[FileRecord],
        text: &[TextFingerprint],
        images: &[ImageFingerprint],
    ) -> Detections {
        Detections {
            exact: find_exact_duplicates(records),
            text: cluster_by_hamming(text, self.config.text_threshold, ClusterKind::Text),
            image: cluster_by_hamming(images, self.config.image_threshold, ClusterKind::Image),
        }
    }
}

impl Default for SimilarityDetector {
    fn default() -> Self {
        Self::new()
    }
}

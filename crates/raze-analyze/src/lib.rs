//! Detection algorithms for raze.
//!
//! This crate finds related files in a scanned inventory:
//!
//! - **Exact duplicates** - files sharing a BLAKE3 content hash
//! - **Near-duplicate text** - 64-bit simhash over word shingles
//! - **Similar images** - DCT perceptual hash
//! - **Projections** - coarse grouping by mime type and age
//!
//! Near-duplicate and image clusters use the same greedy rule: each
//! unvisited item seeds a cluster and absorbs later unvisited items within
//! the threshold of the seed.
//!
//! ```rust,ignore
//! use raze_analyze::{PlainTextExcerpts, SimilarityDetector};
//! use raze_scan::{FingerprintScanner, ScanConfig};
//!
//! let inventory = FingerprintScanner::new().scan(&ScanConfig::new("/data")).unwrap();
//! let detector = SimilarityDetector::new();
//!
//! let text = detector.scan_text(&inventory.records, &PlainTextExcerpts::new());
//! let images = detector.image_fingerprints(&inventory.records);
//! let detections = detector.detect(&inventory.records, &text.fingerprints, &images);
//!
//! println!("{} exact groups", detections.exact.group_count);
//! println!("{} near-duplicate clusters", detections.text.len());
//! ```

pub mod age;
mod config;
mod detect;
mod duplicates;
mod excerpt;
mod hamming;
pub mod phash;
pub mod simhash;

pub use age::{AgeBucket, AgeConfig, AgeConfigBuilder, cluster_by_age, cluster_by_type, format_age};
pub use config::{SimilarityConfig, SimilarityConfigBuilder};
pub use detect::{Detections, SimilarityDetector, TextScan};
pub use duplicates::{DuplicateGroup, DuplicateReport, find_exact_duplicates};
pub use excerpt::{
    DEFAULT_MAX_TEXT_BYTES, ExcerptSource, PlainTextExcerpts, TEXT_EXTENSIONS, truncate_chars,
};
pub use hamming::{
    Cluster, ClusterKind, Fingerprint, ImageFingerprint, TextFingerprint, cluster_by_hamming,
    hamming_distance,
};

// Re-export core types
pub use raze_core::{ContentHash, FileId, FileRecord};

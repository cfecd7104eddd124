//! Content-derived category discovery for raze.
//!
//! Files are grouped into coarse buckets by mime type, then each bucket is
//! sent in batches to a [`Classifier`] that proposes subcategories. The
//! answers are validated, merged across batches, and resolved into a total
//! partition of the bucket:
//!
//! - labels merge case-insensitively, keeping the highest confidence
//! - each file goes to its most confident category
//! - unclaimed files land in `Uncategorized`
//!
//! Without a configured endpoint every bucket becomes one `All <Bucket>`
//! category.
//!
//! ```rust,ignore
//! use raze_classify::{CategoryMerger, ClassifierConfig};
//!
//! let config = ClassifierConfig::builder()
//!     .endpoint(Some("http://localhost:11434".to_string()))
//!     .model(Some("llama3".to_string()))
//!     .build()
//!     .unwrap();
//! let merger = CategoryMerger::new(config)?;
//! let assignments = merger.classify_all(&records, &excerpts);
//! ```

mod client;
mod config;
mod consensus;
mod error;
mod merge;
mod recover;
mod types;

pub use client::{ChatClassifier, Classifier, normalize_endpoint};
pub use config::{ClassifierConfig, ClassifierConfigBuilder, DEFAULT_BATCH_SIZE};
pub use consensus::{CategoryMerger, FAILURE_CONFIDENCE, FALLBACK_CONFIDENCE};
pub use error::ClassifyError;
pub use merge::{UNCATEGORIZED_CONFIDENCE, UNCATEGORIZED_RATIONALE, assign_unique, merge_batches};
pub use recover::{extract_response, find_json_object};
pub use types::{
    BatchResponse, CategoryAssignment, DEFAULT_CONFIDENCE, DEFAULT_LABEL, FileDescriptor,
    MAX_LABEL_CHARS, ProposedCategory, UNCATEGORIZED, normalize_confidence,
};

// Re-export core types
pub use raze_core::{Bucket, FileId, FileRecord};

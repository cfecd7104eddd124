//! Per-bucket category discovery with batching, retries, and fallbacks.

use std::collections::HashMap;
use std::thread;

use rayon::prelude::*;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use raze_core::{Bucket, FileId, FileRecord};

use crate::client::{ChatClassifier, Classifier};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::merge::{assign_unique, merge_batches};
use crate::recover::extract_response;
use crate::types::{CategoryAssignment, FileDescriptor, UNCATEGORIZED};

/// Confidence for a fallback catch-all category.
pub const FALLBACK_CONFIDENCE: f64 = 1.0;

/// Confidence for a bucket whose classification failed.
pub const FAILURE_CONFIDENCE: f64 = 0.5;

/// Drives a [`Classifier`] over every bucket and merges its answers.
pub struct CategoryMerger {
    config: ClassifierConfig,
    classifier: Option<Box<dyn Classifier>>,
}

impl CategoryMerger {
    /// Build a merger from configuration.
    ///
    /// When neither an endpoint nor a model is configured there is no
    /// classifier and every bucket falls back to a single category. Setting
    /// only one of them is an error.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let classifier: Option<Box<dyn Classifier>> = if config.is_requested() {
            Some(Box::new(ChatClassifier::new(&config)?))
        } else {
            None
        };
        Ok(Self { config, classifier })
    }

    /// Build a merger around a custom classifier.
    pub fn with_classifier(config: ClassifierConfig, classifier: Box<dyn Classifier>) -> Self {
        Self {
            config,
            classifier: Some(classifier),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether a classifier is attached.
    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classify every record, bucket by bucket.
    ///
    /// Buckets run in parallel; the result is ordered by bucket and the
    /// assignments of each bucket partition exactly that bucket's records.
    pub fn classify_all(
        &self,
        records: &[FileRecord],
        excerpts: &HashMap<FileId, String>,
    ) -> Vec<CategoryAssignment> {
        let mut grouped: HashMap<Bucket, Vec<FileDescriptor>> = HashMap::new();
        for record in records {
            let snippet = excerpts.get(&record.id).map(String::as_str);
            grouped
                .entry(record.bucket())
                .or_default()
                .push(FileDescriptor::from_record(
                    record,
                    snippet,
                    self.config.max_snippet_chars,
                ));
        }

        let buckets: Vec<(Bucket, Vec<FileDescriptor>)> = Bucket::iter()
            .filter_map(|b| grouped.remove(&b).map(|files| (b, files)))
            .collect();

        buckets
            .par_iter()
            .map(|(bucket, files)| self.classify_bucket(*bucket, files))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    /// Classify one bucket.
    ///
    /// Batches run sequentially. A batch that still fails after its retries
    /// turns the whole bucket into a single uncategorized group.
    pub fn classify_bucket(&self, bucket: Bucket, files: &[FileDescriptor]) -> Vec<CategoryAssignment> {
        if files.is_empty() {
            return Vec::new();
        }
        let ids: Vec<FileId> = files.iter().map(|f| f.id.clone()).collect();

        let Some(classifier) = self.classifier.as_deref() else {
            debug!(%bucket, files = files.len(), "no classifier configured, using fallback");
            return vec![fallback_category(bucket, ids)];
        };

        let mut batches = Vec::new();
        for (n, chunk) in files.chunks(self.config.batch_size).enumerate() {
            match self.call_with_retry(classifier, bucket, chunk) {
                Ok(text) => batches.push(extract_response(&text)),
                Err(e) => {
                    warn!(%bucket, batch = n, error = %e, "classification failed");
                    return vec![failed_category(bucket, ids, &e)];
                }
            }
        }

        let merged = merge_batches(batches);
        let assignments = assign_unique(bucket, merged, &ids);
        info!(%bucket, files = ids.len(), categories = assignments.len(), "bucket classified");
        assignments
    }

    fn call_with_retry(
        &self,
        classifier: &dyn Classifier,
        bucket: Bucket,
        files: &[FileDescriptor],
    ) -> Result<String, ClassifyError> {
        let mut attempt = 1;
        loop {
            match classifier.classify_batch(bucket, files) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.retry_attempts => {
                    let delay = self.config.retry_backoff(attempt);
                    warn!(
                        %bucket,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying classification batch"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn fallback_category(bucket: Bucket, ids: Vec<FileId>) -> CategoryAssignment {
    CategoryAssignment {
        bucket,
        label: format!("All {bucket}"),
        rationale: format!("{} files (fallback).", ids.len()),
        file_ids: ids,
        confidence: FALLBACK_CONFIDENCE,
    }
}

fn failed_category(bucket: Bucket, ids: Vec<FileId>, error: &ClassifyError) -> CategoryAssignment {
    CategoryAssignment {
        bucket,
        label: UNCATEGORIZED.to_string(),
        file_ids: ids,
        rationale: format!("Classification failed: {error}"),
        confidence: FAILURE_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor(id: &str) -> FileDescriptor {
        FileDescriptor {
            id: FileId::from(id),
            name: format!("{id}.txt"),
            path: format!("/data/{id}.txt"),
            ext: "txt".to_string(),
            mime: "text/plain".to_string(),
            size: 1,
            snippet: String::new(),
        }
    }

    #[test]
    fn test_fallback_without_classifier() {
        let merger = CategoryMerger::new(ClassifierConfig::default()).unwrap();
        assert!(!merger.has_classifier());

        let files = vec![descriptor("a"), descriptor("b")];
        let out = merger.classify_bucket(Bucket::Documents, &files);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "All Documents");
        assert_eq!(out[0].rationale, "2 files (fallback).");
        assert_eq!(out[0].confidence, 1.0);
    }

    #[test]
    fn test_endpoint_without_model_is_rejected() {
        let config = ClassifierConfig {
            endpoint: Some("http://localhost:11434".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            CategoryMerger::new(config),
            Err(ClassifyError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_empty_bucket_yields_nothing() {
        let merger = CategoryMerger::new(ClassifierConfig::default()).unwrap();
        assert!(merger.classify_bucket(Bucket::Video, &[]).is_empty());
    }

    #[test]
    fn test_classify_all_orders_by_bucket() {
        let record = |name: &str, mime: &str| FileRecord {
            id: FileId::from(name),
            path: PathBuf::from(format!("/data/{name}")),
            size: 10,
            mtime: 0.0,
            mime_type: mime.to_string(),
            content_hash: None,
        };
        let records = vec![
            record("song.mp3", "audio/mpeg"),
            record("notes.txt", "text/plain"),
            record("cat.png", "image/png"),
            record("blob", "chemical/x-pdb"),
        ];

        let merger = CategoryMerger::new(ClassifierConfig::default()).unwrap();
        let out = merger.classify_all(&records, &HashMap::new());
        let labels: Vec<&str> = out.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["All Images", "All Documents", "All Audio", "All Other"]);
    }
}

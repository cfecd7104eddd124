//! Similarity detection configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for near-duplicate and image-similarity detection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct SimilarityConfig {
    /// Maximum simhash distance for two texts to be near-duplicates.
    #[builder(default = "8")]
    pub text_threshold: u32,

    /// Maximum pHash distance for two images to be similar.
    #[builder(default = "12")]
    pub image_threshold: u32,

    /// Tokens per shingle.
    #[builder(default = "3")]
    pub shingle_size: usize,

    /// Characters of each excerpt kept for summaries and classification.
    #[builder(default = "2000")]
    pub excerpt_chars: usize,

    /// Compute perceptual hashes for images.
    #[builder(default = "true")]
    pub detect_images: bool,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            text_threshold: 8,
            image_threshold: 12,
            shingle_size: 3,
            excerpt_chars: 2000,
            detect_images: true,
        }
    }
}

impl SimilarityConfig {
    /// Create a new config builder.
    pub fn builder() -> SimilarityConfigBuilder {
        SimilarityConfigBuilder::default()
    }
}

//! Classifier configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of files per classification request.
pub const DEFAULT_BATCH_SIZE: usize = 400;

/// Configuration for category discovery.
///
/// Without both an endpoint and a model, every bucket falls back to a
/// single catch-all category.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ClassifierConfig {
    /// OpenAI-compatible endpoint (bare host, `/v1`, or full path).
    #[builder(default)]
    pub endpoint: Option<String>,

    /// Model name sent with every request.
    #[builder(default)]
    pub model: Option<String>,

    /// Optional bearer token.
    #[builder(default)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Files per request.
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    pub batch_size: usize,

    /// Characters of each snippet sent to the classifier.
    #[builder(default = "1000")]
    pub max_snippet_chars: usize,

    /// Request timeout in seconds.
    #[builder(default = "180")]
    pub timeout_secs: u64,

    /// Sampling temperature.
    #[builder(default = "0.2")]
    pub temperature: f32,

    /// Completion token cap.
    #[builder(default = "1800")]
    pub max_tokens: u32,

    /// Attempts per batch, including the first.
    #[builder(default = "3")]
    pub retry_attempts: u32,

    /// Delay before the first retry in milliseconds; doubles each retry.
    #[builder(default = "1000")]
    pub retry_base_delay_ms: u64,
}

impl ClassifierConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.batch_size {
            return Err("Batch size must be at least 1".to_string());
        }
        if let Some(0) = self.retry_attempts {
            return Err("Retry attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_snippet_chars: 1000,
            timeout_secs: 180,
            temperature: 0.2,
            max_tokens: 1800,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl ClassifierConfig {
    /// Create a new config builder.
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder::default()
    }

    /// True when both an endpoint and a model are set.
    pub fn is_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.endpoint) && set(&self.model)
    }

    /// True when an endpoint or a model is set, even if the other is missing.
    pub fn is_requested(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.endpoint) || set(&self.model)
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(10);
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(1 << exp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        assert!(!ClassifierConfig::default().is_configured());

        let config = ClassifierConfig::builder()
            .endpoint(Some("http://localhost:11434".to_string()))
            .model(Some("llama3".to_string()))
            .build()
            .unwrap();
        assert!(config.is_configured());

        let blank = ClassifierConfig::builder()
            .endpoint(Some("http://localhost:11434".to_string()))
            .model(Some("  ".to_string()))
            .build()
            .unwrap();
        assert!(!blank.is_configured());
        assert!(blank.is_requested());
        assert!(!ClassifierConfig::default().is_requested());
    }

    #[test]
    fn test_retry_backoff_doubles() {
        let config = ClassifierConfig::default();
        assert_eq!(config.retry_backoff(1), Duration::from_secs(1));
        assert_eq!(config.retry_backoff(2), Duration::from_secs(2));
        assert_eq!(config.retry_backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn test_builder_rejects_zero_batch() {
        assert!(ClassifierConfig::builder().batch_size(0usize).build().is_err());
    }
}

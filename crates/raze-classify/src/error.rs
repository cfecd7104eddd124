//! Error types for classification.

use thiserror::Error;

/// Errors raised while talking to a classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Transport-level failure (connect, timeout, body).
    #[error("HTTP request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response envelope could not be understood.
    #[error("malformed response: {message}")]
    Response { message: String },

    /// Invalid classifier configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ClassifyError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { source } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.is_body()
                    || source.is_request()
                    || source.is_decode()
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Response { .. } | Self::InvalidConfig { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryability() {
        let retry = |status| ClassifyError::Status {
            status,
            body: String::new(),
        };
        assert!(retry(429).is_retryable());
        assert!(retry(503).is_retryable());
        assert!(!retry(400).is_retryable());
        assert!(!retry(401).is_retryable());
        assert!(
            !ClassifyError::InvalidConfig {
                message: "x".into()
            }
            .is_retryable()
        );
    }
}

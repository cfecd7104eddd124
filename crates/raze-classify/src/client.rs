//! Classifier trait and the OpenAI-compatible chat client.

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use raze_core::Bucket;

use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::types::FileDescriptor;

/// Something that proposes categories for a batch of files.
///
/// Implementations return the raw response text; parsing and validation
/// happen in the caller.
pub trait Classifier: Send + Sync {
    /// Classify one batch of files from a single bucket.
    fn classify_batch(&self, bucket: Bucket, files: &[FileDescriptor]) -> Result<String, ClassifyError>;
}

const SYSTEM_PROMPT: &str = r#"You organize a user's files. You receive one BASE BUCKET (Images, Documents, Audio, Video, or Other) and a list of files described as {id, name, path, ext, mime, size, snippet}.

Work only inside the given bucket:
1. Find between 3 and 12 subcategories that reflect what the files actually contain, judged from snippets and metadata. Avoid generic names and avoid grouping by extension alone. Prefer subcategories that do not overlap.
2. Put each file id in at most one subcategory. When unsure, leave it out.
3. Reply with JSON only, using this schema:
{
  "categories": [
    {"label": "<name>", "file_ids": ["<id>", ...], "rationale": "<why these belong together>", "confidence": 0.0-1.0}
  ],
  "uncategorized": ["<id>", ...]
}
Keep labels short and specific to this batch."#;

/// Normalize an endpoint to its `/v1/chat/completions` URL.
///
/// Accepts a bare host, a `/v1` base, or the full path, with or without a
/// trailing slash.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let e = endpoint.trim().trim_end_matches('/');
    if e.ends_with("/v1/chat/completions") {
        e.to_string()
    } else if e.ends_with("/v1") {
        format!("{e}/chat/completions")
    } else {
        format!("{e}/v1/chat/completions")
    }
}

/// Blocking client for OpenAI-compatible chat completion servers.
#[derive(Clone)]
pub struct ChatClassifier {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClassifier {
    /// Build a client from configuration. Endpoint and model are required.
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClassifyError::InvalidConfig {
                message: "missing classifier endpoint".to_string(),
            })?;
        let model = config
            .model
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClassifyError::InvalidConfig {
                message: "missing classifier model".to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let auth = format!("Bearer {}", key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth).map_err(|_| ClassifyError::InvalidConfig {
                    message: "invalid API key".to_string(),
                })?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: normalize_endpoint(endpoint),
            model: model.trim().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// The normalized completions URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Classifier for ChatClassifier {
    fn classify_batch(&self, bucket: Bucket, files: &[FileDescriptor]) -> Result<String, ClassifyError> {
        let user = serde_json::to_string(&BatchRequest { bucket, files }).map_err(|e| {
            ClassifyError::Response {
                message: format!("failed to encode batch: {e}"),
            }
        })?;
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(%bucket, files = files.len(), url = %self.url, "sending classification batch");
        let resp = self.client.post(&self.url).json(&request).send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json()?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    bucket: Bucket,
    files: &'a [FileDescriptor],
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        let full = "http://localhost:11434/v1/chat/completions";
        assert_eq!(normalize_endpoint("http://localhost:11434"), full);
        assert_eq!(normalize_endpoint("http://localhost:11434/"), full);
        assert_eq!(normalize_endpoint("http://localhost:11434/v1"), full);
        assert_eq!(normalize_endpoint("http://localhost:11434/v1/"), full);
        assert_eq!(normalize_endpoint(full), full);
    }

    #[test]
    fn test_new_requires_endpoint_and_model() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            ChatClassifier::new(&config),
            Err(ClassifyError::InvalidConfig { .. })
        ));

        let config = ClassifierConfig::builder()
            .endpoint(Some("http://127.0.0.1:9/v1".to_string()))
            .model(Some("local-model".to_string()))
            .api_key(Some("secret".to_string()))
            .build()
            .unwrap();
        let client = ChatClassifier::new(&config).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:9/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let files: Vec<FileDescriptor> = Vec::new();
        let user = serde_json::to_string(&BatchRequest {
            bucket: Bucket::Audio,
            files: &files,
        })
        .unwrap();
        assert_eq!(user, r#"{"bucket":"Audio","files":[]}"#);

        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
            max_tokens: 1800,
            response_format: ResponseFormat { kind: "json_object" },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["max_tokens"], 1800);
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn test_response_without_content_is_empty() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        assert!(content.is_empty());
    }
}

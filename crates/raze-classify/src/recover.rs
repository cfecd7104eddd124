//! Best-effort recovery of a JSON object from model output.

use serde_json::Value;
use tracing::debug;

use crate::types::BatchResponse;

/// Find the largest balanced `{...}` substring.
///
/// Braces inside string literals (including escaped quotes) are ignored.
/// Among equally long candidates the earliest wins.
pub fn find_json_object(text: &str) -> Option<&str> {
    let mut best: Option<(usize, usize)> = None;
    let mut in_str = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, b) in text.bytes().enumerate() {
        if in_str {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_str = false;
            }
            continue;
        }

        match b {
            b'"' => in_str = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 && best.is_none_or(|(s, e)| i - start > e - s) {
                    best = Some((start, i));
                }
            }
            _ => {}
        }
    }

    best.map(|(s, e)| &text[s..=e])
}

/// Decode a classifier response through the fallback chain:
/// direct parse, then the largest balanced object, then an empty response.
pub fn extract_response(text: &str) -> BatchResponse {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return BatchResponse::from_value(&value);
    }

    let recovered = find_json_object(text).and_then(|c| serde_json::from_str::<Value>(c).ok());
    if let Some(value) = recovered {
        return BatchResponse::from_value(&value);
    }

    debug!(len = text.len(), "no JSON object recovered from response");
    BatchResponse::default()
}

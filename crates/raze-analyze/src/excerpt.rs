//! Text excerpt sources.

use std::path::Path;

use tracing::debug;

/// Extensions treated as plain text regardless of the mime guess.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "log", "json", "yaml", "yml", "xml", "html", "htm",
];

/// Default size cap for reading a text file (2 MB).
pub const DEFAULT_MAX_TEXT_BYTES: u64 = 2_000_000;

/// Provides a text excerpt for a file, if one can be produced.
///
/// Implementations must be cheap to share across threads; excerpts are
/// requested from the rayon pool.
pub trait ExcerptSource: Send + Sync {
    /// Return the file's text, or `None` if the file has no usable text.
    fn excerpt(&self, path: &Path, mime: &str) -> Option<String>;
}

/// Reads small text-like files directly.
///
/// Content is decoded as UTF-8, falling back to Latin-1.
#[derive(Debug, Clone)]
pub struct PlainTextExcerpts {
    max_bytes: u64,
}

impl PlainTextExcerpts {
    /// Create a source with the default size cap.
    pub fn new() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }

    /// Create a source with a custom size cap.
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn is_text(path: &Path, mime: &str) -> bool {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        TEXT_EXTENSIONS.contains(&ext.as_str()) || mime.starts_with("text/")
    }
}

impl Default for PlainTextExcerpts {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcerptSource for PlainTextExcerpts {
    fn excerpt(&self, path: &Path, mime: &str) -> Option<String> {
        if !Self::is_text(path, mime) {
            return None;
        }

        let size = std::fs::metadata(path).ok()?.len();
        if size > self.max_bytes {
            return None;
        }

        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "excerpt read failed");
                return None;
            }
        };

        Some(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
        })
    }
}

/// Truncate a string to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

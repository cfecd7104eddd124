//! Per-file fingerprint records.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Stable identifier for a file, derived from its absolute path.
///
/// Re-scanning an unchanged tree yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(CompactString);

impl FileId {
    /// Derive the id for an absolute path.
    pub fn from_path(path: &Path) -> Self {
        let digest = blake3::hash(path.as_os_str().as_encoded_bytes());
        let hex: String = digest.as_bytes()[..16]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self(CompactString::from(hex))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix used in quarantine names and summary keys.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(CompactString::from(s))
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(CompactString::from(s))
    }
}

impl Borrow<str> for FileId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// BLAKE3 content hash for exact duplicate detection.
///
/// Serialized as a lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Error returned when a hex string is not a valid content hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash: expected 64 hex characters")]
pub struct ParseHashError;

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        blake3::Hash::from_hex(s)
            .map(|hash| Self(*hash.as_bytes()))
            .map_err(|_| ParseHashError)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Coarse content bucket derived from the mime type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
)]
pub enum Bucket {
    Images,
    Documents,
    Audio,
    Video,
    Other,
}

impl Bucket {
    /// Map a mime type to its bucket by its top-level type.
    pub fn from_mime(mime: &str) -> Self {
        let top = mime.split('/').next().unwrap_or_default().to_ascii_lowercase();
        match top.as_str() {
            "image" => Self::Images,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "text" | "application" => Self::Documents,
            _ => Self::Other,
        }
    }
}

/// Fingerprint of a single regular file, produced once per scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Stable digest of the absolute path.
    pub id: FileId,

    /// Absolute path to the file.
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// Modification time in seconds since the epoch.
    pub mtime: f64,

    /// Best-effort mime guess from the file name.
    pub mime_type: String,

    /// Full content hash, only present for files under the hash size cap.
    pub content_hash: Option<ContentHash>,
}

impl FileRecord {
    /// File name (last path component), lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lower-cased extension without the leading dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Top-level mime type (`text`, `image`, ...).
    pub fn mime_top_level(&self) -> &str {
        self.mime_type.split('/').next().unwrap_or_default()
    }

    /// Bucket this record belongs to.
    pub fn bucket(&self) -> Bucket {
        Bucket::from_mime(&self.mime_type)
    }

    /// Path relative to a scan root, falling back to the absolute path.
    pub fn relative_to(&self, root: &Path) -> PathBuf {
        self.path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }
}

//! Age and type projections over an inventory.
//!
//! These are coarse views used for summaries and the graph:
//! - files grouped by top-level mime type
//! - files grouped into age buckets relative to a reference time

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use raze_core::{FileId, FileRecord};

const DAY: u64 = 24 * 60 * 60;

/// An age bucket for categorizing files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeBucket {
    /// Human-readable name for this bucket.
    pub name: String,
    /// Files strictly younger than this land in the bucket.
    pub max_age: Duration,
}

impl AgeBucket {
    /// Create a new age bucket.
    pub fn new(name: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            max_age,
        }
    }
}

/// Configuration for age grouping.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct AgeConfig {
    /// Reference time for age calculations (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,

    /// Age buckets, youngest first. The last bucket catches everything else.
    #[builder(default = "Self::default_buckets()")]
    pub buckets: Vec<AgeBucket>,
}

impl AgeConfigBuilder {
    fn default_buckets() -> Vec<AgeBucket> {
        vec![
            AgeBucket::new("new(<30d)", Duration::from_secs(30 * DAY)),
            AgeBucket::new("stale(30-180d)", Duration::from_secs(180 * DAY)),
            AgeBucket::new("old(>180d)", Duration::MAX),
        ]
    }
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self {
            reference_time: SystemTime::now(),
            buckets: AgeConfigBuilder::default_buckets(),
        }
    }
}

impl AgeConfig {
    /// Create a new config builder.
    pub fn builder() -> AgeConfigBuilder {
        AgeConfigBuilder::default()
    }

    /// Age of a record relative to the reference time. Future mtimes count as zero.
    pub fn age_of(&self, record: &FileRecord) -> Duration {
        let reference = self
            .reference_time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let secs = reference - record.mtime;
        if secs.is_finite() && secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// Group file ids into the configured age buckets.
///
/// Every bucket appears in the result, in configuration order, even when empty.
pub fn cluster_by_age(records: &[FileRecord], config: &AgeConfig) -> IndexMap<String, Vec<FileId>> {
    let mut out: IndexMap<String, Vec<FileId>> = config
        .buckets
        .iter()
        .map(|b| (b.name.clone(), Vec::new()))
        .collect();

    for record in records {
        let age = config.age_of(record);
        let bucket = config
            .buckets
            .iter()
            .find(|b| age < b.max_age)
            .or_else(|| config.buckets.last());
        if let Some(ids) = bucket.and_then(|b| out.get_mut(&b.name)) {
            ids.push(record.id.clone());
        }
    }

    out
}

/// Group file ids by top-level mime type, in first-seen order.
pub fn cluster_by_type(records: &[FileRecord]) -> IndexMap<String, Vec<FileId>> {
    let mut out: IndexMap<String, Vec<FileId>> = IndexMap::new();
    for record in records {
        out.entry(record.mime_top_level().to_string())
            .or_default()
            .push(record.id.clone());
    }
    out
}

/// Format a duration as a human-readable string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < DAY {
        format!("{} hours", secs / 3600)
    } else if secs < 30 * DAY {
        format!("{} days", secs / DAY)
    } else if secs < 365 * DAY {
        format!("{} months", secs / (30 * DAY))
    } else {
        format!("{:.1} years", secs as f64 / (365 * DAY) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(name: &str, mime: &str, mtime: f64) -> FileRecord {
        FileRecord {
            id: FileId::from(name),
            path: PathBuf::from(format!("/r/{name}")),
            size: 1,
            mtime,
            mime_type: mime.to_string(),
            content_hash: None,
        }
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(30)), "30 seconds");
        assert_eq!(format_age(Duration::from_secs(120)), "2 minutes");
        assert_eq!(format_age(Duration::from_secs(7200)), "2 hours");
        assert_eq!(format_age(Duration::from_secs(172800)), "2 days");
    }

    #[test]
    fn test_default_config() {
        let config = AgeConfig::default();
        assert_eq!(config.buckets.len(), 3);
        assert_eq!(config.buckets[0].name, "new(<30d)");
        assert_eq!(config.buckets[2].name, "old(>180d)");
    }

    #[test]
    fn test_cluster_by_age_boundaries() {
        let now = 1_000 * DAY;
        let config = AgeConfig::builder()
            .reference_time(UNIX_EPOCH + Duration::from_secs(now))
            .build()
            .unwrap();
        let day = DAY as f64;
        let now = now as f64;
        let records = vec![
            record("fresh", "text/plain", now - day),
            record("edge30", "text/plain", now - 30.0 * day),
            record("mid", "text/plain", now - 100.0 * day),
            record("edge180", "text/plain", now - 180.0 * day),
            record("future", "text/plain", now + day),
        ];

        let groups = cluster_by_age(&records, &config);
        let names = |label: &str| -> Vec<String> {
            groups[label].iter().map(|id| id.to_string()).collect()
        };

        assert_eq!(names("new(<30d)"), vec!["fresh", "future"]);
        assert_eq!(names("stale(30-180d)"), vec!["edge30", "mid"]);
        assert_eq!(names("old(>180d)"), vec!["edge180"]);
    }

    #[test]
    fn test_cluster_by_type_first_seen_order() {
        let records = vec![
            record("a", "text/plain", 0.0),
            record("b", "image/png", 0.0),
            record("c", "text/csv", 0.0),
        ];
        let groups = cluster_by_type(&records);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["text", "image"]);
        assert_eq!(groups["text"].len(), 2);
    }
}

//! Core types for raze.
//!
//! This crate provides the data structures shared by every stage of the
//! pipeline: per-file fingerprint records, the scanned inventory, coarse
//! content buckets, and scan configuration.

mod config;
mod error;
mod inventory;
mod record;

pub use config::{DEFAULT_MAX_HASH_SIZE, ScanConfig, ScanConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use inventory::{Inventory, InventoryStats};
pub use record::{Bucket, ContentHash, FileId, FileRecord, ParseHashError};

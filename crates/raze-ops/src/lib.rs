//! Plan execution for raze.
//!
//! This crate applies a [`Plan`](raze_plan::Plan) to a directory tree,
//! one item at a time:
//!
//! - moves go into `<root>/<Bucket>/<slug>/`, auto-renaming on collision
//! - deletes go into `<root>/.quarantine/<run>/`, never removed outright
//! - every item writes one line to an append-only NDJSON audit log
//!
//! Audit logs can be replayed backwards with [`PlanExecutor::restore`], and
//! old quarantine runs are removed with [`PlanExecutor::purge`].

mod audit;
mod conflict;
mod error;
mod executor;
mod move_op;
mod quarantine;
mod restore;

pub use audit::{AuditLog, AuditOp, AuditRecord, AuditStatus, AuditWriter};
pub use conflict::{
    auto_rename_path, auto_rename_with, available_path, available_path_with, quarantine_target,
    quarantine_target_with,
};
pub use error::ApplyError;
pub use executor::{
    ApplyOptions, ApplyOptionsBuilder, ApplyReport, DEFAULT_RETENTION_DAYS, PlanExecutor,
};
pub use move_op::move_file;
pub use quarantine::{
    AUDIT_PREFIX, PurgeReport, QUARANTINE_DIR, QuarantineArea, RESTORE_PREFIX, STAMP_FORMAT,
    parse_stamp, purge_expired, unique_stamp,
};

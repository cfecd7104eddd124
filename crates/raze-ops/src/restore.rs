//! Replaying an audit log backwards.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::audit::{AuditLog, AuditOp, AuditRecord, AuditStatus, AuditWriter};
use crate::error::ApplyError;
use crate::executor::ApplyReport;
use crate::move_op::move_file;

/// Move every file recorded as moved or quarantined back to its source.
///
/// Records are replayed newest first. A file is restored only when it is
/// still at its recorded destination and its original path is free.
pub(crate) fn restore_from_log(
    log: &Path,
    audit_path: &Path,
    dry_run: bool,
) -> Result<ApplyReport, ApplyError> {
    let records: Vec<AuditRecord> = AuditLog::read(log)?.collect::<Result<_, _>>()?;
    let mut audit = AuditWriter::create(audit_path)?;
    let mut report = ApplyReport {
        audit_path: audit_path.to_path_buf(),
        ..Default::default()
    };

    info!(log = %log.display(), records = records.len(), dry_run, "restoring from audit log");

    for record in records.iter().rev().filter(|r| r.is_reversible()) {
        let (Some(original), Some(current)) = (&record.src, &record.dst) else {
            continue;
        };
        let mut out = AuditRecord::new(AuditOp::Restore, AuditStatus::SkipNotFound, current)
            .with_dst(original);
        if let Some(reason) = &record.reason {
            out = out.with_reason(reason);
        }

        out.status = if !current.is_file() {
            debug!(path = %current.display(), "nothing to restore");
            AuditStatus::SkipNotFound
        } else if original.exists() {
            out = out.with_error("original path is occupied");
            AuditStatus::SkipError
        } else if dry_run {
            AuditStatus::DryRun
        } else {
            match move_file(current, original) {
                Ok(()) => AuditStatus::Restored,
                Err(e) => {
                    warn!(path = %current.display(), error = %e, "restore failed");
                    out = out.with_error(e);
                    AuditStatus::SkipError
                }
            }
        };

        report.count(out.status);
        audit.write(&out)?;
    }

    audit.finish()?;
    info!(
        restored = report.restored,
        not_found = report.not_found,
        errors = report.errors,
        "restore finished"
    );
    Ok(report)
}

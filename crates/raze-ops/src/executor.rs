//! Sequential plan executor with dry-run, quarantine, and audit trail.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use raze_plan::{Delete, Move, Plan};

use crate::audit::{AuditOp, AuditRecord, AuditStatus, AuditWriter};
use crate::conflict::{available_path_with, quarantine_target_with};
use crate::error::{ApplyError, check_root};
use crate::move_op::move_file;
use crate::quarantine::{
    AUDIT_PREFIX, PurgeReport, QuarantineArea, RESTORE_PREFIX, purge_expired, unique_stamp,
};
use crate::restore::restore_from_log;

/// Default days a quarantine run is kept.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Options for applying, restoring, and purging.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct ApplyOptions {
    /// Record what would happen without touching any file.
    #[builder(default)]
    pub dry_run: bool,

    /// Days a quarantine run is kept before purge removes it.
    #[builder(default = "DEFAULT_RETENTION_DAYS")]
    pub retention_days: u32,

    /// Folder for audit logs. Defaults to the apply root.
    #[builder(default)]
    pub audit_dir: Option<PathBuf>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            retention_days: DEFAULT_RETENTION_DAYS,
            audit_dir: None,
        }
    }
}

impl ApplyOptions {
    /// Create a new options builder.
    pub fn builder() -> ApplyOptionsBuilder {
        ApplyOptionsBuilder::default()
    }
}

/// Outcome counts of an apply or restore run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub moved: usize,
    pub quarantined: usize,
    pub restored: usize,
    pub dry_run: usize,
    pub not_found: usize,
    pub errors: usize,
    /// Audit log written by the run.
    pub audit_path: PathBuf,
    /// Quarantine folder, if the run created one.
    pub quarantine: Option<PathBuf>,
}

impl ApplyReport {
    pub(crate) fn count(&mut self, status: AuditStatus) {
        match status {
            AuditStatus::Moved => self.moved += 1,
            AuditStatus::Quarantined => self.quarantined += 1,
            AuditStatus::Restored => self.restored += 1,
            AuditStatus::DryRun => self.dry_run += 1,
            AuditStatus::SkipNotFound => self.not_found += 1,
            AuditStatus::SkipError => self.errors += 1,
            AuditStatus::Done => {}
        }
    }

    /// Items processed, excluding run metadata.
    pub fn total(&self) -> usize {
        self.moved + self.quarantined + self.restored + self.dry_run + self.not_found + self.errors
    }
}

/// Applies plans one item at a time.
///
/// Moves run first, then deletes. Nothing is ever removed outright: deletes
/// go to a quarantine folder that is created on the first real delete.
/// Every item produces exactly one audit record, and a run ends with a
/// `meta` record.
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
    options: ApplyOptions,
}

impl PlanExecutor {
    /// Create an executor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with custom options.
    pub fn with_options(options: ApplyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// Read a plan file and apply it under `root`.
    pub fn apply_file(&self, plan_path: &Path, root: &Path) -> Result<ApplyReport, ApplyError> {
        check_root(root)?;
        let plan = Plan::load(plan_path)?;
        self.apply(&plan, root)
    }

    /// Apply a plan under `root`.
    ///
    /// Only a bad root or a failing audit log abort the run; per-item
    /// problems are recorded and skipped.
    pub fn apply(&self, plan: &Plan, root: &Path) -> Result<ApplyReport, ApplyError> {
        check_root(root)?;
        let audit_dir = self.audit_dir(root);
        let stamp = unique_stamp(root, &audit_dir, AUDIT_PREFIX, Local::now());
        let audit_path = audit_dir.join(format!("{AUDIT_PREFIX}{stamp}.jsonl"));

        let mut run = Run {
            root,
            dry_run: self.options.dry_run,
            audit: AuditWriter::create(&audit_path)?,
            quarantine: QuarantineArea::new(root, &stamp),
            claimed: HashSet::new(),
            report: ApplyReport {
                audit_path,
                ..Default::default()
            },
        };

        info!(
            root = %root.display(),
            moves = plan.moves.len(),
            deletes = plan.deletes.len(),
            dry_run = self.options.dry_run,
            "applying plan"
        );

        for item in &plan.moves {
            run.apply_move(item)?;
        }
        for item in &plan.deletes {
            run.apply_delete(item)?;
        }

        let Run {
            mut audit,
            quarantine,
            mut report,
            ..
        } = run;
        audit.write(&AuditRecord::meta(quarantine.path(), self.options.retention_days))?;
        audit.finish()?;

        if quarantine.is_created() {
            report.quarantine = Some(quarantine.path().to_path_buf());
        }
        info!(
            moved = report.moved,
            quarantined = report.quarantined,
            dry_run = report.dry_run,
            not_found = report.not_found,
            errors = report.errors,
            "plan applied"
        );
        Ok(report)
    }

    /// Undo the moves and quarantines recorded in an audit log.
    ///
    /// The restore writes its own audit log next to the one it replays
    /// (or into the configured audit folder).
    pub fn restore(&self, audit_log: &Path) -> Result<ApplyReport, ApplyError> {
        let audit_dir = match &self.options.audit_dir {
            Some(dir) => dir.clone(),
            None => audit_log
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let stamp = unique_stamp(&audit_dir, &audit_dir, RESTORE_PREFIX, Local::now());
        let audit_path = audit_dir.join(format!("{RESTORE_PREFIX}{stamp}.jsonl"));
        restore_from_log(audit_log, &audit_path, self.options.dry_run)
    }

    /// Remove quarantine runs under `root` older than the retention window.
    pub fn purge(&self, root: &Path, now: DateTime<Local>) -> Result<PurgeReport, ApplyError> {
        purge_expired(root, self.options.retention_days, now, self.options.dry_run)
    }

    fn audit_dir(&self, root: &Path) -> PathBuf {
        self.options
            .audit_dir
            .clone()
            .unwrap_or_else(|| root.to_path_buf())
    }
}

/// State of one apply run.
struct Run<'a> {
    root: &'a Path,
    dry_run: bool,
    audit: AuditWriter,
    quarantine: QuarantineArea,
    /// Destinations handed out so far; a dry run never creates them.
    claimed: HashSet<PathBuf>,
    report: ApplyReport,
}

impl Run<'_> {
    fn is_taken(&self, path: &Path) -> bool {
        path.exists() || self.claimed.contains(path)
    }

    fn record(&mut self, record: AuditRecord) -> Result<(), ApplyError> {
        self.report.count(record.status);
        self.audit.write(&record)
    }

    fn apply_move(&mut self, item: &Move) -> Result<(), ApplyError> {
        let src = &item.from_path;
        let base = AuditRecord::new(AuditOp::Move, AuditStatus::SkipNotFound, src)
            .with_reason(&item.reason);

        if !src.is_file() {
            debug!(src = %src.display(), "move source missing");
            return self.record(base);
        }

        let Some(folder) = safe_relative(&item.to_folder) else {
            warn!(to = %item.to_folder, "move destination escapes the root");
            return self.record(with_status(base, AuditStatus::SkipError).with_error(format!(
                "destination folder outside root: {}",
                item.to_folder
            )));
        };
        let Some(name) = src.file_name() else {
            return self.record(with_status(base, AuditStatus::SkipError).with_error("no file name"));
        };

        let wanted = self.root.join(folder).join(name);
        if wanted == *src {
            return self.record(
                with_status(base, AuditStatus::SkipError)
                    .with_dst(&wanted)
                    .with_error("already at destination"),
            );
        }
        let dst = available_path_with(&wanted, &|p: &Path| self.is_taken(p));
        self.claimed.insert(dst.clone());

        if self.dry_run {
            return self.record(with_status(base, AuditStatus::DryRun).with_dst(dst));
        }

        match move_file(src, &dst) {
            Ok(()) => self.record(with_status(base, AuditStatus::Moved).with_dst(dst)),
            Err(e) => {
                warn!(src = %src.display(), dst = %dst.display(), error = %e, "move failed");
                self.record(
                    with_status(base, AuditStatus::SkipError)
                        .with_dst(dst)
                        .with_error(e),
                )
            }
        }
    }

    fn apply_delete(&mut self, item: &Delete) -> Result<(), ApplyError> {
        let src = &item.path;
        let base = AuditRecord::new(AuditOp::Delete, AuditStatus::SkipNotFound, src)
            .with_reason(item.reason.to_string());

        if !src.is_file() {
            debug!(src = %src.display(), "delete source missing");
            return self.record(base);
        }
        let Some(name) = src.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return self.record(with_status(base, AuditStatus::SkipError).with_error("no file name"));
        };
        let short_id = item.file_id.short().to_string();

        if self.dry_run {
            let dst = quarantine_target_with(self.quarantine.path(), &name, &short_id, &|p: &Path| {
                self.is_taken(p)
            });
            self.claimed.insert(dst.clone());
            return self.record(with_status(base, AuditStatus::DryRun).with_dst(dst));
        }

        let dir = match self.quarantine.ensure().map(Path::to_path_buf) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "cannot create quarantine area");
                return self.record(with_status(base, AuditStatus::SkipError).with_error(e));
            }
        };
        let dst = quarantine_target_with(&dir, &name, &short_id, &|p: &Path| self.is_taken(p));
        self.claimed.insert(dst.clone());

        match move_file(src, &dst) {
            Ok(()) => self.record(with_status(base, AuditStatus::Quarantined).with_dst(dst)),
            Err(e) => {
                warn!(src = %src.display(), error = %e, "quarantine failed");
                self.record(
                    with_status(base, AuditStatus::SkipError)
                        .with_dst(dst)
                        .with_error(e),
                )
            }
        }
    }
}

fn with_status(mut record: AuditRecord, status: AuditStatus) -> AuditRecord {
    record.status = status;
    record
}

/// A plan folder as a path confined to the root.
///
/// Leading separators are dropped; `..` and absolute prefixes are refused.
fn safe_relative(folder: &str) -> Option<PathBuf> {
    let trimmed = folder.trim_start_matches(['/', '\\']);
    let path = Path::new(trimmed);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

//! Reorganization plans for raze.
//!
//! A [`Plan`] is a pure value built from the scanned records, the detector
//! output, and the category assignments. It lists:
//!
//! - **moves** of every categorized file into `<Bucket>/<slug>/`
//! - **deletes** of redundant duplicates and temp files, to be quarantined
//! - **costs** per category when a storage rate is given
//!
//! Plans round-trip through JSON so they can be reviewed before applying.

mod builder;
mod error;
mod options;
mod plan;

pub use builder::{build_plan, slugify};
pub use error::PlanError;
pub use options::{DEFAULT_TEMP_SUFFIXES, PlanOptions, PlanOptionsBuilder};
pub use plan::{CostEntry, Delete, DeleteReason, Move, Plan, PlanSummary};

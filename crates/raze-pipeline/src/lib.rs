//! End-to-end organize pipeline for raze.
//!
//! A run scans a root, finds exact and near duplicates, asks the classifier
//! for categories, and produces three artifacts: a node/edge graph, keyed
//! text summaries, and a reviewable plan. Nothing on disk changes until the
//! plan is handed to [`raze_ops::PlanExecutor`].
//!
//! ```rust,ignore
//! use raze_pipeline::{RazeConfig, run_pipeline};
//!
//! let config = RazeConfig::load(None)?;
//! let output = run_pipeline("/data/inbox".as_ref(), config)?;
//! output.write_to("out".as_ref())?;
//! println!("{} moves, {} deletes", output.plan.moves.len(), output.plan.deletes.len());
//! ```

mod analysis;
mod config;
mod error;
pub mod graph;
mod pipeline;
pub mod summary;

pub use analysis::Analysis;
pub use config::{API_KEY_ENV, RazeConfig, ScanSettings};
pub use error::PipelineError;
pub use graph::{Edge, Graph, Node, Reasoning, build_graph};
pub use pipeline::{
    ArtifactPaths, GRAPH_FILE, PLAN_FILE, Pipeline, RunOutput, SUMMARIES_FILE, run_pipeline,
};
pub use summary::build_summaries;

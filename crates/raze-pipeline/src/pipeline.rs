//! The organize pipeline: scan, detect, classify, plan.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use raze_analyze::{
    AgeConfig, ExcerptSource, PlainTextExcerpts, SimilarityDetector, cluster_by_age,
    cluster_by_type,
};
use raze_classify::{CategoryMerger, Classifier};
use raze_core::{InventoryStats, ScanWarning};
use raze_plan::{Plan, build_plan};
use raze_scan::FingerprintScanner;

use crate::analysis::Analysis;
use crate::config::RazeConfig;
use crate::error::PipelineError;
use crate::graph::{Graph, build_graph};
use crate::summary::build_summaries;

pub const GRAPH_FILE: &str = "graph.json";
pub const PLAN_FILE: &str = "plan.json";
pub const SUMMARIES_FILE: &str = "summaries.json";

/// Result of one organize run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    pub graph: Graph,
    pub summaries: IndexMap<String, String>,
    pub plan: Plan,
    pub analysis: Analysis,
    pub stats: InventoryStats,
    /// Per-file problems met while scanning.
    pub warnings: Vec<ScanWarning>,
}

/// Where [`RunOutput::write_to`] put the artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub graph: PathBuf,
    pub plan: PathBuf,
    pub summaries: PathBuf,
}

impl RunOutput {
    /// Write `graph.json`, `plan.json` and `summaries.json` into `out_dir`.
    pub fn write_to(&self, out_dir: &Path) -> Result<ArtifactPaths, PipelineError> {
        fs::create_dir_all(out_dir).map_err(|e| PipelineError::write(out_dir, e))?;

        let paths = ArtifactPaths {
            graph: out_dir.join(GRAPH_FILE),
            plan: out_dir.join(PLAN_FILE),
            summaries: out_dir.join(SUMMARIES_FILE),
        };
        write_json(&paths.graph, &self.graph)?;
        self.plan.save(&paths.plan)?;
        write_json(&paths.summaries, &self.summaries)?;
        Ok(paths)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| PipelineError::write(path, e))
}

/// Runs the whole organize flow for one configuration.
pub struct Pipeline {
    config: RazeConfig,
    merger: CategoryMerger,
    excerpts: Box<dyn ExcerptSource>,
}

impl Pipeline {
    /// Create a pipeline.
    ///
    /// Fails when the classifier is only partly configured or its HTTP
    /// client cannot be built.
    pub fn new(config: RazeConfig) -> Result<Self, PipelineError> {
        let merger = CategoryMerger::new(config.classifier.clone())?;
        Ok(Self {
            config,
            merger,
            excerpts: Box::new(PlainTextExcerpts::new()),
        })
    }

    /// Create a pipeline with a custom classifier.
    pub fn with_classifier(config: RazeConfig, classifier: Box<dyn Classifier>) -> Self {
        let merger = CategoryMerger::with_classifier(config.classifier.clone(), classifier);
        Self {
            config,
            merger,
            excerpts: Box::new(PlainTextExcerpts::new()),
        }
    }

    /// Replace the excerpt source.
    pub fn with_excerpts(mut self, excerpts: Box<dyn ExcerptSource>) -> Self {
        self.excerpts = excerpts;
        self
    }

    pub fn config(&self) -> &RazeConfig {
        &self.config
    }

    /// Run against `root` with a fresh scanner.
    pub fn run(&self, root: &Path) -> Result<RunOutput, PipelineError> {
        self.run_with_scanner(&FingerprintScanner::new(), root)
    }

    /// Run against `root` using `scanner`, so callers can subscribe to
    /// its progress first.
    ///
    /// Only an unusable root is fatal. Classifier trouble degrades to
    /// uncategorized files and unreadable files become warnings.
    pub fn run_with_scanner(
        &self,
        scanner: &FingerprintScanner,
        root: &Path,
    ) -> Result<RunOutput, PipelineError> {
        let start = Instant::now();
        let scan_config = self.config.scan.to_scan_config(root)?;
        let inventory = scanner.scan(&scan_config)?;
        let records = &inventory.records;
        if inventory.has_warnings() {
            warn!(count = inventory.warnings.len(), "scan finished with warnings");
        }

        let detector = SimilarityDetector::with_config(self.config.similarity.clone());
        let text = detector.scan_text(records, self.excerpts.as_ref());
        let images = detector.image_fingerprints(records);
        let detections = detector.detect(records, &text.fingerprints, &images);
        info!(
            exact = detections.exact.group_count,
            text = detections.text.len(),
            image = detections.image.len(),
            "detection complete"
        );

        let assignments = self.merger.classify_all(records, &text.excerpts);
        info!(
            categories = assignments.len(),
            classifier = self.merger.has_classifier(),
            "classification complete"
        );

        let analysis = Analysis {
            detections,
            types: cluster_by_type(records),
            ages: cluster_by_age(records, &AgeConfig::default()),
            assignments,
            excerpts: text.excerpts,
        };
        let summaries = build_summaries(records, &analysis);

        let mut options = self.config.plan.clone();
        options.elapsed = Some(start.elapsed());
        let plan = build_plan(records, &analysis.detections, &analysis.assignments, &options);
        let graph = build_graph(records, &analysis, &summaries, &self.config.similarity);

        info!(
            files = records.len(),
            moves = plan.moves.len(),
            deletes = plan.deletes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "organize complete"
        );

        Ok(RunOutput {
            root: inventory.root.clone(),
            graph,
            summaries,
            plan,
            analysis,
            stats: inventory.stats.clone(),
            warnings: inventory.warnings.clone(),
        })
    }
}

/// Build a pipeline from `config` and run it against `root`.
pub fn run_pipeline(root: &Path, config: RazeConfig) -> Result<RunOutput, PipelineError> {
    Pipeline::new(config)?.run(root)
}

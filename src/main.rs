//! raze - find duplicates, categorize, and safely reorganize a directory.
//!
//! Usage:
//!   raze organize [PATH]        Scan and write graph, summaries and plan
//!   raze apply PLAN --root DIR  Apply a reviewed plan
//!   raze restore AUDIT          Undo an applied plan from its audit log
//!   raze purge [ROOT]           Remove expired quarantine runs
//!   raze --help                 Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use raze_ops::{ApplyOptions, ApplyReport, PlanExecutor, PurgeReport};
use raze_pipeline::{Pipeline, RazeConfig};

#[derive(Parser)]
#[command(
    name = "raze",
    version,
    about = "Find duplicates, categorize, and safely reorganize a directory",
    long_about = "raze scans a directory, finds exact and near duplicates, groups files into \
                  content categories, and writes a reviewable plan.\n\n\
                  Nothing is touched until the plan is applied. Deletions go to a \
                  quarantine folder and every action is recorded in an audit log \
                  that `raze restore` can replay backwards."
)]
struct Cli {
    /// Config file (defaults to <config dir>/raze/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and write graph.json, plan.json and summaries.json
    Organize {
        /// Directory to organize
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output directory for the artifacts
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Classifier endpoint (OpenAI-compatible chat completions)
        #[arg(long)]
        endpoint: Option<String>,

        /// Classifier model name
        #[arg(long)]
        model: Option<String>,

        /// Classifier API key (also read from RAZE_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Storage price per GiB per month, for cost estimates
        #[arg(long)]
        rate: Option<f64>,
    },

    /// Apply a plan under a root directory
    Apply {
        /// Plan file written by `raze organize`
        plan: PathBuf,

        /// Directory the plan was built for
        #[arg(short, long)]
        root: PathBuf,

        /// Record what would happen without touching any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Days to keep quarantined files
        #[arg(long)]
        retention_days: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Undo the moves and quarantines recorded in an audit log
    Restore {
        /// Audit log written by `raze apply`
        audit: PathBuf,

        /// Record what would happen without touching any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove quarantine runs older than the retention window
    Purge {
        /// Root whose quarantine folder is purged
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Days to keep quarantined files
        #[arg(long)]
        retention_days: Option<u32>,

        /// List expired runs without removing them
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("raze=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RazeConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Organize {
            path,
            out,
            endpoint,
            model,
            api_key,
            rate,
        } => {
            let mut config = config;
            if endpoint.is_some() {
                config.classifier.endpoint = endpoint;
            }
            if model.is_some() {
                config.classifier.model = model;
            }
            config.apply_api_key(api_key);
            if let Some(rate) = rate {
                config.plan.storage_rate_per_gb = rate;
            }
            run_organize(&path, &out, config)?;
        }
        Command::Apply {
            plan,
            root,
            dry_run,
            retention_days,
            format,
        } => {
            let options = apply_options(&config, dry_run, retention_days);
            let report = PlanExecutor::with_options(options)
                .apply_file(&plan, &root)
                .with_context(|| format!("Failed to apply {}", plan.display()))?;
            print_report("Apply", &report, format)?;
        }
        Command::Restore {
            audit,
            dry_run,
            format,
        } => {
            let options = apply_options(&config, dry_run, None);
            let report = PlanExecutor::with_options(options)
                .restore(&audit)
                .with_context(|| format!("Failed to restore from {}", audit.display()))?;
            print_report("Restore", &report, format)?;
        }
        Command::Purge {
            root,
            retention_days,
            dry_run,
            format,
        } => {
            let options = apply_options(&config, dry_run, retention_days);
            let report = PlanExecutor::with_options(options)
                .purge(&root, chrono::Local::now())
                .with_context(|| format!("Failed to purge {}", root.display()))?;
            print_purge(&report, format)?;
        }
    }

    Ok(())
}

/// Run the pipeline and write its artifacts.
fn run_organize(path: &Path, out: &Path, config: RazeConfig) -> Result<()> {
    let pipeline = Pipeline::new(config).context("Invalid classifier configuration")?;

    eprintln!("Organizing {}...", path.display());
    let output = pipeline.run(path).context("Organize failed")?;
    let paths = output
        .write_to(out)
        .with_context(|| format!("Failed to write artifacts to {}", out.display()))?;

    let summary = &output.plan.summary;
    let exact = &output.analysis.detections.exact;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        output.root.display(),
        format_size(output.stats.total_size)
    );
    println!(
        " {} files, {} hashed",
        summary.files_scanned, output.stats.hashed_files
    );
    if let Some(elapsed) = summary.elapsed_sec {
        println!(" Organized in {elapsed:.2}s");
    }
    println!("{}", "─".repeat(60));
    println!();
    println!(
        " Exact duplicates:   {} groups, {} wasted",
        summary.duplicate_clusters,
        format_size(exact.total_wasted_space)
    );
    println!(" Near-duplicate text: {} clusters", summary.near_duplicate_clusters);
    println!(" Similar images:     {} clusters", summary.image_similarity_clusters);
    println!(" Categories:         {}", output.analysis.assignments.len());
    println!();
    println!(
        " Plan: {} moves, {} deletes",
        summary.suggested_moves, summary.suggested_deletions
    );

    if !output.plan.cluster_costs.is_empty() {
        let monthly: f64 = output
            .plan
            .cluster_costs
            .values()
            .map(|c| c.estimated_monthly_cost)
            .sum();
        println!(
            " Estimated storage cost: {monthly:.2}/month at {}/GiB",
            summary.storage_rate_per_gb
        );
    }

    println!();
    println!(" Wrote {}", paths.graph.display());
    println!(" Wrote {}", paths.plan.display());
    println!(" Wrote {}", paths.summaries.display());

    if !output.warnings.is_empty() {
        println!();
        println!("{} warning(s) during scan", output.warnings.len());
    }

    Ok(())
}

/// Config-file apply options with command-line overrides.
fn apply_options(config: &RazeConfig, dry_run: bool, retention_days: Option<u32>) -> ApplyOptions {
    let mut options = config.apply.clone();
    options.dry_run |= dry_run;
    if let Some(days) = retention_days {
        options.retention_days = days;
    }
    options
}

fn print_report(title: &str, report: &ApplyReport, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(report);
    }

    println!();
    println!("{}", "─".repeat(60));
    println!(" {title} Report");
    println!("{}", "─".repeat(60));
    println!();
    println!(" Moved:        {}", report.moved);
    println!(" Quarantined:  {}", report.quarantined);
    println!(" Restored:     {}", report.restored);
    println!(" Dry run:      {}", report.dry_run);
    println!(" Not found:    {}", report.not_found);
    println!(" Errors:       {}", report.errors);
    println!();
    println!(" Audit log: {}", report.audit_path.display());
    if let Some(quarantine) = &report.quarantine {
        println!(" Quarantine: {}", quarantine.display());
    }

    Ok(())
}

fn print_purge(report: &PurgeReport, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(report);
    }

    println!();
    if report.expired.is_empty() && report.failed.is_empty() {
        println!(" No expired quarantine runs ({} kept).", report.kept);
        return Ok(());
    }

    let verb = if report.dry_run { "Would remove" } else { "Removed" };
    for path in &report.expired {
        println!(" {verb} {}", path.display());
    }
    for path in &report.failed {
        println!(" Failed to remove {}", path.display());
    }
    println!();
    println!(
        " {} expired, {} kept, {} ignored",
        report.expired.len() + report.failed.len(),
        report.kept,
        report.ignored.len()
    );

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

/// Format a byte size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

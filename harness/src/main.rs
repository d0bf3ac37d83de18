//! Listing-search harness CLI.
//!
//! Synthesizes the task prompt handed to the agent orchestrator, bootstraps the
//! per-run log folder, and records validated run metrics afterwards.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::debug;

use harness::core::synth::Cardinality;
use harness::error::{MetricsError, QueryError};
use harness::exit_codes;
use harness::io::config::{HarnessConfig, load_config};
use harness::io::metrics::apply_updates;
use harness::io::run_log::{RunLogRequest, init_run_log};
use harness::logging;

#[derive(Parser)]
#[command(
    name = "harness",
    version,
    about = "Task prompt synthesis and run-metrics validation for listing searches"
)]
struct Cli {
    /// Optional TOML config overriding the catalog, phrases, and failure reasons.
    #[arg(long, global = true, default_value = "harness.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the synthesized prompt for a catalog entry.
    Query {
        #[command(flatten)]
        task: TaskArgs,
    },
    /// List difficulty tiers and their indexed templates.
    Catalog,
    /// Validate and apply updates to a run's metrics JSON document.
    Metrics {
        /// Path to the metrics document.
        path: PathBuf,
        /// `key=value` update; value is parsed as JSON, falling back to a string.
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_update)]
        updates: Vec<Update>,
    },
    /// Create a run log folder with its initialization entry and print the prompt.
    InitRun {
        /// Directory under which the run folder is created.
        #[arg(long)]
        logs_dir: PathBuf,
        /// Run in human-in-the-loop mode.
        #[arg(long)]
        hil_mode: bool,
        /// Save additional browser screenshots.
        #[arg(long)]
        save_screenshots: bool,
        #[command(flatten)]
        task: TaskArgs,
    },
}

#[derive(clap::Args)]
struct TaskArgs {
    /// Difficulty tier (e.g. `easy`, `advanced`).
    #[arg(long)]
    difficulty: String,
    /// Index of the template within the tier.
    #[arg(long, default_value_t = 0)]
    id_query: usize,
    /// Number of listings to find, or `none`.
    #[arg(long, value_parser = parse_count)]
    num_listings: Option<Count>,
    /// Number of websites to search, or `none`.
    #[arg(long, value_parser = parse_count)]
    num_websites: Option<Count>,
}

impl TaskArgs {
    fn cardinality(&self) -> Cardinality {
        Cardinality::new(
            self.num_listings.and_then(|count| count.0),
            self.num_websites.and_then(|count| count.0),
        )
    }
}

/// A count argument; `none` means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Count(Option<u32>);

#[derive(Debug, Clone, PartialEq)]
struct Update {
    key: String,
    value: Value,
}

fn parse_count(raw: &str) -> Result<Count, String> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(Count(None));
    }
    raw.parse::<u32>()
        .map(|n| Count(Some(n)))
        .map_err(|err| format!("expected a non-negative integer or 'none': {err}"))
}

fn parse_update(raw: &str) -> Result<Update, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok(Update {
        key: key.trim().to_string(),
        value,
    })
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<QueryError>().is_some() {
        return exit_codes::REJECTED;
    }
    match err.downcast_ref::<MetricsError>() {
        Some(metrics) if metrics.is_rejection() => exit_codes::REJECTED,
        _ => exit_codes::INVALID,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).context("load config")?;
    debug!(config = %cli.config.display(), "config loaded");
    match cli.command {
        Command::Query { task } => cmd_query(&config, &task),
        Command::Catalog => cmd_catalog(&config),
        Command::Metrics { path, updates } => cmd_metrics(&config, path, updates),
        Command::InitRun {
            logs_dir,
            hil_mode,
            save_screenshots,
            task,
        } => cmd_init_run(&config, logs_dir, hil_mode, save_screenshots, &task),
    }
}

fn cmd_query(config: &HarnessConfig, task: &TaskArgs) -> Result<()> {
    let prompt = config
        .synthesizer()
        .synthesize(task.cardinality(), &task.difficulty, task.id_query)?;
    println!("{prompt}");
    Ok(())
}

fn cmd_catalog(config: &HarnessConfig) -> Result<()> {
    for (tier, templates) in config.catalog.tiers() {
        println!("{tier}:");
        for (idx, template) in templates.iter().enumerate() {
            println!("  {idx}: {template}");
        }
    }
    Ok(())
}

fn cmd_metrics(config: &HarnessConfig, path: PathBuf, updates: Vec<Update>) -> Result<()> {
    if updates.is_empty() {
        bail!("no updates given; pass at least one --set KEY=VALUE");
    }
    let updates: Map<String, Value> = updates
        .into_iter()
        .map(|update| (update.key, update.value))
        .collect();
    let result = apply_updates(&path, &updates, &config.failure_reasons)?;
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    let rendered =
        serde_json::to_string_pretty(&result.document).context("render metrics document")?;
    println!("{rendered}");
    Ok(())
}

fn cmd_init_run(
    config: &HarnessConfig,
    logs_dir: PathBuf,
    hil_mode: bool,
    save_screenshots: bool,
    task: &TaskArgs,
) -> Result<()> {
    let cardinality = task.cardinality();
    let query = config
        .synthesizer()
        .synthesize(cardinality, &task.difficulty, task.id_query)?;
    let paths = init_run_log(&RunLogRequest {
        logs_dir: &logs_dir,
        difficulty: &task.difficulty,
        id_query: task.id_query,
        cardinality,
        hil_mode,
        save_screenshots,
        query: &query,
        started_at: Local::now().naive_local(),
    })?;
    println!("Generated Query: {query}");
    println!("{}", paths.dir.display());
    Ok(())
}

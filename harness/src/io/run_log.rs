//! Per-run log folder and its `log.jsonl` initialization entry.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::core::synth::Cardinality;

const FOLDER_PREFIX: &str = "vision_magnetic";
const LOG_FILE: &str = "log.jsonl";

/// `vision_magnetic_{difficulty}_{id:02}_{YYYYMMDDHHMMSS}`.
pub fn run_folder_name(difficulty: &str, id_query: usize, started_at: NaiveDateTime) -> String {
    format!(
        "{FOLDER_PREFIX}_{difficulty}_{id_query:02}_{}",
        started_at.format("%Y%m%d%H%M%S")
    )
}

#[derive(Debug, Clone)]
pub struct RunLogPaths {
    pub dir: PathBuf,
    pub log_path: PathBuf,
}

impl RunLogPaths {
    pub fn new(logs_dir: &Path, folder_name: &str) -> Self {
        let dir = logs_dir.join(folder_name);
        Self {
            log_path: dir.join(LOG_FILE),
            dir,
        }
    }
}

/// Arguments recorded in the initialization entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunArguments {
    pub logs_dir: String,
    pub hil_mode: bool,
    pub save_screenshots: bool,
    pub folder_name: String,
    pub difficulty: String,
    pub id_query: usize,
    pub query_num_listings: Option<u32>,
    pub query_num_websites: Option<u32>,
}

/// First line of `log.jsonl`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InitializationEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub arguments: RunArguments,
    pub query: String,
}

pub struct RunLogRequest<'a> {
    pub logs_dir: &'a Path,
    pub difficulty: &'a str,
    pub id_query: usize,
    pub cardinality: Cardinality,
    pub hil_mode: bool,
    pub save_screenshots: bool,
    pub query: &'a str,
    pub started_at: NaiveDateTime,
}

/// Create the run folder and write a fresh `log.jsonl` holding one
/// initialization entry.
pub fn init_run_log(request: &RunLogRequest<'_>) -> Result<RunLogPaths> {
    let folder_name = run_folder_name(request.difficulty, request.id_query, request.started_at);
    let paths = RunLogPaths::new(request.logs_dir, &folder_name);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create run dir {}", paths.dir.display()))?;

    let entry = InitializationEntry {
        timestamp: request
            .started_at
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
        kind: "Initialization",
        arguments: RunArguments {
            logs_dir: request.logs_dir.display().to_string(),
            hil_mode: request.hil_mode,
            save_screenshots: request.save_screenshots,
            folder_name: paths.dir.display().to_string(),
            difficulty: request.difficulty.to_string(),
            id_query: request.id_query,
            query_num_listings: request.cardinality.num_listings,
            query_num_websites: request.cardinality.num_websites,
        },
        query: request.query.to_string(),
    };
    let mut line = serde_json::to_string(&entry).context("serialize initialization entry")?;
    line.push('\n');
    fs::write(&paths.log_path, line)
        .with_context(|| format!("write {}", paths.log_path.display()))?;

    debug!(dir = %paths.dir.display(), "run log initialized");
    Ok(paths)
}

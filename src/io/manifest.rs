//! Run manifest: a JSON sidecar describing how a results CSV was produced.
//!
//! It records the resolved configuration (including the RNG seed actually
//! used), the dataset summary, and how many fits failed to converge, so a
//! results file can be reproduced or audited later.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AggregateRow, SimConfig};
use crate::error::AppError;
use crate::io::ingest::DatasetStats;

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub config: SimConfig,
    pub dataset: DatasetStats,
    pub results_path: PathBuf,
    pub n_result_rows: usize,
    pub unconverged_sim: usize,
    pub unconverged_sep: usize,
}

impl RunManifest {
    pub fn new(config: &SimConfig, seed: u64, dataset: DatasetStats, rows: &[AggregateRow]) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            seed,
            config: config.clone(),
            dataset,
            results_path: config.results_path(),
            n_result_rows: rows.len(),
            unconverged_sim: rows.iter().map(|r| r.unconverged_sim).sum(),
            unconverged_sep: rows.iter().map(|r| r.unconverged_sep).sum(),
        }
    }
}

/// Write the manifest as pretty JSON.
pub fn write_run_manifest(path: &Path, manifest: &RunManifest) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)
            .map_err(|e| AppError::input(format!("Failed to create output dir '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create manifest '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, manifest)
        .map_err(|e| AppError::input(format!("Failed to write manifest JSON: {e}")))?;

    Ok(())
}

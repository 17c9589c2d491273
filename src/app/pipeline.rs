//! The simulation pipeline: load → grid sweep → write.
//!
//! Kept separate from argument parsing and printing so that the whole run is
//! testable without spawning a process.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::domain::{AggregateRow, Dataset, SimConfig};
use crate::error::AppError;
use crate::io::{DatasetStats, OutputBatch, RunManifest, load_dataset, write_results_csv, write_run_manifest};
use crate::math::LevenbergMarquardt;
use crate::sim::run_grid;

/// All outputs of one `stepsim` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Seed actually used (drawn from entropy if none was configured).
    pub seed: u64,
    pub stats: DatasetStats,
    pub rows: Vec<AggregateRow>,
    pub results_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// Load the configured dataset and run the full study.
pub fn run_simulation(config: &SimConfig) -> Result<RunOutput, AppError> {
    config.validate()?;
    let dataset = load_dataset(&config.data_path)?;
    run_with_dataset(config, &dataset)
}

/// Run the full study on an already loaded dataset.
pub fn run_with_dataset(config: &SimConfig, dataset: &Dataset) -> Result<RunOutput, AppError> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let stats = DatasetStats::from_dataset(dataset);
    info!(
        seed,
        rows = stats.n_rows,
        subsets = stats.n_subsets,
        alpha = config.alpha,
        beta = config.beta,
        "starting simulation"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let minimizer = LevenbergMarquardt::default();
    let rows = run_grid(dataset, config, &minimizer, &mut rng)?;

    let results_path = config.results_path();
    let manifest_path = config.manifest_path();
    let manifest = RunManifest::new(config, seed, stats.clone(), &rows);

    // Neither file appears unless both were written.
    let mut outputs = OutputBatch::new();
    write_results_csv(&outputs.stage(&results_path), &rows)?;
    write_run_manifest(&outputs.stage(&manifest_path), &manifest)?;
    outputs.commit()?;

    info!(
        results = %results_path.display(),
        rows = rows.len(),
        unconverged_sim = manifest.unconverged_sim,
        unconverged_sep = manifest.unconverged_sep,
        "wrote results"
    );

    Ok(RunOutput {
        seed,
        stats,
        rows,
        results_path,
        manifest_path,
    })
}

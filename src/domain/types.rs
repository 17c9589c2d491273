//! Shared domain types.
//!
//! These types are kept plain and serializable so they can be:
//!
//! - threaded through the simulation pipeline
//! - exported to CSV (aggregate rows) and JSON (run manifest)
//! - read back for comparisons

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::linspace;

/// Host-mass threshold (log solar masses) of the step function.
pub const MASS_STEP_THRESHOLD: f64 = 10.0;

/// One supernova from the input table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Categorical group id (CSV column `set`).
    pub subset: String,
    /// Light-curve stretch.
    pub x1: f64,
    /// Light-curve color.
    pub c: f64,
    /// Host galaxy log-mass.
    pub mass: f64,
    /// Distance modulus as read from the file. Never used for fitting; every
    /// trial synthesizes its own response.
    pub mu: Option<f64>,
}

/// Row indices belonging to one subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subset {
    pub name: String,
    pub rows: Vec<usize>,
}

/// Owned observation table partitioned into subsets.
///
/// Subsets are listed in order of first appearance in `rows`.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Observation>,
    subsets: Vec<Subset>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<Observation>) -> Result<Self, AppError> {
        if rows.is_empty() {
            return Err(AppError::new(3, "Dataset has no rows."));
        }

        let mut subsets: Vec<Subset> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            match subsets.iter_mut().find(|s| s.name == row.subset) {
                Some(subset) => subset.rows.push(idx),
                None => subsets.push(Subset {
                    name: row.subset.clone(),
                    rows: vec![idx],
                }),
            }
        }

        Ok(Self { rows, subsets })
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ground-truth parameters of the generative model for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Truth {
    pub mag: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub sig_int: f64,
}

impl Truth {
    pub fn validate(&self) -> Result<(), AppError> {
        let all_finite = [self.mag, self.alpha, self.beta, self.gamma, self.sig_int]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(AppError::input(format!("Truth parameters must be finite: {self:?}")));
        }
        if self.sig_int < 0.0 {
            return Err(AppError::input(format!(
                "Intrinsic scatter must be >= 0, got {}.",
                self.sig_int
            )));
        }
        Ok(())
    }
}

/// Best-fit values of the full standardization model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StandardizationParams {
    pub mag: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Best-fit values of the linear (no step) model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearParams {
    pub mag: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// The (gamma, sig_int) truth grid swept for a fixed (alpha, beta).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthGrid {
    pub gammas: Vec<f64>,
    pub sig_ints: Vec<f64>,
}

impl Default for TruthGrid {
    fn default() -> Self {
        Self {
            gammas: linspace(-0.1, 0.1, 3),
            sig_ints: linspace(0.0, 0.1, 3),
        }
    }
}

impl TruthGrid {
    /// Cells in sweep order: gamma outer, sig_int inner.
    pub fn cells(&self) -> Vec<(f64, f64)> {
        self.gammas
            .iter()
            .flat_map(|&g| self.sig_ints.iter().map(move |&s| (g, s)))
            .collect()
    }
}

/// Resolved configuration for one `stepsim` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub alpha: f64,
    pub beta: f64,
    pub mag: f64,
    pub nsims: usize,
    pub data_path: PathBuf,
    pub out_dir: PathBuf,
    /// RNG seed. `None` means "draw one from entropy"; the drawn seed is
    /// recorded in the manifest.
    pub seed: Option<u64>,
    /// Abort on the first fit whose minimizer did not converge.
    pub strict: bool,
    /// Skip the terminal summary.
    pub quiet: bool,
    pub grid: TruthGrid,
}

impl SimConfig {
    /// Output file stem: `<alpha>_<beta>`.
    pub fn result_stem(&self) -> String {
        format!("{}_{}", self.alpha, self.beta)
    }

    pub fn results_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.csv", self.result_stem()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.json", self.result_stem()))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.nsims == 0 {
            return Err(AppError::input("--nsims must be > 0."));
        }
        if self.grid.gammas.is_empty() || self.grid.sig_ints.is_empty() {
            return Err(AppError::input("Truth grid must have at least one cell."));
        }
        for (gamma, sig_int) in self.grid.cells() {
            self.truth(gamma, sig_int).validate()?;
        }
        Ok(())
    }

    /// Truth parameters for one grid cell.
    pub fn truth(&self, gamma: f64, sig_int: f64) -> Truth {
        Truth {
            mag: self.mag,
            alpha: self.alpha,
            beta: self.beta,
            gamma,
            sig_int,
        }
    }
}

/// Resolved configuration for `stepsim-scripts`.
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    pub alphas: Vec<f64>,
    pub betas: Vec<f64>,
    pub nsims: usize,
    pub script_dir: PathBuf,
    pub log_dir: PathBuf,
    pub workdir: PathBuf,
    pub sim_command: String,
    /// Seconds to sleep between `qsub` calls (0 disables).
    pub submit_delay: u64,
}

/// One aggregate result row: truth values plus mean/std of each recovered
/// parameter under the joint (`_sim`) and sequential (`_sep`) fits.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub subset: String,
    pub nsims: usize,

    pub mag: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub sig_int: f64,

    pub mag_sim: f64,
    pub mag_sep: f64,
    pub mag_sim_err: f64,
    pub mag_sep_err: f64,

    pub alpha_sim: f64,
    pub alpha_sep: f64,
    pub alpha_sim_err: f64,
    pub alpha_sep_err: f64,

    pub beta_sim: f64,
    pub beta_sep: f64,
    pub beta_sim_err: f64,
    pub beta_sep_err: f64,

    pub gamma_sim: f64,
    pub gamma_sep: f64,
    pub gamma_sim_err: f64,
    pub gamma_sep_err: f64,

    pub sig_int_sim: f64,
    pub sig_int_sep: f64,
    pub sig_int_sim_err: f64,
    pub sig_int_sep_err: f64,

    /// Trials whose joint fit did not converge.
    pub unconverged_sim: usize,
    /// Trials whose sequential fit (either stage) did not converge.
    pub unconverged_sep: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(subset: &str) -> Observation {
        Observation {
            subset: subset.to_string(),
            x1: 0.0,
            c: 0.0,
            mass: 10.0,
            mu: None,
        }
    }

    #[test]
    fn subsets_keep_first_appearance_order() {
        let ds = Dataset::from_rows(vec![obs("b"), obs("a"), obs("b"), obs("c")]).unwrap();
        let names: Vec<&str> = ds.subsets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(ds.subsets()[0].rows, vec![0, 2]);
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = Dataset::from_rows(Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn default_grid_is_three_by_three() {
        let grid = TruthGrid::default();
        let cells = grid.cells();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], (-0.1, 0.0));
        assert_eq!(cells[1], (-0.1, 0.05));
        assert_eq!(cells[8], (0.1, 0.1));
    }

    #[test]
    fn negative_scatter_is_rejected() {
        let truth = Truth {
            mag: 19.1,
            alpha: 0.14,
            beta: 3.1,
            gamma: 0.0,
            sig_int: -0.1,
        };
        assert_eq!(truth.validate().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn result_paths_are_named_after_alpha_and_beta() {
        let config = SimConfig {
            alpha: 0.14,
            beta: 3.1,
            mag: 19.1,
            nsims: 50,
            data_path: PathBuf::from("data/combined_data.csv"),
            out_dir: PathBuf::from("data"),
            seed: None,
            strict: false,
            quiet: true,
            grid: TruthGrid::default(),
        };
        assert_eq!(config.results_path(), PathBuf::from("data/0.14_3.1.csv"));
        assert_eq!(config.manifest_path(), PathBuf::from("data/0.14_3.1.json"));
        assert!(config.validate().is_ok());
    }
}

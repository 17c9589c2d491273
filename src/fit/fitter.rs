//! Low-level fitting routine for a single model kind.
//!
//! Given:
//! - per-supernova covariates
//! - a target vector (the synthetic `mu`, or residuals of an earlier stage)
//!
//! we minimize `Σ (model_i - target_i)²` with Levenberg–Marquardt, starting
//! from all-zero parameters, and return the minimizer's [`Minimum`] as is.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Dataset, Subset};
use crate::error::AppError;
use crate::math::{LeastSquaresProblem, LevenbergMarquardt, Minimum};
use crate::models::{Covariates, ModelKind, fill_design_row, predict};

/// Covariates and response of one subset for one trial.
#[derive(Debug, Clone)]
pub struct FitData {
    pub covariates: Vec<Covariates>,
    pub mu: Vec<f64>,
}

impl FitData {
    pub fn new(covariates: Vec<Covariates>, mu: Vec<f64>) -> Result<Self, AppError> {
        if covariates.len() != mu.len() {
            return Err(AppError::input(format!(
                "Covariate/response length mismatch: {} != {}",
                covariates.len(),
                mu.len()
            )));
        }
        if covariates.is_empty() {
            return Err(AppError::new(3, "Cannot fit an empty subset."));
        }
        Ok(Self { covariates, mu })
    }

    /// Gather one subset's rows, pairing them with the trial's synthetic `mu`
    /// (one entry per dataset row).
    pub fn for_subset(dataset: &Dataset, subset: &Subset, mu: &[f64]) -> Result<Self, AppError> {
        if mu.len() != dataset.len() {
            return Err(AppError::input(format!(
                "Synthetic response has {} rows, dataset has {}.",
                mu.len(),
                dataset.len()
            )));
        }
        let rows = dataset.rows();
        let covariates = subset.rows.iter().map(|&i| Covariates::from(&rows[i])).collect();
        let mu = subset.rows.iter().map(|&i| mu[i]).collect();
        Self::new(covariates, mu)
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }
}

/// `Σ (model_i - target_i)²` for one model kind, with the analytic Jacobian.
pub struct ModelProblem<'a> {
    pub model: ModelKind,
    pub covariates: &'a [Covariates],
    pub target: &'a [f64],
}

impl LeastSquaresProblem for ModelProblem<'_> {
    fn residuals(&self, params: &[f64]) -> DVector<f64> {
        DVector::from_iterator(
            self.target.len(),
            self.covariates
                .iter()
                .zip(self.target.iter())
                .map(|(cov, &y)| predict(self.model, cov, params) - y),
        )
    }

    fn jacobian(&self, _params: &[f64]) -> DMatrix<f64> {
        let n = self.model.param_len();
        let mut jac = DMatrix::zeros(self.covariates.len(), n);
        let mut row = vec![0.0; n];
        for (i, cov) in self.covariates.iter().enumerate() {
            fill_design_row(self.model, cov, &mut row);
            for (j, &v) in row.iter().enumerate() {
                jac[(i, j)] = v;
            }
        }
        jac
    }
}

/// Fit `model` to `target`, all parameters starting at zero.
pub fn fit_model(
    model: ModelKind,
    covariates: &[Covariates],
    target: &[f64],
    minimizer: &LevenbergMarquardt,
) -> Result<Minimum, AppError> {
    let problem = ModelProblem {
        model,
        covariates,
        target,
    };
    let init = vec![0.0; model.param_len()];
    minimizer.minimize(&problem, &init)
}

/// `target_i - model_i` for every row.
pub fn compute_residuals(model: ModelKind, covariates: &[Covariates], target: &[f64], params: &[f64]) -> Vec<f64> {
    covariates
        .iter()
        .zip(target.iter())
        .map(|(cov, &y)| y - predict(model, cov, params))
        .collect()
}

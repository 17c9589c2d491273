//! Sequential fit: linear covariates first, then the step on the residuals.
//!
//! Stage 1 fits `mag, alpha, beta` ignoring host mass. Stage 2 fits `gamma`
//! alone against the stage-1 residuals, so any mass/covariate correlation is
//! absorbed by the linear terms before the step is estimated.

use crate::domain::LinearParams;
use crate::error::AppError;
use crate::fit::fitter::{FitData, compute_residuals, fit_model};
use crate::math::{LevenbergMarquardt, Minimum, std_dev};
use crate::models::ModelKind;

#[derive(Debug, Clone)]
pub struct SequentialFit {
    pub linear: LinearParams,
    pub gamma: f64,
    /// Population std of the residuals after both stages.
    pub sig_int: f64,
    pub linear_minimum: Minimum,
    pub step_minimum: Minimum,
}

impl SequentialFit {
    /// Both stages converged.
    pub fn converged(&self) -> bool {
        self.linear_minimum.converged() && self.step_minimum.converged()
    }
}

pub fn fit_sequential(data: &FitData, minimizer: &LevenbergMarquardt) -> Result<SequentialFit, AppError> {
    let linear_minimum = fit_model(ModelKind::Linear, &data.covariates, &data.mu, minimizer)?;
    let lp = &linear_minimum.params;
    let linear = LinearParams {
        mag: lp[0],
        alpha: lp[1],
        beta: lp[2],
    };
    let stage1 = compute_residuals(ModelKind::Linear, &data.covariates, &data.mu, lp);

    let step_minimum = fit_model(ModelKind::Step, &data.covariates, &stage1, minimizer)?;
    let gamma = step_minimum.params[0];
    let stage2 = compute_residuals(ModelKind::Step, &data.covariates, &stage1, &step_minimum.params);

    Ok(SequentialFit {
        linear,
        gamma,
        sig_int: std_dev(&stage2),
        linear_minimum,
        step_minimum,
    })
}

//! Standardization model evaluation.
//!
//! The fitters rely on two primitive operations:
//! - build a design row for one supernova (the Jacobian row of its residual)
//! - predict `mu` given a parameter vector
//!
//! Parameter order per model kind:
//! - `Joint`:  `[mag, alpha, beta, gamma]`
//! - `Linear`: `[mag, alpha, beta]`
//! - `Step`:   `[gamma]`

use crate::domain::{MASS_STEP_THRESHOLD, Observation};
use crate::math::sign;

/// Which standardization model to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Linear in stretch and color plus the host-mass step.
    Joint,
    /// Linear in stretch and color, no step.
    Linear,
    /// Host-mass step alone.
    Step,
}

impl ModelKind {
    pub fn param_len(self) -> usize {
        match self {
            ModelKind::Joint => 4,
            ModelKind::Linear => 3,
            ModelKind::Step => 1,
        }
    }

    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Joint => &["mag", "alpha", "beta", "gamma"],
            ModelKind::Linear => &["mag", "alpha", "beta"],
            ModelKind::Step => &["gamma"],
        }
    }

    /// `name=value` pairs for a parameter vector of this model.
    pub fn describe(self, params: &[f64]) -> String {
        self.param_names()
            .iter()
            .zip(params)
            .map(|(name, v)| format!("{name}={v:.6}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Covariates of one supernova, with the mass already reduced to its step sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariates {
    pub x1: f64,
    pub c: f64,
    /// `sign(mass - 10)`: `-1`, `0`, or `+1`.
    pub step: f64,
}

impl From<&Observation> for Covariates {
    fn from(obs: &Observation) -> Self {
        Self {
            x1: obs.x1,
            c: obs.c,
            step: mass_step(obs.mass),
        }
    }
}

/// `sign(mass - 10)`.
pub fn mass_step(mass: f64) -> f64 {
    sign(mass - MASS_STEP_THRESHOLD)
}

/// Fill a design row for the given model kind.
///
/// # Panics
/// Panics if `out` is shorter than `model.param_len()`.
pub fn fill_design_row(model: ModelKind, cov: &Covariates, out: &mut [f64]) {
    match model {
        ModelKind::Joint => {
            out[0] = 1.0;
            out[1] = cov.x1;
            out[2] = cov.c;
            out[3] = cov.step / 2.0;
        }
        ModelKind::Linear => {
            out[0] = 1.0;
            out[1] = cov.x1;
            out[2] = cov.c;
        }
        ModelKind::Step => {
            out[0] = cov.step / 2.0;
        }
    }
}

/// Predict `mu` for the given model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_len()`.
pub fn predict(model: ModelKind, cov: &Covariates, params: &[f64]) -> f64 {
    match model {
        ModelKind::Joint => params[0] + params[1] * cov.x1 + params[2] * cov.c + params[3] / 2.0 * cov.step,
        ModelKind::Linear => params[0] + params[1] * cov.x1 + params[2] * cov.c,
        ModelKind::Step => params[0] / 2.0 * cov.step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_half_gamma_either_side_of_threshold() {
        let low = Covariates { x1: 0.0, c: 0.0, step: mass_step(9.5) };
        let high = Covariates { x1: 0.0, c: 0.0, step: mass_step(10.5) };
        let on = Covariates { x1: 0.0, c: 0.0, step: mass_step(10.0) };

        assert_eq!(predict(ModelKind::Step, &low, &[0.08]), -0.04);
        assert_eq!(predict(ModelKind::Step, &high, &[0.08]), 0.04);
        assert_eq!(predict(ModelKind::Step, &on, &[0.08]), 0.0);
    }

    #[test]
    fn design_row_matches_prediction() {
        let cov = Covariates { x1: 0.7, c: -0.05, step: 1.0 };
        let params = [19.1, 0.14, 3.1, 0.1];
        let mut row = [0.0; 4];
        fill_design_row(ModelKind::Joint, &cov, &mut row);

        let dot: f64 = row.iter().zip(params.iter()).map(|(a, b)| a * b).sum();
        assert!((dot - predict(ModelKind::Joint, &cov, &params)).abs() < 1e-12);
        assert_eq!(ModelKind::Joint.param_len(), ModelKind::Joint.param_names().len());
    }

    #[test]
    fn describe_names_each_parameter() {
        assert_eq!(
            ModelKind::Linear.describe(&[19.1, 0.14, 3.1]),
            "mag=19.100000, alpha=0.140000, beta=3.100000"
        );
        assert_eq!(ModelKind::Step.describe(&[-0.05]), "gamma=-0.050000");
    }
}

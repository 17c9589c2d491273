//! Joint fit: `mag, alpha, beta, gamma` estimated together.

use crate::domain::StandardizationParams;
use crate::error::AppError;
use crate::fit::fitter::{FitData, compute_residuals, fit_model};
use crate::math::{LevenbergMarquardt, Minimum, std_dev};
use crate::models::ModelKind;

#[derive(Debug, Clone)]
pub struct JointFit {
    pub params: StandardizationParams,
    /// Population std of `mu - model` at the optimum.
    pub sig_int: f64,
    pub minimum: Minimum,
}

impl JointFit {
    pub fn converged(&self) -> bool {
        self.minimum.converged()
    }
}

/// Fit the step together with the linear covariates.
pub fn fit_joint(data: &FitData, minimizer: &LevenbergMarquardt) -> Result<JointFit, AppError> {
    let minimum = fit_model(ModelKind::Joint, &data.covariates, &data.mu, minimizer)?;
    let p = &minimum.params;
    let params = StandardizationParams {
        mag: p[0],
        alpha: p[1],
        beta: p[2],
        gamma: p[3],
    };

    let resid = compute_residuals(ModelKind::Joint, &data.covariates, &data.mu, p);
    let sig_int = std_dev(&resid);

    Ok(JointFit {
        params,
        sig_int,
        minimum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Covariates, predict};

    fn covariates() -> Vec<Covariates> {
        (0..16)
            .map(|i| Covariates {
                x1: ((i * 5) % 7) as f64 * 0.5 - 1.5,
                c: ((i * 3) % 4) as f64 * 0.05 - 0.08,
                step: if i % 3 == 0 { -1.0 } else { 1.0 },
            })
            .collect()
    }

    #[test]
    fn recovers_truth_on_noise_free_data() {
        let cov = covariates();
        let truth = [19.1, 0.14, 3.1, 0.08];
        let mu: Vec<f64> = cov.iter().map(|c| predict(ModelKind::Joint, c, &truth)).collect();
        let data = FitData::new(cov, mu).unwrap();

        let fit = fit_joint(&data, &LevenbergMarquardt::default()).unwrap();
        assert!(fit.converged(), "{}", fit.minimum);
        assert!((fit.params.mag - 19.1).abs() < 1e-7);
        assert!((fit.params.alpha - 0.14).abs() < 1e-7);
        assert!((fit.params.beta - 3.1).abs() < 1e-7);
        assert!((fit.params.gamma - 0.08).abs() < 1e-7);
        assert!(fit.sig_int < 1e-7);
    }
}

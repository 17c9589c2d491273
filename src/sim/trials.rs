//! Trial runner: repeated synthesize → fit → accumulate for one truth set.

use rand::Rng;
use tracing::{debug, warn};

use crate::data::synthesize_mu;
use crate::domain::{AggregateRow, Dataset, Truth};
use crate::error::AppError;
use crate::fit::{FitData, JointFit, SequentialFit, fit_joint, fit_sequential};
use crate::math::{LevenbergMarquardt, mean, std_dev};
use crate::models::ModelKind;

/// Mean and population standard deviation across trials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std: std_dev(values),
        }
    }
}

/// Recovered values of one strategy, one entry per trial.
#[derive(Debug, Clone, Default)]
pub struct StrategySamples {
    pub mag: Vec<f64>,
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
    pub gamma: Vec<f64>,
    pub sig_int: Vec<f64>,
    pub unconverged: usize,
}

impl StrategySamples {
    fn push(&mut self, mag: f64, alpha: f64, beta: f64, gamma: f64, sig_int: f64, converged: bool) {
        self.mag.push(mag);
        self.alpha.push(alpha);
        self.beta.push(beta);
        self.gamma.push(gamma);
        self.sig_int.push(sig_int);
        if !converged {
            self.unconverged += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.mag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mag.is_empty()
    }
}

/// Per-subset accumulator for both strategies.
#[derive(Debug, Clone)]
pub struct SubsetAccumulator {
    pub subset: String,
    pub joint: StrategySamples,
    pub sequential: StrategySamples,
}

impl SubsetAccumulator {
    pub fn new(subset: impl Into<String>) -> Self {
        Self {
            subset: subset.into(),
            joint: StrategySamples::default(),
            sequential: StrategySamples::default(),
        }
    }

    pub fn record(&mut self, joint: &JointFit, sequential: &SequentialFit) {
        let j = &joint.params;
        self.joint
            .push(j.mag, j.alpha, j.beta, j.gamma, joint.sig_int, joint.converged());

        let l = &sequential.linear;
        self.sequential.push(
            l.mag,
            l.alpha,
            l.beta,
            sequential.gamma,
            sequential.sig_int,
            sequential.converged(),
        );
    }

    /// Reduce the accumulated lists to one aggregate row.
    pub fn into_row(self, truth: &Truth) -> AggregateRow {
        let sim = &self.joint;
        let sep = &self.sequential;
        let (mag_sim, mag_sep) = (Summary::of(&sim.mag), Summary::of(&sep.mag));
        let (alpha_sim, alpha_sep) = (Summary::of(&sim.alpha), Summary::of(&sep.alpha));
        let (beta_sim, beta_sep) = (Summary::of(&sim.beta), Summary::of(&sep.beta));
        let (gamma_sim, gamma_sep) = (Summary::of(&sim.gamma), Summary::of(&sep.gamma));
        let (sig_sim, sig_sep) = (Summary::of(&sim.sig_int), Summary::of(&sep.sig_int));

        AggregateRow {
            nsims: sim.len(),

            mag: truth.mag,
            alpha: truth.alpha,
            beta: truth.beta,
            gamma: truth.gamma,
            sig_int: truth.sig_int,

            mag_sim: mag_sim.mean,
            mag_sep: mag_sep.mean,
            mag_sim_err: mag_sim.std,
            mag_sep_err: mag_sep.std,

            alpha_sim: alpha_sim.mean,
            alpha_sep: alpha_sep.mean,
            alpha_sim_err: alpha_sim.std,
            alpha_sep_err: alpha_sep.std,

            beta_sim: beta_sim.mean,
            beta_sep: beta_sep.mean,
            beta_sim_err: beta_sim.std,
            beta_sep_err: beta_sep.std,

            gamma_sim: gamma_sim.mean,
            gamma_sep: gamma_sep.mean,
            gamma_sim_err: gamma_sim.std,
            gamma_sep_err: gamma_sep.std,

            sig_int_sim: sig_sim.mean,
            sig_int_sep: sig_sep.mean,
            sig_int_sim_err: sig_sim.std,
            sig_int_sep_err: sig_sep.std,

            unconverged_sim: sim.unconverged,
            unconverged_sep: sep.unconverged,

            subset: self.subset,
        }
    }
}

/// Options shared by every trial of a run.
#[derive(Debug, Clone)]
pub struct TrialOptions {
    pub nsims: usize,
    /// Abort on the first unconverged fit instead of counting it.
    pub strict: bool,
    pub minimizer: LevenbergMarquardt,
}

/// Run `nsims` trials for one truth set and return one row per subset, in
/// subset order.
pub fn run_trials<R: Rng + ?Sized>(
    dataset: &Dataset,
    truth: &Truth,
    options: &TrialOptions,
    rng: &mut R,
) -> Result<Vec<AggregateRow>, AppError> {
    if options.nsims == 0 {
        return Err(AppError::input("--nsims must be > 0."));
    }

    let mut accumulators: Vec<SubsetAccumulator> = dataset
        .subsets()
        .iter()
        .map(|s| SubsetAccumulator::new(s.name.clone()))
        .collect();

    for trial in 0..options.nsims {
        let mu = synthesize_mu(dataset, truth, rng)?;

        for (subset, acc) in dataset.subsets().iter().zip(accumulators.iter_mut()) {
            let data = FitData::for_subset(dataset, subset, &mu)?;
            let joint = fit_joint(&data, &options.minimizer)?;
            let sequential = fit_sequential(&data, &options.minimizer)?;

            if !joint.converged() {
                let reason = format!(
                    "{} at {}",
                    joint.minimum.termination,
                    ModelKind::Joint.describe(&joint.minimum.params)
                );
                report_unconverged(options.strict, &subset.name, trial, "joint", &reason)?;
            }
            if !sequential.converged() {
                let reason = if sequential.linear_minimum.converged() {
                    let m = &sequential.step_minimum;
                    format!("step stage: {} at {}", m.termination, ModelKind::Step.describe(&m.params))
                } else {
                    let m = &sequential.linear_minimum;
                    format!("linear stage: {} at {}", m.termination, ModelKind::Linear.describe(&m.params))
                };
                report_unconverged(options.strict, &subset.name, trial, "sequential", &reason)?;
            }

            acc.record(&joint, &sequential);
        }

        debug!(trial, gamma = truth.gamma, sig_int = truth.sig_int, "trial complete");
    }

    Ok(accumulators.into_iter().map(|acc| acc.into_row(truth)).collect())
}

fn report_unconverged(strict: bool, subset: &str, trial: usize, strategy: &str, reason: &str) -> Result<(), AppError> {
    if strict {
        return Err(AppError::new(
            5,
            format!("{strategy} fit did not converge (subset '{subset}', trial {trial}): {reason}"),
        ));
    }
    warn!(subset, trial, strategy, reason, "minimizer did not converge");
    Ok(())
}

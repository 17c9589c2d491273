//! Levenberg–Marquardt minimizer for sums of squared residuals.
//!
//! The fits in this crate only ever need one operation from a minimizer:
//!
//! ```text
//! minimize(problem, initial_guess) -> (parameters, achieved minimum, diagnostics)
//! ```
//!
//! so the interface is kept that narrow. A problem exposes its residual vector
//! and, optionally, an analytic Jacobian (central differences otherwise).
//!
//! Each iteration solves the damped Gauss–Newton system
//!
//! ```text
//! [ J            ]       [ -r ]
//! [ sqrt(λ D)    ] δ  =  [  0 ]
//! ```
//!
//! with `D = diag(JᵀJ)` (Marquardt scaling) through the SVD solver in
//! [`crate::math::ols`]. Accepted steps shrink `λ`, rejected steps grow it.
//!
//! Convergence is reported explicitly via [`Termination`]; callers decide
//! whether an unconverged result is fatal.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::solve_least_squares;

const LAMBDA_FACTOR: f64 = 10.0;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;
/// Floor for the Marquardt scale of an all-zero Jacobian column.
const MIN_SCALE: f64 = 1e-12;

/// A least-squares objective: `cost(p) = Σ r_i(p)²`.
pub trait LeastSquaresProblem {
    /// Residual vector at `params`.
    fn residuals(&self, params: &[f64]) -> DVector<f64>;

    /// Jacobian of the residuals (one row per residual, one column per parameter).
    fn jacobian(&self, params: &[f64]) -> DMatrix<f64> {
        let n = params.len();
        let m = self.residuals(params).len();
        let mut jac = DMatrix::zeros(m, n);
        let mut shifted = params.to_vec();

        for j in 0..n {
            let eps = 1e-6 * params[j].abs().max(1.0);

            shifted[j] = params[j] + eps;
            let plus = self.residuals(&shifted);
            shifted[j] = params[j] - eps;
            let minus = self.residuals(&shifted);
            shifted[j] = params[j];

            jac.set_column(j, &((plus - minus) / (2.0 * eps)));
        }

        jac
    }

    /// Sum of squared residuals.
    fn cost(&self, params: &[f64]) -> f64 {
        self.residuals(params).norm_squared()
    }
}

/// Stopping criteria.
#[derive(Debug, Clone)]
pub struct MinimizerConfig {
    /// Maximum number of outer (Jacobian) iterations.
    pub max_iter: usize,
    /// Relative cost reduction below which an accepted step counts as converged.
    pub ftol: f64,
    /// Relative step length below which the iterate counts as converged.
    pub xtol: f64,
    /// Max-norm of the gradient `Jᵀr` below which the iterate counts as converged.
    pub gtol: f64,
    /// Absolute cost below which the data are considered fitted exactly.
    pub cost_floor: f64,
    /// Initial damping factor.
    pub lambda_init: f64,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            ftol: 1e-12,
            xtol: 1e-10,
            gtol: 1e-10,
            cost_floor: 1e-24,
            lambda_init: 1e-3,
        }
    }
}

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ExactFit,
    GradientTolerance,
    CostTolerance,
    /// The step shrank below `xtol` relative to the iterate, whether or not
    /// the last candidate lowered the cost.
    StepTolerance,
    MaxIterations,
    /// Damping grew past its ceiling without finding a downhill step.
    Stalled,
}

impl Termination {
    pub fn converged(self) -> bool {
        matches!(
            self,
            Termination::ExactFit
                | Termination::GradientTolerance
                | Termination::CostTolerance
                | Termination::StepTolerance
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Termination::ExactFit => "exact fit",
            Termination::GradientTolerance => "gradient tolerance reached",
            Termination::CostTolerance => "cost tolerance reached",
            Termination::StepTolerance => "step tolerance reached",
            Termination::MaxIterations => "maximum iterations reached",
            Termination::Stalled => "damping exhausted without a downhill step",
        };
        f.write_str(label)
    }
}

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub params: Vec<f64>,
    /// Achieved sum of squared residuals.
    pub cost: f64,
    pub n_iter: usize,
    /// Number of residual evaluations (excluding finite-difference Jacobians).
    pub n_fev: usize,
    pub termination: Termination,
}

impl Minimum {
    pub fn converged(&self) -> bool {
        self.termination.converged()
    }
}

impl fmt::Display for Minimum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Minimum(cost={:.6e}, n_iter={}, n_fev={}, converged={}, {})",
            self.cost,
            self.n_iter,
            self.n_fev,
            self.converged(),
            self.termination
        )
    }
}

enum StepOutcome {
    Accepted {
        x: DVector<f64>,
        r: DVector<f64>,
        cost: f64,
        negligible: bool,
    },
    Negligible,
    Stalled,
}

/// Levenberg–Marquardt minimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: MinimizerConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    /// Minimize `problem` starting from `init`.
    ///
    /// Hard failures (non-finite cost, malformed Jacobian, unsolvable step) are
    /// errors. Running out of iterations is not: it comes back as an
    /// unconverged [`Minimum`].
    pub fn minimize(&self, problem: &dyn LeastSquaresProblem, init: &[f64]) -> Result<Minimum, AppError> {
        if init.is_empty() {
            return Err(AppError::input("Minimizer needs at least one parameter."));
        }
        let cfg = &self.config;
        let n = init.len();

        let mut x = DVector::from_column_slice(init);
        let mut r = problem.residuals(x.as_slice());
        let mut cost = r.norm_squared();
        let mut n_fev = 1usize;
        let mut n_iter = 0usize;
        let mut lambda = cfg.lambda_init;

        if !cost.is_finite() {
            return Err(AppError::numeric("Non-finite cost at the initial guess."));
        }

        let termination = loop {
            if cost <= cfg.cost_floor {
                break Termination::ExactFit;
            }
            if n_iter >= cfg.max_iter {
                break Termination::MaxIterations;
            }
            n_iter += 1;

            let jac = problem.jacobian(x.as_slice());
            if jac.nrows() != r.len() || jac.ncols() != n {
                return Err(AppError::numeric(format!(
                    "Jacobian shape {}x{} does not match {} residuals x {} parameters.",
                    jac.nrows(),
                    jac.ncols(),
                    r.len(),
                    n
                )));
            }

            let grad = jac.transpose() * &r;
            if grad.amax() <= cfg.gtol {
                break Termination::GradientTolerance;
            }

            let scale: Vec<f64> = jac
                .column_iter()
                .map(|col| col.norm_squared().max(MIN_SCALE))
                .collect();

            let mut outcome = StepOutcome::Stalled;
            while lambda <= LAMBDA_MAX {
                let (a, b) = damped_system(&jac, &r, &scale, lambda);
                let delta = solve_least_squares(&a, &b)
                    .ok_or_else(|| AppError::numeric("Levenberg–Marquardt step could not be solved."))?;
                let negligible = delta.norm() <= cfg.xtol * (x.norm() + cfg.xtol);

                let candidate = &x + &delta;
                let r_new = problem.residuals(candidate.as_slice());
                n_fev += 1;
                let cost_new = r_new.norm_squared();

                if cost_new.is_finite() && cost_new < cost {
                    lambda = (lambda / LAMBDA_FACTOR).max(LAMBDA_MIN);
                    outcome = StepOutcome::Accepted {
                        x: candidate,
                        r: r_new,
                        cost: cost_new,
                        negligible,
                    };
                    break;
                }
                if negligible {
                    outcome = StepOutcome::Negligible;
                    break;
                }
                lambda *= LAMBDA_FACTOR;
            }

            match outcome {
                StepOutcome::Accepted {
                    x: x_new,
                    r: r_new,
                    cost: cost_new,
                    negligible,
                } => {
                    let reduction = (cost - cost_new) / cost;
                    x = x_new;
                    r = r_new;
                    cost = cost_new;
                    if negligible {
                        break Termination::StepTolerance;
                    }
                    if reduction <= cfg.ftol {
                        break Termination::CostTolerance;
                    }
                }
                StepOutcome::Negligible => break Termination::StepTolerance,
                StepOutcome::Stalled => break Termination::Stalled,
            }
        };

        Ok(Minimum {
            params: x.iter().copied().collect(),
            cost,
            n_iter,
            n_fev,
            termination,
        })
    }
}

/// Stack `J` on top of the damping rows and `-r` on top of zeros.
fn damped_system(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> (DMatrix<f64>, DVector<f64>) {
    let m = jac.nrows();
    let n = jac.ncols();

    let mut a = DMatrix::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(jac);
    for (j, &s) in scale.iter().enumerate() {
        a[(m + j, j)] = (lambda * s).sqrt();
    }

    let mut b = DVector::zeros(m + n);
    for i in 0..m {
        b[i] = -r[i];
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = a + b x, analytic Jacobian.
    struct Line {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Line {
        fn residuals(&self, p: &[f64]) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x.iter().zip(&self.y).map(|(&x, &y)| p[0] + p[1] * x - y),
            )
        }

        fn jacobian(&self, _p: &[f64]) -> DMatrix<f64> {
            DMatrix::from_fn(self.x.len(), 2, |i, j| if j == 0 { 1.0 } else { self.x[i] })
        }
    }

    /// Rosenbrock as least squares: r = [10 (y - x²), 1 - x]; numeric Jacobian.
    struct Rosenbrock;

    impl LeastSquaresProblem for Rosenbrock {
        fn residuals(&self, p: &[f64]) -> DVector<f64> {
            DVector::from_row_slice(&[10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]])
        }
    }

    /// r = |x - kink| + 1: no downhill step exists at the kink, yet the
    /// one-sided Jacobian keeps the gradient away from zero.
    struct Kink {
        at: f64,
    }

    impl LeastSquaresProblem for Kink {
        fn residuals(&self, p: &[f64]) -> DVector<f64> {
            DVector::from_element(1, (p[0] - self.at).abs() + 1.0)
        }

        fn jacobian(&self, _p: &[f64]) -> DMatrix<f64> {
            DMatrix::from_element(1, 1, 1.0)
        }
    }

    struct Broken;

    impl LeastSquaresProblem for Broken {
        fn residuals(&self, _p: &[f64]) -> DVector<f64> {
            DVector::from_element(3, f64::NAN)
        }
    }

    #[test]
    fn recovers_line_with_noise() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &x)| 2.0 + 3.0 * x + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let problem = Line { x, y };

        let min = LevenbergMarquardt::default().minimize(&problem, &[0.0, 0.0]).unwrap();
        assert!(min.converged(), "{min}");
        assert!((min.params[0] - 2.0).abs() < 0.1);
        assert!((min.params[1] - 3.0).abs() < 0.05);
        // 20 residuals of ±0.1 around the best line: cost cannot exceed 0.2.
        assert!(min.cost <= 0.2 + 1e-9);
    }

    #[test]
    fn exact_data_reaches_cost_floor() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|&x| 19.1 - 0.5 * x).collect();
        let problem = Line { x, y };

        let min = LevenbergMarquardt::default().minimize(&problem, &[0.0, 0.0]).unwrap();
        assert!(min.converged(), "{min}");
        assert!((min.params[0] - 19.1).abs() < 1e-8);
        assert!((min.params[1] + 0.5).abs() < 1e-8);
    }

    #[test]
    fn zero_cost_start_stops_immediately() {
        let problem = Line {
            x: vec![0.0, 1.0],
            y: vec![0.0, 0.0],
        };
        let min = LevenbergMarquardt::default().minimize(&problem, &[0.0, 0.0]).unwrap();
        assert_eq!(min.termination, Termination::ExactFit);
        assert_eq!(min.n_iter, 0);
        assert_eq!(min.params, vec![0.0, 0.0]);
    }

    #[test]
    fn solves_rosenbrock_with_numeric_jacobian() {
        let min = LevenbergMarquardt::default().minimize(&Rosenbrock, &[-1.2, 1.0]).unwrap();
        assert!(min.converged(), "{min}");
        assert!((min.params[0] - 1.0).abs() < 1e-6);
        assert!((min.params[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iteration_cap_is_reported_as_unconverged() {
        let lm = LevenbergMarquardt::new(MinimizerConfig {
            max_iter: 1,
            ..MinimizerConfig::default()
        });
        let min = lm.minimize(&Rosenbrock, &[-1.2, 1.0]).unwrap();
        assert_eq!(min.termination, Termination::MaxIterations);
        assert!(!min.converged());
    }

    #[test]
    fn rejected_step_below_xtol_counts_as_converged() {
        // Away from the origin xtol scales with |x|, so the step becomes
        // negligible before damping runs out.
        let min = LevenbergMarquardt::default().minimize(&Kink { at: 1.0 }, &[1.0]).unwrap();
        assert_eq!(min.termination, Termination::StepTolerance);
        assert!(min.converged());
        assert_eq!(min.params, vec![1.0]);
        assert_eq!(min.cost, 1.0);
    }

    #[test]
    fn exhausted_damping_is_reported_as_stalled() {
        // At the origin the xtol threshold is ~1e-20, below any step the
        // damping ceiling allows.
        let min = LevenbergMarquardt::default().minimize(&Kink { at: 0.0 }, &[0.0]).unwrap();
        assert_eq!(min.termination, Termination::Stalled);
        assert!(!min.converged());
        assert_eq!(min.params, vec![0.0]);
        assert_eq!(min.n_iter, 1);
    }

    #[test]
    fn non_finite_cost_is_an_error() {
        let err = LevenbergMarquardt::default().minimize(&Broken, &[0.0]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}

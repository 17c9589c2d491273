//! Mathematical utilities: SVD least squares, the Levenberg–Marquardt
//! minimizer, and summary statistics.

pub mod lm;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use stats::*;

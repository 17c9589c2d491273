//! Fitting strategies.
//!
//! Responsibilities:
//!
//! - wrap one model kind as a least-squares problem (`fitter`)
//! - joint fit of the linear terms and the mass step (`joint`)
//! - sequential fit: linear terms, then the step on the residuals (`sequential`)

pub mod fitter;
pub mod joint;
pub mod sequential;

pub use fitter::*;
pub use joint::*;
pub use sequential::*;

//! Monte Carlo study: trial runner and grid driver.

pub mod grid;
pub mod trials;

pub use grid::*;
pub use trials::*;

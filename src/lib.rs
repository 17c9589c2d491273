//! `stepsim` library crate.
//!
//! Monte Carlo study of how well a host-mass step in Type Ia supernova
//! standardization is recovered when it is fitted jointly with the stretch
//! and color terms versus sequentially on the residuals of a linear fit.
//!
//! The binaries (`stepsim`, `stepsim-scripts`) are thin wrappers around this
//! library so the whole pipeline is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod scripts;
pub mod sim;

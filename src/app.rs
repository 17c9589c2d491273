//! Top-level application orchestration.
//!
//! `src/main.rs` and `src/bin/stepsim_scripts.rs` are intentionally tiny; this
//! module is the "real main" for both binaries:
//! - loads `.env` and installs tracing
//! - parses CLI arguments into a config struct
//! - runs the pipeline
//! - prints the summary

use clap::Parser;

use crate::cli::{ScriptArgs, SimArgs};
use crate::domain::{ScriptConfig, SimConfig, TruthGrid};
use crate::error::AppError;
use crate::math::linspace;

pub mod pipeline;

/// Entry point for the `stepsim` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    crate::logging::init_tracing();

    let args = SimArgs::parse();
    let config = sim_config_from_args(&args);
    let run = pipeline::run_simulation(&config)?;

    if !config.quiet {
        println!("{}", crate::report::format_run_summary(&config, run.seed, &run.stats));
        println!("{}", crate::report::format_results_table(&run.rows));
        println!("{}", crate::report::format_step_bias(&run.rows));
        println!("Results: {}", run.results_path.display());
        println!("Manifest: {}", run.manifest_path.display());
    }

    Ok(())
}

/// Entry point for the `stepsim-scripts` binary.
pub fn run_scripts() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    crate::logging::init_tracing();

    let args = ScriptArgs::parse();
    let config = script_config_from_args(&args);
    let summary = crate::scripts::write_scripts(&config)?;

    println!(
        "Wrote {} job scripts; submit with: bash {}",
        summary.scripts.len(),
        summary.submit_path.display()
    );
    Ok(())
}

pub fn sim_config_from_args(args: &SimArgs) -> SimConfig {
    SimConfig {
        alpha: args.alpha,
        beta: args.beta,
        mag: args.mag,
        nsims: args.nsims,
        data_path: args.data.clone(),
        out_dir: args.out_dir.clone(),
        seed: args.seed,
        strict: args.strict,
        quiet: args.quiet,
        grid: TruthGrid::default(),
    }
}

pub fn script_config_from_args(args: &ScriptArgs) -> ScriptConfig {
    ScriptConfig {
        alphas: linspace(args.alpha_min, args.alpha_max, args.alpha_steps),
        betas: linspace(args.beta_min, args.beta_max, args.beta_steps),
        nsims: args.nsims,
        script_dir: args.script_dir.clone(),
        log_dir: args.log_dir.clone(),
        workdir: args.workdir.clone(),
        sim_command: args.sim_command.clone(),
        submit_delay: args.submit_delay,
    }
}

//! Command-line parsing for the simulation driver and the script generator.
//!
//! Argument parsing stays separate from the simulation code: each binary's
//! args are turned into a plain config struct in `crate::app`.

use std::path::PathBuf;

use clap::Parser;

/// Simulation driver (`stepsim`).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "stepsim",
    version,
    about = "Monte Carlo comparison of joint vs. sequential host-mass step fits"
)]
pub struct SimArgs {
    /// True stretch coefficient.
    #[arg(long, default_value_t = 0.14, allow_negative_numbers = true)]
    pub alpha: f64,

    /// True color coefficient.
    #[arg(long, default_value_t = 3.1, allow_negative_numbers = true)]
    pub beta: f64,

    /// Number of trials per grid cell.
    #[arg(long, default_value_t = 50)]
    pub nsims: usize,

    /// True absolute magnitude offset.
    #[arg(long, default_value_t = 19.1, allow_negative_numbers = true)]
    pub mag: f64,

    /// Input CSV (columns: set, x1, c, mass; mu optional).
    #[arg(long, env = "STEPSIM_DATA", default_value = "data/combined_data.csv")]
    pub data: PathBuf,

    /// Directory for `<alpha>_<beta>.csv` and its JSON manifest.
    #[arg(long, env = "STEPSIM_OUT_DIR", default_value = "data")]
    pub out_dir: PathBuf,

    /// RNG seed (drawn from entropy when omitted; always recorded in the manifest).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Abort on the first fit whose minimizer did not converge.
    #[arg(long)]
    pub strict: bool,

    /// Do not print the summary table.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Job-script generator (`stepsim-scripts`).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "stepsim-scripts",
    version,
    about = "Write one scheduler job script per (alpha, beta) cell plus a submission list"
)]
pub struct ScriptArgs {
    #[arg(long, default_value_t = 0.05, allow_negative_numbers = true)]
    pub alpha_min: f64,

    #[arg(long, default_value_t = 0.2, allow_negative_numbers = true)]
    pub alpha_max: f64,

    #[arg(long, default_value_t = 11)]
    pub alpha_steps: usize,

    #[arg(long, default_value_t = 2.5, allow_negative_numbers = true)]
    pub beta_min: f64,

    #[arg(long, default_value_t = 3.5, allow_negative_numbers = true)]
    pub beta_max: f64,

    #[arg(long, default_value_t = 11)]
    pub beta_steps: usize,

    /// Trials per grid cell passed on to each job.
    #[arg(long, default_value_t = 50)]
    pub nsims: usize,

    /// Where the job scripts and `submit_all.sh` are written.
    #[arg(long, default_value = "scripts")]
    pub script_dir: PathBuf,

    /// Scheduler log directory, relative to `--workdir`.
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Working directory the jobs run from.
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Command that launches the simulation driver inside a job.
    #[arg(long, env = "STEPSIM_COMMAND", default_value = "stepsim")]
    pub sim_command: String,

    /// Seconds to wait between submissions (0 disables).
    #[arg(long, default_value_t = 1)]
    pub submit_delay: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_defaults() {
        let args = SimArgs::parse_from(["stepsim"]);
        assert_eq!(args.alpha, 0.14);
        assert_eq!(args.beta, 3.1);
        assert_eq!(args.nsims, 50);
        assert_eq!(args.mag, 19.1);
        assert_eq!(args.seed, None);
        assert!(!args.strict);
    }

    #[test]
    fn sim_overrides() {
        let args = SimArgs::parse_from([
            "stepsim", "--alpha", "0.2", "--beta", "2.5", "--nsims", "3", "--seed", "7", "--strict",
        ]);
        assert_eq!(args.alpha, 0.2);
        assert_eq!(args.beta, 2.5);
        assert_eq!(args.nsims, 3);
        assert_eq!(args.seed, Some(7));
        assert!(args.strict);
    }

    #[test]
    fn script_defaults() {
        let args = ScriptArgs::parse_from(["stepsim-scripts"]);
        assert_eq!(args.alpha_steps, 11);
        assert_eq!(args.beta_steps, 11);
        assert_eq!((args.beta_min, args.beta_max), (2.5, 3.5));
        assert_eq!(args.submit_delay, 1);
    }
}

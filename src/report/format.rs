//! Formatted terminal output.
//!
//! Formatting lives in one place so the simulation code stays free of
//! presentation concerns.

use crate::domain::{AggregateRow, SimConfig};
use crate::io::ingest::DatasetStats;

/// Header block: configuration and dataset summary.
pub fn format_run_summary(config: &SimConfig, seed: u64, stats: &DatasetStats) -> String {
    let mut out = String::new();

    out.push_str("=== stepsim - joint vs. sequential mass-step fits ===\n");
    out.push_str(&format!(
        "Truth: mag={} alpha={} beta={} | nsims={} | seed={}\n",
        config.mag, config.alpha, config.beta, config.nsims, seed
    ));
    out.push_str(&format!(
        "Grid: gamma={} x sig_int={}\n",
        fmt_vec(&config.grid.gammas),
        fmt_vec(&config.grid.sig_ints)
    ));
    out.push_str(&format!(
        "Data: {} rows | {} subsets | mass<10: {} mass>10: {} | x1=[{:.3}, {:.3}] c=[{:.3}, {:.3}]\n",
        stats.n_rows,
        stats.n_subsets,
        stats.n_low_mass,
        stats.n_high_mass,
        stats.x1_min,
        stats.x1_max,
        stats.c_min,
        stats.c_max
    ));
    for (name, n) in &stats.subsets {
        out.push_str(&format!("  - {name}: {n}\n"));
    }

    out
}

/// One line per aggregate row comparing the two strategies.
pub fn format_results_table(rows: &[AggregateRow]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<12} {:>7} {:>7} | {:>17} {:>17} | {:>8} {:>8} | {:>8} {:>8} | {:>7} {:>7} | {}\n",
        "subset",
        "gamma",
        "sig_int",
        "gamma_sim",
        "gamma_sep",
        "alpha_sm",
        "alpha_sp",
        "beta_sm",
        "beta_sp",
        "sig_sm",
        "sig_sp",
        "unconv"
    ));

    for r in rows {
        out.push_str(&format!(
            "{:<12} {:>7.3} {:>7.3} | {:>17} {:>17} | {:>8.4} {:>8.4} | {:>8.4} {:>8.4} | {:>7.4} {:>7.4} | {}/{}\n",
            truncate(&r.subset, 12),
            r.gamma,
            r.sig_int,
            fmt_pm(r.gamma_sim, r.gamma_sim_err),
            fmt_pm(r.gamma_sep, r.gamma_sep_err),
            r.alpha_sim,
            r.alpha_sep,
            r.beta_sim,
            r.beta_sep,
            r.sig_int_sim,
            r.sig_int_sep,
            r.unconverged_sim,
            r.unconverged_sep
        ));
    }

    out
}

fn fmt_pm(mean: f64, err: f64) -> String {
    format!("{mean:+.4}±{err:.4}")
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pm_keeps_sign() {
        assert_eq!(fmt_pm(-0.1, 0.01), "-0.1000±0.0100");
        assert_eq!(fmt_pm(0.05, 0.0), "+0.0500±0.0000");
    }

    #[test]
    fn long_subset_names_are_truncated() {
        assert_eq!(truncate("pantheon_plus_lowz", 12), "pantheon_plu");
        assert_eq!(truncate("lowz", 12), "lowz");
    }

    #[test]
    fn vec_uses_shortest_repr() {
        assert_eq!(fmt_vec(&[-0.1, 0.0, 0.1]), "[-0.1, 0, 0.1]");
    }
}

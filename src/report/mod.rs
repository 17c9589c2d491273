//! Reporting utilities: per-strategy bias summaries and terminal output.

pub mod format;

pub use format::*;

use crate::domain::AggregateRow;

/// Mean bias of the recovered step for each strategy across a set of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBias {
    /// Mean of `gamma_sim - gamma`.
    pub joint: f64,
    /// Mean of `gamma_sep - gamma`.
    pub sequential: f64,
}

/// Average step bias per strategy, or `None` for no rows.
pub fn step_bias(rows: &[AggregateRow]) -> Option<StepBias> {
    if rows.is_empty() {
        return None;
    }
    let n = rows.len() as f64;
    let joint = rows.iter().map(|r| r.gamma_sim - r.gamma).sum::<f64>() / n;
    let sequential = rows.iter().map(|r| r.gamma_sep - r.gamma).sum::<f64>() / n;
    Some(StepBias { joint, sequential })
}

/// Format the per-subset step bias lines.
pub fn format_step_bias(rows: &[AggregateRow]) -> String {
    let mut subsets: Vec<&str> = Vec::new();
    for r in rows {
        if !subsets.contains(&r.subset.as_str()) {
            subsets.push(&r.subset);
        }
    }

    let mut out = String::from("Mean step bias (recovered - true gamma):\n");
    for name in subsets {
        let subset_rows: Vec<AggregateRow> = rows.iter().filter(|r| r.subset == name).cloned().collect();
        if let Some(bias) = step_bias(&subset_rows) {
            out.push_str(&format!(
                "  {name:<12} joint={:+.5} sequential={:+.5}\n",
                bias.joint, bias.sequential
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SubsetAccumulator;
    use crate::domain::Truth;

    fn row(subset: &str, gamma: f64, gamma_sim: f64, gamma_sep: f64) -> AggregateRow {
        let truth = Truth {
            mag: 19.1,
            alpha: 0.14,
            beta: 3.1,
            gamma,
            sig_int: 0.0,
        };
        let mut r = SubsetAccumulator::new(subset).into_row(&truth);
        r.gamma_sim = gamma_sim;
        r.gamma_sep = gamma_sep;
        r
    }

    #[test]
    fn bias_averages_over_rows() {
        let rows = [row("a", 0.1, 0.11, 0.07), row("a", -0.1, -0.09, -0.07)];
        let bias = step_bias(&rows).unwrap();
        assert!((bias.joint - 0.01).abs() < 1e-12);
        assert!((bias.sequential - 0.0).abs() < 1e-12);
        assert!(step_bias(&[]).is_none());
    }

    #[test]
    fn bias_lines_per_subset() {
        let rows = [row("a", 0.1, 0.1, 0.08), row("b", 0.1, 0.1, 0.1), row("a", 0.0, 0.0, 0.0)];
        let text = format_step_bias(&rows);
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("  a "));
        assert!(text.contains("sequential=-0.01000"));
    }
}

//! Aggregate result tables as CSV.
//!
//! One row per (subset, gamma, sig_int); columns follow the field order of
//! [`AggregateRow`]. Floats are written in shortest round-trip form, so a
//! table read back with [`read_results_csv`] compares equal to what was written.

use std::fs::{File, create_dir_all};
use std::io::{Read, Write};
use std::path::Path;

use crate::domain::AggregateRow;
use crate::error::AppError;

/// Write the aggregate rows to `path`, creating the parent directory if needed.
pub fn write_results_csv(path: &Path, rows: &[AggregateRow]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)
            .map_err(|e| AppError::input(format!("Failed to create output dir '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create results CSV '{}': {e}", path.display())))?;
    write_results(file, rows)
}

/// Serialize the aggregate rows to any writer.
pub fn write_results<W: Write>(sink: W, rows: &[AggregateRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::input(format!("Failed to write results CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush results CSV: {e}")))?;
    Ok(())
}

/// Read a results CSV previously written by [`write_results_csv`].
pub fn read_results_csv(path: &Path) -> Result<Vec<AggregateRow>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open results CSV '{}': {e}", path.display())))?;
    read_results(file)
}

pub fn read_results<R: Read>(source: R) -> Result<Vec<AggregateRow>, AppError> {
    let mut reader = csv::Reader::from_reader(source);
    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| row.map_err(|e| AppError::input(format!("line {}: {e}", idx + 2))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(subset: &str, gamma: f64) -> AggregateRow {
        AggregateRow {
            subset: subset.to_string(),
            nsims: 50,
            mag: 19.1,
            alpha: 0.14,
            beta: 3.1,
            gamma,
            sig_int: 0.05,
            mag_sim: 19.100013,
            mag_sep: 19.09871,
            mag_sim_err: 0.0123,
            mag_sep_err: 0.0125,
            alpha_sim: 0.1400021,
            alpha_sep: 0.139,
            alpha_sim_err: 0.003,
            alpha_sep_err: 0.0031,
            beta_sim: 3.0999,
            beta_sep: 3.0912,
            beta_sim_err: 0.04,
            beta_sep_err: 0.041,
            gamma_sim: gamma + 0.001,
            gamma_sep: gamma * 0.8,
            gamma_sim_err: 0.011,
            gamma_sep_err: 0.009,
            sig_int_sim: 0.0488,
            sig_int_sep: 0.0501,
            sig_int_sim_err: 0.004,
            sig_int_sep_err: 0.0042,
            unconverged_sim: 0,
            unconverged_sep: 1,
        }
    }

    #[test]
    fn results_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("0.14_3.1.csv");
        let rows = vec![row("lowz", -0.1), row("highz", 1.0 / 3.0)];

        write_results_csv(&path, &rows).unwrap();
        let back = read_results_csv(&path).unwrap();

        assert_eq!(back, rows);
    }

    #[test]
    fn header_lists_subset_first() {
        let mut buf = Vec::new();
        write_results(&mut buf, &[row("a", 0.0)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("subset,nsims,mag,alpha,beta,gamma,sig_int,mag_sim,"));
        assert!(header.ends_with("unconverged_sim,unconverged_sep"));
    }

    #[test]
    fn bad_results_row_reports_line() {
        let err = read_results("subset,nsims\na,notanumber\n".as_bytes()).unwrap_err();
        assert!(err.message().starts_with("line 2:"), "{}", err.message());
    }
}

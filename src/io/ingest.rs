//! CSV ingest of the supernova table.
//!
//! Turns a CSV with at least `set, x1, c, mass` into a [`Dataset`].
//!
//! - Header names are matched case-insensitively; a UTF-8 BOM is stripped.
//! - Extra columns (e.g. a pandas index column) are ignored.
//! - `mu` is optional and read leniently: the simulation overwrites it, so a
//!   value that is not a finite number is kept as `None`.
//! - Any malformed row aborts the load with its line number.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;

use crate::domain::{Dataset, Observation};
use crate::error::AppError;
use crate::models::mass_step;

const REQUIRED_COLUMNS: [&str; 4] = ["set", "x1", "c", "mass"];

/// Summary of the loaded table (reported in the terminal and the manifest).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub n_subsets: usize,
    pub subsets: Vec<(String, usize)>,
    /// Rows with `mass > 10`.
    pub n_high_mass: usize,
    /// Rows with `mass < 10`.
    pub n_low_mass: usize,
    /// Rows whose input `mu` was a finite number.
    pub n_with_mu: usize,
    pub x1_min: f64,
    pub x1_max: f64,
    pub c_min: f64,
    pub c_max: f64,
}

impl DatasetStats {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let rows = dataset.rows();
        let (x1_min, x1_max) = min_max(rows.iter().map(|r| r.x1));
        let (c_min, c_max) = min_max(rows.iter().map(|r| r.c));

        Self {
            n_rows: rows.len(),
            n_subsets: dataset.subsets().len(),
            subsets: dataset
                .subsets()
                .iter()
                .map(|s| (s.name.clone(), s.rows.len()))
                .collect(),
            n_high_mass: rows.iter().filter(|r| mass_step(r.mass) > 0.0).count(),
            n_low_mass: rows.iter().filter(|r| mass_step(r.mass) < 0.0).count(),
            n_with_mu: rows.iter().filter(|r| r.mu.is_some()).count(),
            x1_min,
            x1_max,
            c_min,
            c_max,
        }
    }
}

/// Load the dataset from a CSV file.
pub fn load_dataset(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_dataset(file).map_err(|e| {
        AppError::new(e.exit_code(), format!("{}: {}", path.display(), e.message()))
    })
}

/// Parse the dataset from any CSV source.
pub fn read_dataset<R: Read>(source: R) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::input(format!("Missing required column: `{name}`")));
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::input(format!("line {line}: CSV parse error: {e}")))?;
        let row = parse_row(&record, &header_map).map_err(|e| AppError::input(format!("line {line}: {e}")))?;
        rows.push(row);
    }

    Dataset::from_rows(rows)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Observation, String> {
    let subset = get_required(record, header_map, "set")?.to_string();
    let x1 = parse_f64(get_required(record, header_map, "x1")?, "x1")?;
    let c = parse_f64(get_required(record, header_map, "c")?, "c")?;
    let mass = parse_f64(get_required(record, header_map, "mass")?, "mass")?;
    let mu = get_optional(record, header_map, "mu")
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite());

    Ok(Observation {
        subset,
        x1,
        c,
        mass,
        mu,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number for `{name}`: '{s}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value for `{name}`: '{s}'"))
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

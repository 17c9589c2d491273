//! Small numeric helpers shared by the fits, the trial runner, and the grids.

/// Three-valued sign: `-1`, `0` (for exactly zero), or `+1`.
///
/// Unlike `f64::signum`, zero maps to zero, so a host mass sitting exactly on
/// the step threshold contributes no step.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`). `NaN` for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// `steps` evenly spaced values over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (steps - 1) as f64;
            (0..steps)
                .map(|i| if i == steps - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

//! Descriptive statistics shared by every stage.
//!
//! Absent results are `None` rather than zero so that SQL `NULL`
//! semantics carry through to the report.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator), `None` with fewer than two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(sum_sq_diff / (values.len() - 1) as f64)
}

/// Sample standard deviation, `None` with fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Sort a copy of `values` ascending under the IEEE total order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Continuous percentile of already sorted values.
///
/// Position `q * (n - 1)` with linear interpolation between the two
/// neighbouring order statistics, as `PERCENTILE_CONT` does.
pub fn percentile_cont_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let n = sorted.len();
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let fraction = pos - lower as f64;

    if lower == upper || upper >= n {
        Some(sorted[lower.min(n - 1)])
    } else {
        Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
    }
}

/// Continuous percentile of unsorted values.
pub fn percentile_cont(values: &[f64], q: f64) -> Option<f64> {
    percentile_cont_sorted(&sorted(values), q)
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Round an optional value.
pub fn round_opt(value: Option<f64>, places: u32) -> Option<f64> {
    value.map(|v| round_to(v, places))
}

/// Division that yields `None` instead of dividing by zero.
pub fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

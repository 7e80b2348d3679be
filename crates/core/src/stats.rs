//! Shared descriptive-statistics helpers.
//!
//! Every rate and ratio in this crate guards its denominator: degenerate
//! inputs yield 0 (or the documented convention), never NaN or infinity.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). Returns 0.0 for fewer
/// than two values by convention.
pub fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_squares: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_squares / (n - 1) as f64).sqrt()
}

/// Coefficient of variation (stddev / mean). Returns 0.0 when the mean
/// is not strictly positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    sample_stddev(values) / m
}

/// Consistency score on a 0-100 scale: `max(0, 100 - CV * 100)`.
///
/// Groups of one value (or none) score 100 by convention; a zero or
/// negative mean scores 0.
pub fn consistency_score(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 100.0;
    }
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    (100.0 - coefficient_of_variation(values) * 100.0).max(0.0)
}

/// Percentage of `part` out of `total`. Returns 0.0 when `total` is zero.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

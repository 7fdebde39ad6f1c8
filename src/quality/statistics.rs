//! Intensity statistics shared by the gates.

/// Population mean and variance of `values`.
///
/// Returns `(0.0, 0.0)` for an empty input.
pub fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean: f64 = values.iter().sum::<f64>() / n;
    let variance: f64 = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;

    (mean, variance)
}

/// Population variance of 8-bit intensities.
pub fn intensity_variance(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let n = data.len() as f64;
    let mean: f64 = data.iter().map(|&b| b as f64).sum::<f64>() / n;
    data.iter().map(|&b| (b as f64 - mean).powi(2)).sum::<f64>() / n
}

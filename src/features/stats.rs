//! Descriptive statistics over R-R interval slices
//!
//! All functions are total: empty input yields 0.0 instead of NaN so the
//! feature vector never carries non-finite values from a degenerate record.

use nalgebra::DVectorView;

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    DVectorView::from(data).mean()
}

/// Population standard deviation (divides by n).
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    // Two-pass form; E[x^2] - E[x]^2 can go slightly negative on constant input.
    let centered = DVectorView::from(data).add_scalar(-mean(data));
    (centered.dot(&centered) / data.len() as f64).sqrt()
}

/// Root mean square of successive differences; 0 with fewer than two values.
pub fn rmssd(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let rr_points_a = DVectorView::from(&data[0..data.len() - 1]);
    let rr_points_b = DVectorView::from(&data[1..]);
    let successive_diffs = rr_points_b - rr_points_a;
    (successive_diffs.dot(&successive_diffs) / (successive_diffs.len() as f64)).sqrt()
}

/// Coefficient of variation in percent; 0 when the mean is 0.
pub fn coefficient_of_variation(data: &[f64]) -> f64 {
    let m = mean(data);
    if m == 0.0 {
        return 0.0;
    }
    std_dev(data) / m * 100.0
}

/// Sort a copy of the data ascending.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values = data.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Percentile with linear interpolation between the closest order
/// statistics. `sorted` must already be ascending.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

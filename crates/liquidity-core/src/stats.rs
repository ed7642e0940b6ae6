//! Numeric primitives used across the scoring pipeline.
//!
//! Every function here is total: non-finite inputs are skipped and
//! degenerate inputs (too few points, zero variance) return 0 rather
//! than erroring. Numeric trouble is absorbed at this layer so the
//! calculators above never see it.

use statrs::statistics::Statistics;

/// Natural-log offset so zero values stay finite in log space.
pub const LOG_EPSILON: f64 = 1e-12;

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean over the finite entries; 0 when none.
pub fn mean(values: &[f64]) -> f64 {
    let clean = finite(values);
    if clean.is_empty() {
        return 0.0;
    }
    clean.as_slice().mean()
}

/// Median over the finite entries; 0 when none.
pub fn median(values: &[f64]) -> f64 {
    let mut clean = finite(values);
    if clean.is_empty() {
        return 0.0;
    }
    clean.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = clean.len();
    if n % 2 == 1 {
        clean[n / 2]
    } else {
        (clean[n / 2 - 1] + clean[n / 2]) / 2.0
    }
}

/// Sample standard deviation (n-1) over the finite entries; 0 when
/// fewer than two remain.
pub fn std_dev(values: &[f64]) -> f64 {
    let clean = finite(values);
    if clean.len() < 2 {
        return 0.0;
    }
    let sd = clean.as_slice().std_dev();
    if sd.is_finite() {
        sd
    } else {
        0.0
    }
}

/// Percentile via linear interpolation on the sorted finite entries.
/// `p` is a fraction in [0, 1]; out-of-range values are clamped.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut clean = finite(values);
    if clean.is_empty() {
        return 0.0;
    }
    clean.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p = p.clamp(0.0, 1.0);
    let rank = p * (clean.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        clean[lo]
    } else {
        let frac = rank - lo as f64;
        clean[lo] + (clean[hi] - clean[lo]) * frac
    }
}

/// Pearson correlation over pairwise-finite entries; 0 when degenerate.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Coefficient of determination `1 - SS_res / SS_tot` over
/// pairwise-finite entries; 0 when the actuals have no variance.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_actual = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (a, p) in &pairs {
        ss_res += (a - p).powi(2);
        ss_tot += (a - mean_actual).powi(2);
    }
    if ss_tot <= 0.0 {
        return 0.0;
    }
    let r2 = 1.0 - ss_res / ss_tot;
    if r2.is_finite() {
        r2
    } else {
        0.0
    }
}

/// Lag-k autocovariance (biased, 1/n) over the finite entries.
pub fn autocovariance(values: &[f64], lag: usize) -> f64 {
    let clean = finite(values);
    let n = clean.len();
    if n < 2 || lag >= n {
        return 0.0;
    }
    let m = clean.as_slice().mean();
    let mut acc = 0.0;
    for i in lag..n {
        acc += (clean[i] - m) * (clean[i - lag] - m);
    }
    let cov = acc / n as f64;
    if cov.is_finite() {
        cov
    } else {
        0.0
    }
}

/// Winsorize a value series in log space.
///
/// Values are shifted by [`LOG_EPSILON`] before the log so zeros stay
/// finite, then clipped at the `k_lower`/`k_upper` percentile log
/// values. Returns the clipped log series together with the
/// exponentiated clip bounds.
pub fn log_winsorize(values: &[f64], k_lower: f64, k_upper: f64) -> (Vec<f64>, f64, f64) {
    if values.is_empty() {
        return (Vec::new(), 0.0, 0.0);
    }
    let k_lower = k_lower.clamp(0.0, 1.0);
    let k_upper = k_upper.clamp(k_lower, 1.0);

    let logs: Vec<f64> = values
        .iter()
        .map(|v| {
            if v.is_finite() {
                (v + LOG_EPSILON).ln()
            } else {
                LOG_EPSILON.ln()
            }
        })
        .collect();

    let mut sorted = logs.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let lower_idx = (k_lower * (n - 1) as f64).floor() as usize;
    let upper_idx = (k_upper * (n - 1) as f64).ceil() as usize;
    let lower_bound = sorted[lower_idx.min(n - 1)];
    let upper_bound = sorted[upper_idx.min(n - 1)];

    let clipped: Vec<f64> = logs
        .iter()
        .map(|v| v.clamp(lower_bound, upper_bound))
        .collect();

    (clipped, lower_bound.exp(), upper_bound.exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_skips_non_finite() {
        let values = vec![1.0, 2.0, f64::NAN, 3.0, f64::INFINITY];
        assert!((mean(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[f64::NAN]), 0.0);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < 1e-12);
        assert!((median(&[4.0, 1.0, 2.0, 3.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_degenerate() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn test_std_dev_sample() {
        // Sample std-dev of [2, 4, 4, 4, 5, 5, 7, 9] is ~2.138
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.13809).abs() < 1e-4);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![10.0, 20.0, 30.0, 40.0];
        assert!((percentile(&values, 0.0) - 10.0).abs() < 1e-12);
        assert!((percentile(&values, 1.0) - 40.0).abs() < 1e-12);
        // rank = 0.5 * 3 = 1.5 -> halfway between 20 and 30
        assert!((percentile(&values, 0.5) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_perfect() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![2.0, 4.0, 6.0, 8.0];
        assert!((correlation(&x, &y) - 1.0).abs() < 1e-12);

        let inv: Vec<f64> = y.iter().map(|v| -v).collect();
        assert!((correlation(&x, &inv) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_zero_variance() {
        let x = vec![1.0, 1.0, 1.0];
        let y = vec![2.0, 4.0, 6.0];
        assert_eq!(correlation(&x, &y), 0.0);
    }

    #[test]
    fn test_r_squared_perfect_fit() {
        let actual = vec![1.0, 2.0, 3.0];
        assert!((r_squared(&actual, &actual) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_no_variance() {
        let actual = vec![2.0, 2.0, 2.0];
        let predicted = vec![1.0, 2.0, 3.0];
        assert_eq!(r_squared(&actual, &predicted), 0.0);
    }

    #[test]
    fn test_autocovariance_lag_zero_is_variance() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        // Biased variance of 1..5 is 2.0
        assert!((autocovariance(&values, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_autocovariance_lag_too_large() {
        assert_eq!(autocovariance(&[1.0, 2.0], 5), 0.0);
    }

    #[test]
    fn test_log_winsorize_clips_extremes() {
        let values = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1000.0];
        let (clipped, lower, upper) = log_winsorize(&values, 0.05, 0.95);

        assert_eq!(clipped.len(), values.len());
        // The outlier's log value must be pulled down to the upper bound
        let max_clipped = clipped.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max_clipped <= upper.ln() + 1e-9);
        assert!(lower <= upper);
        assert!(upper < 1000.0);
    }

    #[test]
    fn test_log_winsorize_zero_values() {
        let values = vec![0.0, 1.0, 2.0];
        let (clipped, lower, _) = log_winsorize(&values, 0.0, 1.0);
        assert_eq!(clipped.len(), 3);
        // Zero maps to log(epsilon), not -inf
        assert!(clipped[0].is_finite());
        assert!(lower >= 0.0);
    }

    #[test]
    fn test_log_winsorize_empty() {
        let (clipped, lower, upper) = log_winsorize(&[], 0.05, 0.95);
        assert!(clipped.is_empty());
        assert_eq!(lower, 0.0);
        assert_eq!(upper, 0.0);
    }
}

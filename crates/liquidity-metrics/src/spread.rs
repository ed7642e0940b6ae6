//! Corwin-Schultz bid-ask spread estimation from daily high/low ranges.

use liquidity_core::TradingDay;

/// Two-day spread estimate as a fraction of price.
///
/// Built from the squared single-day log ranges (`beta`) and their
/// product (`gamma`); the dispersion exponent is clamped to [-10, 10]
/// before exponentiation and the spread to [0, 1]. Any invalid input
/// (non-positive, high below low) estimates 0.
pub fn corwin_schultz(h1: f64, l1: f64, h2: f64, l2: f64) -> f64 {
    let inputs = [h1, l1, h2, l2];
    if inputs.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return 0.0;
    }
    if h1 < l1 || h2 < l2 {
        return 0.0;
    }

    let k = 3.0 - 2.0 * 2.0_f64.sqrt();
    let r1 = (h1 / l1).ln();
    let r2 = (h2 / l2).ln();
    let beta = r1 * r1 + r2 * r2;
    let gamma = r1 * r2;

    let alpha = ((2.0 * beta).sqrt() - beta.sqrt()) / k - (gamma / k).sqrt();
    if !alpha.is_finite() {
        return 0.0;
    }
    let alpha = alpha.clamp(-10.0, 10.0);

    let spread = alpha.exp() - 1.0;
    if !spread.is_finite() {
        return 0.0;
    }
    spread.clamp(0.0, 1.0)
}

/// Spread estimates for every consecutive pair of trading days.
pub fn spread_series(days: &[TradingDay]) -> Vec<f64> {
    let mut series = Vec::new();
    for pair in days.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if prev.is_trading() && curr.is_trading() {
            series.push(corwin_schultz(prev.high, prev.low, curr.high, curr.low));
        }
    }
    series
}

/// Mean spread over a window; 0 when no valid pair exists.
pub fn window_spread(days: &[TradingDay]) -> f64 {
    let series = spread_series(days);
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

/// Rolling window spread: one mean per trailing `window`-day slice.
pub fn rolling_spread(days: &[TradingDay], window: usize) -> Vec<f64> {
    if window < 2 || days.len() < window {
        return Vec::new();
    }
    (window - 1..days.len())
        .map(|i| window_spread(&days[i + 1 - window..=i]))
        .collect()
}

/// Turnover-weighted window spread.
///
/// Each pair is weighted by its mean daily value so thin days do not
/// dominate the estimate; falls back to the plain mean when the window
/// carries no turnover.
pub fn volume_weighted_spread(days: &[TradingDay]) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for pair in days.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if prev.is_trading() && curr.is_trading() {
            let spread = corwin_schultz(prev.high, prev.low, curr.high, curr.low);
            let weight = (prev.value + curr.value) / 2.0;
            if weight.is_finite() && weight > 0.0 {
                weighted += spread * weight;
                total_weight += weight;
            }
        }
    }
    if total_weight > 0.0 {
        weighted / total_weight
    } else {
        window_spread(days)
    }
}

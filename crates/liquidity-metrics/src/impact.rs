//! Amihud-style price impact (ILLIQ) with penny-stock normalization
//! and data-quality penalties.

use serde::{Deserialize, Serialize};

use liquidity_core::{
    GapPenaltyConfig, TradingDay, ILLIQ_FLOOR, ILLIQ_SENTINEL, PENNY_STOCK_THRESHOLD,
    VALUE_QUALITY_THRESHOLD,
};

use crate::gaps::calculate_gap_penalty;

/// ILLIQ for one window. The winsorization bounds are part of the
/// legacy return shape: the production path reports them as 0 and
/// callers must not rely on their numeric meaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IlliqResult {
    pub illiq: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl IlliqResult {
    fn sentinel() -> Self {
        Self {
            illiq: ILLIQ_SENTINEL,
            lower_bound: 0.0,
            upper_bound: 0.0,
        }
    }
}

/// Primary entry point: ILLIQ with the gap penalty applied using the
/// default configuration.
///
/// The `k_lower`/`k_upper` winsorization bounds are accepted for
/// interface compatibility with the calibration experiments; the
/// production formula does not winsorize the ratio series.
pub fn compute_illiq(days: &[TradingDay], k_lower: f64, k_upper: f64) -> IlliqResult {
    compute_illiq_with_gap_penalty(days, k_lower, k_upper, true, None)
}

/// ILLIQ over a window of daily records.
///
/// Average of |daily return| / turnover-in-millions over consecutive
/// trading pairs, adjusted for penny-stock price levels and thin-value
/// data quality, optionally multiplied by the gap penalty. Windows that
/// cannot produce a single ratio get the worst-case sentinel.
pub fn compute_illiq_with_gap_penalty(
    days: &[TradingDay],
    _k_lower: f64,
    _k_upper: f64,
    apply_gap: bool,
    gap_config: Option<&GapPenaltyConfig>,
) -> IlliqResult {
    if days.len() < 2 {
        return IlliqResult::sentinel();
    }

    let closes: Vec<f64> = days
        .iter()
        .filter(|d| d.is_trading() && d.close > 0.0)
        .map(|d| d.close)
        .collect();
    if closes.is_empty() {
        return IlliqResult::sentinel();
    }
    let avg_price = closes.iter().sum::<f64>() / closes.len() as f64;
    let is_penny_stock = avg_price < PENNY_STOCK_THRESHOLD;

    let mut ratios = Vec::new();
    for i in 1..days.len() {
        let prev = &days[i - 1];
        let curr = &days[i];
        if !prev.is_trading() || !curr.is_trading() || prev.close <= 0.0 {
            continue;
        }

        let mut abs_return = (curr.close / prev.close - 1.0).abs();
        if abs_return == 0.0 {
            // A flat close is stale pricing, not perfect liquidity
            abs_return = if is_penny_stock { 0.01 } else { 0.001 };
        }

        let value_millions = (curr.value / 1_000_000.0).max(0.1);
        let mut ratio = abs_return / value_millions;
        if is_penny_stock && avg_price > 0.0 {
            ratio *= (PENNY_STOCK_THRESHOLD / avg_price).sqrt();
        }
        if ratio.is_finite() {
            ratios.push(ratio);
        }
    }
    if ratios.is_empty() {
        return IlliqResult::sentinel();
    }

    let low_value_days = days
        .iter()
        .filter(|d| d.value < VALUE_QUALITY_THRESHOLD)
        .count();
    let quality_multiplier =
        (1.0 + 2.0 * (low_value_days as f64 / days.len() as f64)).min(3.0);

    let mut illiq = ratios.iter().sum::<f64>() / ratios.len() as f64 * quality_multiplier;

    if apply_gap {
        let default_config = GapPenaltyConfig::default();
        let config = gap_config.unwrap_or(&default_config);
        illiq *= calculate_gap_penalty(days, config);
    }

    if !illiq.is_finite() {
        return IlliqResult::sentinel();
    }

    IlliqResult {
        illiq: illiq.max(ILLIQ_FLOOR),
        lower_bound: 0.0,
        upper_bound: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(i: usize, close: f64, value: f64) -> TradingDay {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        TradingDay {
            date: start + chrono::Duration::days(i as i64),
            symbol: "BMFI".to_string(),
            open: close,
            high: close * 1.02,
            low: close * 0.98,
            close,
            volume: 100_000.0,
            value,
            num_trades: 40,
            status: "ACTIVE".to_string(),
        }
    }

    fn suspended(i: usize) -> TradingDay {
        let mut d = day(i, 2.5, 0.0);
        d.num_trades = 0;
        d.status = "SUSPENDED".to_string();
        d
    }

    #[test]
    fn test_too_short_returns_sentinel() {
        let result = compute_illiq(&[day(0, 2.5, 5e6)], 0.05, 0.95);
        assert_eq!(result.illiq, ILLIQ_SENTINEL);
        assert_eq!(result.lower_bound, 0.0);
        assert_eq!(result.upper_bound, 0.0);
    }

    #[test]
    fn test_no_trading_days_returns_sentinel() {
        let days: Vec<TradingDay> = (0..10).map(suspended).collect();
        let result = compute_illiq(&days, 0.05, 0.95);
        assert_eq!(result.illiq, ILLIQ_SENTINEL);
    }

    #[test]
    fn test_basic_ratio_math() {
        // 1% move on 2M IQD turnover: 0.01 / 2 = 0.005
        let days = vec![day(0, 2.00, 2e6), day(1, 2.02, 2e6)];
        let result = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        assert!((result.illiq - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_zero_return_substitution() {
        // Flat closes on a normal-priced stock substitute 0.001
        let days = vec![day(0, 2.00, 2e6), day(1, 2.00, 2e6)];
        let result = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        assert!((result.illiq - 0.001 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_penny_stock_adjustment() {
        // avg price 0.2 < 0.5: ratio scaled by sqrt(0.5 / 0.2)
        let days = vec![day(0, 0.20, 2e6), day(1, 0.202, 2e6)];
        let result = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        let avg = (0.20 + 0.202) / 2.0;
        let expected = (0.202f64 / 0.20 - 1.0).abs() / 2.0 * (0.5f64 / avg).sqrt();
        assert!((result.illiq - expected).abs() < 1e-9);
    }

    #[test]
    fn test_value_floor_prevents_blowup() {
        // 10k IQD turnover is floored to 0.1M in the denominator;
        // both days below the quality threshold doubles the result
        let days = vec![day(0, 2.00, 1e4), day(1, 2.02, 1e4)];
        let result = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        let expected = 0.01 / 0.1 * 3.0;
        assert!((result.illiq - expected).abs() < 1e-6);
    }

    #[test]
    fn test_quality_multiplier_partial() {
        // Half the days under 1M IQD: multiplier 1 + 2*0.5 = 2
        let days = vec![day(0, 2.00, 5e5), day(1, 2.02, 2e6)];
        let result = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        let expected = 0.01 / 2.0 * 2.0;
        assert!((result.illiq - expected).abs() < 1e-9);
    }

    #[test]
    fn test_gap_penalty_applied() {
        let mut days: Vec<TradingDay> = (0..20).map(|i| day(i, 2.0 + i as f64 * 0.01, 5e6)).collect();
        for i in 8..13 {
            days[i] = suspended(i);
        }
        let without = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        let with = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, true, None);
        assert!(with.illiq > without.illiq);
    }

    #[test]
    fn test_floor_applied() {
        // Huge turnover drives the raw ratio below the floor
        let days = vec![day(0, 2.000, 5e9), day(1, 2.002, 5e9)];
        let result = compute_illiq_with_gap_penalty(&days, 0.05, 0.95, false, None);
        assert_eq!(result.illiq, ILLIQ_FLOOR);
    }
}

//! Safe trade sizing: how much IQD can move through a ticker before
//! price impact exceeds a stated threshold.

use liquidity_core::{
    LiquidityRating, SafeTradingLimits, TickerMetrics, TradeSchedule, MAX_TRADE_SIZE,
    MIN_TRADE_SIZE_FLOOR,
};

/// Fraction of daily turnover a single trade may consume, by hybrid
/// score band.
fn max_daily_pct(hybrid_score: f64) -> f64 {
    if hybrid_score >= 70.0 {
        0.20
    } else if hybrid_score >= 50.0 {
        0.15
    } else if hybrid_score >= 30.0 {
        0.10
    } else {
        0.05
    }
}

fn rating_for_score(hybrid_score: f64) -> LiquidityRating {
    if hybrid_score >= 80.0 {
        LiquidityRating::High
    } else if hybrid_score >= 50.0 {
        LiquidityRating::Medium
    } else if hybrid_score >= 30.0 {
        LiquidityRating::Low
    } else {
        LiquidityRating::Poor
    }
}

/// Haircut for sparse trading activity.
fn activity_adjustment(activity_score: f64) -> f64 {
    if activity_score >= 0.8 {
        1.0
    } else if activity_score >= 0.5 {
        0.85
    } else if activity_score >= 0.3 {
        0.70
    } else if activity_score >= 0.1 {
        0.50
    } else {
        0.30
    }
}

/// Haircut for wide estimated spreads.
fn spread_adjustment(spread_proxy: f64) -> f64 {
    if spread_proxy <= 0.001 {
        1.0
    } else if spread_proxy <= 0.005 {
        0.95
    } else if spread_proxy <= 0.01 {
        0.85
    } else if spread_proxy <= 0.02 {
        0.70
    } else if spread_proxy <= 0.05 {
        0.50
    } else {
        0.30
    }
}

/// Derive per-threshold trade-size limits from a metric.
///
/// The 0.5% base is `(0.005 / ILLIQ) * 1e6` IQD; the 1% and 2% limits
/// double and quadruple it. All limits are clipped at a fraction of
/// daily turnover, the optimal size is haircut by activity and spread,
/// and everything is capped at [`MAX_TRADE_SIZE`]. An unusable ILLIQ
/// produces zero limits rated INVALID.
pub fn calculate_safe_trading(m: &TickerMetrics) -> SafeTradingLimits {
    if !m.illiq.is_finite() || m.illiq <= 0.0 {
        return SafeTradingLimits {
            safe_half_pct: 0.0,
            safe_one_pct: 0.0,
            safe_two_pct: 0.0,
            optimal_trade_size: 0.0,
            max_daily_pct: 0.0,
            rating: LiquidityRating::Invalid,
        };
    }

    let base_half = (0.005 / m.illiq) * 1_000_000.0;
    let base_one = 2.0 * base_half;
    let base_two = 4.0 * base_half;

    let daily_pct = max_daily_pct(m.hybrid_score);
    let rating = rating_for_score(m.hybrid_score);
    let volume_cap = daily_pct * m.avg_value.max(0.0);

    let mut safe_half = base_half.min(volume_cap);
    let mut safe_one = base_one.min(volume_cap);
    let mut safe_two = base_two.min(volume_cap);

    let adjustment = activity_adjustment(m.activity_score) * spread_adjustment(m.spread_proxy);
    let mut optimal = safe_one * adjustment;

    // The floor only applies when the ticker's daily turnover could
    // absorb ten times it; otherwise the floor itself would be unsafe.
    if m.avg_value >= 10.0 * MIN_TRADE_SIZE_FLOOR {
        optimal = optimal.max(MIN_TRADE_SIZE_FLOOR);
    }

    safe_half = safe_half.min(MAX_TRADE_SIZE);
    safe_one = safe_one.min(MAX_TRADE_SIZE).max(safe_half);
    safe_two = safe_two.min(MAX_TRADE_SIZE).max(safe_one);
    optimal = optimal.min(MAX_TRADE_SIZE);

    SafeTradingLimits {
        safe_half_pct: safe_half,
        safe_one_pct: safe_one,
        safe_two_pct: safe_two,
        optimal_trade_size: optimal,
        max_daily_pct: daily_pct,
        rating,
    }
}

/// Expected price impact, in percent, of pushing `trade_value` IQD
/// through the ticker in one day. Pessimal (100%) when ILLIQ is
/// unusable.
pub fn estimate_impact(m: &TickerMetrics, trade_value: f64) -> f64 {
    if !m.illiq.is_finite() || m.illiq <= 0.0 || !trade_value.is_finite() || trade_value <= 0.0 {
        return 100.0;
    }
    let impact = m.illiq * (trade_value / 1_000_000.0) * 100.0;
    if impact.is_finite() {
        impact.min(100.0)
    } else {
        100.0
    }
}

/// Split a total order into daily tranches of the optimal trade size.
pub fn create_trade_schedule(m: &TickerMetrics, total_value: f64) -> TradeSchedule {
    let limits = calculate_safe_trading(m);

    if limits.rating == LiquidityRating::Invalid
        || limits.optimal_trade_size <= 0.0
        || !total_value.is_finite()
        || total_value <= 0.0
    {
        return TradeSchedule {
            total_value: total_value.max(0.0),
            daily_tranche: 0.0,
            days_required: 0,
            expected_impact_pct: 0.0,
            rating: limits.rating,
        };
    }

    let tranche = limits.optimal_trade_size.min(total_value);
    let days = (total_value / tranche).ceil() as u32;

    TradeSchedule {
        total_value,
        daily_tranche: tranche,
        days_required: days,
        expected_impact_pct: estimate_impact(m, tranche),
        rating: limits.rating,
    }
}

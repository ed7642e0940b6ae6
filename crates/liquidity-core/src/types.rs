use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::ILLIQ_SENTINEL;
use crate::error::LiquidityError;

/// One daily OHLCV record as delivered by the ingestion layer.
///
/// Records are never mutated inside the engine. A validly recorded
/// non-trading day (suspension, zero turnover) is kept: it still counts
/// toward the calendar length of a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Share volume.
    pub volume: f64,
    /// Monetary turnover in IQD.
    pub value: f64,
    pub num_trades: u64,
    /// Raw exchange status string (ACTIVE, SUSPENDED, true, false, ...).
    pub status: String,
}

impl TradingDay {
    /// Structural validity: finite numerics, non-negative volume/value,
    /// and OHLC ordering on days that actually traded.
    pub fn is_valid(&self) -> bool {
        if self.symbol.is_empty() {
            return false;
        }
        let fields = [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.value,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return false;
        }
        if self.volume < 0.0 || self.value < 0.0 {
            return false;
        }
        if self.is_trading() {
            if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
                return false;
            }
            if self.low > self.open
                || self.low > self.close
                || self.high < self.open
                || self.high < self.close
            {
                return false;
            }
        }
        true
    }

    /// A day counts as traded only when the exchange marked it active
    /// and money actually changed hands.
    pub fn is_trading(&self) -> bool {
        let active = self.status.eq_ignore_ascii_case("ACTIVE")
            || self.status.eq_ignore_ascii_case("true");
        active && self.value > 0.0 && self.num_trades > 0
    }
}

/// Rolling window length. Scoring runs on 60 days; 20 and 120 are kept
/// for short-horizon tests and long-horizon experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    Days20,
    Days60,
    Days120,
}

impl Window {
    pub fn size(&self) -> usize {
        match self {
            Window::Days20 => 20,
            Window::Days60 => 60,
            Window::Days120 => 120,
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Window::Days60
    }
}

/// Penalty curve parameters searched by the calibrator.
///
/// `beta`/`gamma`/`p_star` shape the piecewise penalty, `alpha` the
/// exponential one; the max multipliers cap both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyParams {
    pub beta: f64,
    pub gamma: f64,
    pub p_star: f64,
    pub piecewise_max: f64,
    pub alpha: f64,
    pub exponential_max: f64,
}

impl Default for PenaltyParams {
    fn default() -> Self {
        Self {
            beta: 0.4,
            gamma: 0.2,
            p_star: 0.5,
            piecewise_max: 3.0,
            alpha: 0.3,
            exponential_max: 2.5,
        }
    }
}

impl PenaltyParams {
    pub fn validate(&self) -> Result<(), LiquidityError> {
        let positive = [
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("p_star", self.p_star),
            ("alpha", self.alpha),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(LiquidityError::InvalidInput(format!(
                    "penalty parameter {} must be strictly positive, got {}",
                    name, v
                )));
            }
        }
        if self.beta > 2.0 {
            return Err(LiquidityError::InvalidInput(format!(
                "beta {} exceeds empirical bound 2.0",
                self.beta
            )));
        }
        if self.gamma > 1.0 {
            return Err(LiquidityError::InvalidInput(format!(
                "gamma {} exceeds empirical bound 1.0",
                self.gamma
            )));
        }
        if self.alpha > 1.0 {
            return Err(LiquidityError::InvalidInput(format!(
                "alpha {} exceeds empirical bound 1.0",
                self.alpha
            )));
        }
        if self.piecewise_max <= 1.0 || self.exponential_max <= 1.0 {
            return Err(LiquidityError::InvalidInput(
                "penalty max multipliers must exceed 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Component weights for the hybrid score.
///
/// `spread` is kept for calibration schema compatibility; the
/// production score ignores it (set to 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub impact: f64,
    pub value: f64,
    pub continuity: f64,
    pub spread: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            impact: 0.40,
            value: 0.35,
            continuity: 0.25,
            spread: 0.0,
        }
    }
}

impl ComponentWeights {
    pub fn validate(&self) -> Result<(), LiquidityError> {
        let parts = [self.impact, self.value, self.continuity, self.spread];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(LiquidityError::InvalidInput(
                "component weights must be finite and non-negative".to_string(),
            ));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > 1e-2 {
            return Err(LiquidityError::InvalidInput(format!(
                "component weights must sum to 1.0 (+/- 0.01), got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Configuration for the gap penalty engine.
///
/// Defaults are the calibrated production values; the forgiveness
/// fields remove small gaps before any penalty is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapPenaltyConfig {
    /// Gap length (days) fully charged at `short_rate`.
    pub short_gap: usize,
    /// Gap length (days) at which the long-range rate takes over.
    pub medium_gap: usize,
    pub short_rate: f64,
    pub medium_rate: f64,
    pub long_rate: f64,
    /// Gaps no longer than this are eligible for forgiveness.
    pub allowed_gap_length: usize,
    /// Number of eligible gaps forgiven, shortest first.
    pub allowed_gap_count: usize,
    pub frequency_penalty: bool,
    pub clustering_penalty: bool,
    pub max_penalty: f64,
}

impl Default for GapPenaltyConfig {
    fn default() -> Self {
        Self {
            short_gap: 2,
            medium_gap: 7,
            short_rate: 0.05,
            medium_rate: 0.10,
            long_rate: 0.20,
            allowed_gap_length: 2,
            allowed_gap_count: 2,
            frequency_penalty: true,
            clustering_penalty: true,
            max_penalty: 3.0,
        }
    }
}

impl GapPenaltyConfig {
    pub fn validate(&self) -> Result<(), LiquidityError> {
        if self.short_gap == 0 || self.short_gap >= self.medium_gap {
            return Err(LiquidityError::InvalidInput(format!(
                "gap thresholds must satisfy 0 < short ({}) < medium ({})",
                self.short_gap, self.medium_gap
            )));
        }
        let rates = [self.short_rate, self.medium_rate, self.long_rate];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(LiquidityError::InvalidInput(
                "gap penalty rates must be finite and non-negative".to_string(),
            ));
        }
        if !self.max_penalty.is_finite() || self.max_penalty <= 1.0 {
            return Err(LiquidityError::InvalidInput(
                "gap max_penalty must exceed 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A maximal run of consecutive non-trading days inside a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapInfo {
    pub start_index: usize,
    pub end_index: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub length: usize,
}

/// Liquidity rating band attached to safe-trade limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityRating {
    High,
    Medium,
    Low,
    Poor,
    Invalid,
}

impl LiquidityRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidityRating::High => "HIGH",
            LiquidityRating::Medium => "MEDIUM",
            LiquidityRating::Low => "LOW",
            LiquidityRating::Poor => "POOR",
            LiquidityRating::Invalid => "INVALID",
        }
    }
}

/// Recommended maximum trade sizes (IQD) for stated impact thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeTradingLimits {
    pub safe_half_pct: f64,
    pub safe_one_pct: f64,
    pub safe_two_pct: f64,
    pub optimal_trade_size: f64,
    /// Fraction of daily turnover a single trade should not exceed.
    pub max_daily_pct: f64,
    pub rating: LiquidityRating,
}

/// A multi-day execution plan for a total order value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSchedule {
    pub total_value: f64,
    pub daily_tranche: f64,
    pub days_required: u32,
    /// Expected per-tranche price impact, percent.
    pub expected_impact_pct: f64,
    pub rating: LiquidityRating,
}

/// Per-(ticker, date) scoring result.
///
/// Raw components are filled by the window pass; scaled values, the
/// hybrid score, rank and safe-trade figures by the cross-sectional
/// pass. The output layer serializes this record as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMetrics {
    pub symbol: String,
    pub date: NaiveDate,
    pub window: Window,

    pub illiq: f64,
    pub avg_value: f64,
    pub continuity: f64,
    pub continuity_nl: f64,
    pub spread_proxy: f64,
    pub activity_score: f64,

    pub illiq_scaled: f64,
    pub value_scaled: f64,
    pub continuity_scaled: f64,
    pub spread_scaled: f64,

    pub impact_penalty: f64,
    pub value_penalty: f64,

    pub hybrid_score: f64,
    pub hybrid_rank: u32,

    pub trading_days: usize,
    pub total_days: usize,
    pub avg_return: f64,
    pub return_volatility: f64,

    #[serde(rename = "safe_0.5%")]
    pub safe_trade_half_pct: f64,
    #[serde(rename = "safe_1%")]
    pub safe_trade_one_pct: f64,
    #[serde(rename = "safe_2%")]
    pub safe_trade_two_pct: f64,
    pub optimal_trade_size: f64,
}

impl TickerMetrics {
    /// Empty record with raw and scaled components zeroed.
    pub fn new(symbol: &str, date: NaiveDate, window: Window) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            window,
            illiq: 0.0,
            avg_value: 0.0,
            continuity: 0.0,
            continuity_nl: 0.0,
            spread_proxy: 0.0,
            activity_score: 0.0,
            illiq_scaled: 0.0,
            value_scaled: 0.0,
            continuity_scaled: 0.0,
            spread_scaled: 0.0,
            impact_penalty: 1.0,
            value_penalty: 1.0,
            hybrid_score: 0.0,
            hybrid_rank: 1,
            trading_days: 0,
            total_days: 0,
            avg_return: 0.0,
            return_volatility: 0.0,
            safe_trade_half_pct: 0.0,
            safe_trade_one_pct: 0.0,
            safe_trade_two_pct: 0.0,
            optimal_trade_size: 0.0,
        }
    }

    /// Sentinel record for a ticker with less data than one window.
    ///
    /// Deliberately emitted rather than dropped: downstream consumers
    /// need to see that the ticker exists but cannot be scored.
    pub fn worst_case(
        symbol: &str,
        date: NaiveDate,
        window: Window,
        total_days: usize,
        max_penalty: f64,
    ) -> Self {
        let mut m = Self::new(symbol, date, window);
        m.illiq = ILLIQ_SENTINEL;
        m.impact_penalty = max_penalty;
        m.value_penalty = max_penalty;
        m.total_days = total_days;
        m
    }

    /// True for the sentinel emitted when a ticker had less data than
    /// one full window. Distinguishable from a ticker that was merely
    /// inactive (which keeps its nonzero trading-day count).
    pub fn is_insufficient(&self) -> bool {
        self.total_days < self.window.size() && self.trading_days == 0
    }
}

//! The scoring orchestrator: group by ticker, walk rolling windows,
//! then finalize everything date by date.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use liquidity_core::stats;
use liquidity_core::{
    ComponentWeights, GapPenaltyConfig, LiquidityError, PenaltyParams, TickerMetrics, TradingDay,
    Window, DEFAULT_CALCULATION_TIMEOUT, DEFAULT_CONTINUITY_DELTA, DEFAULT_WINSORIZATION,
    MIN_OBSERVATIONS, MIN_TRADING_DAYS, SPARSE_TRADING_ILLIQ,
};
use liquidity_metrics::{
    activity_score, calculate_safe_trading, compute_illiq_with_gap_penalty, continuity_nonlinear,
    continuity_ratio, linear_scale_continuity, linear_scale_illiq, linear_scale_value,
    unified_penalty, window_spread,
};

use crate::hybrid::compose_hybrid_score;

/// Full configuration for one calculator instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorOptions {
    pub window: Window,
    pub penalty_params: PenaltyParams,
    pub weights: ComponentWeights,
    pub gap_config: GapPenaltyConfig,
    /// Winsorization percentile bounds (lower, upper), kept for the
    /// calibration experiments.
    pub winsorization: (f64, f64),
    /// Upper bound on concurrent per-ticker workers; 1 runs serially
    /// and is the only mode with a deterministic result order.
    pub max_concurrency: usize,
    pub calculation_timeout: Duration,
    /// SMA mode averages turnover over all window days (non-trading
    /// days count as zero); non-SMA averages over trading days only
    /// and applies the impact penalty in the score instead.
    pub use_sma: bool,
}

impl Default for CalculatorOptions {
    fn default() -> Self {
        Self {
            window: Window::Days60,
            penalty_params: PenaltyParams::default(),
            weights: ComponentWeights::default(),
            gap_config: GapPenaltyConfig::default(),
            winsorization: DEFAULT_WINSORIZATION,
            max_concurrency: 1,
            calculation_timeout: DEFAULT_CALCULATION_TIMEOUT,
            use_sma: true,
        }
    }
}

impl CalculatorOptions {
    pub fn validate(&self) -> Result<(), LiquidityError> {
        self.penalty_params.validate()?;
        self.weights.validate()?;
        self.gap_config.validate()?;
        let (lower, upper) = self.winsorization;
        if !(0.0..1.0).contains(&lower) || !(lower..=1.0).contains(&upper) || lower >= upper {
            return Err(LiquidityError::InvalidInput(format!(
                "winsorization bounds must satisfy 0 <= lower < upper <= 1, got ({}, {})",
                lower, upper
            )));
        }
        if self.max_concurrency == 0 {
            return Err(LiquidityError::InvalidInput(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hybrid liquidity scoring over a stream of daily records.
pub struct LiquidityCalculator {
    options: CalculatorOptions,
}

impl LiquidityCalculator {
    pub fn new(options: CalculatorOptions) -> Result<Self, LiquidityError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &CalculatorOptions {
        &self.options
    }

    /// Score every (ticker, date) pair in `data`.
    ///
    /// Fails fast on structurally bad input and on cancellation or
    /// timeout; everything below that (short tickers, dead windows,
    /// numeric anomalies) is absorbed into worst-case records or
    /// skipped windows. With `max_concurrency = 1` the output is
    /// deterministic for a given input.
    pub async fn calculate(
        &self,
        data: Vec<TradingDay>,
        cancel: &CancellationToken,
    ) -> Result<Vec<TickerMetrics>, LiquidityError> {
        let timeout = self.options.calculation_timeout;
        match tokio::time::timeout(timeout, self.calculate_inner(data, cancel)).await {
            Ok(result) => result,
            Err(_) => Err(LiquidityError::TimedOut(timeout)),
        }
    }

    async fn calculate_inner(
        &self,
        data: Vec<TradingDay>,
        cancel: &CancellationToken,
    ) -> Result<Vec<TickerMetrics>, LiquidityError> {
        self.options.validate()?;
        validate_input(&data)?;

        let tickers = group_by_ticker(data);
        tracing::info!(
            "scoring {} tickers over a {}-day window",
            tickers.len(),
            self.options.window.size()
        );

        let mut metrics = Vec::new();
        if self.options.max_concurrency > 1 {
            let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));
            let mut set = JoinSet::new();

            for (symbol, days) in tickers {
                if cancel.is_cancelled() {
                    return Err(LiquidityError::Cancelled);
                }
                let semaphore = Arc::clone(&semaphore);
                let options = self.options.clone();
                let cancel = cancel.clone();
                set.spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return Vec::new(),
                    };
                    if cancel.is_cancelled() {
                        return Vec::new();
                    }
                    compute_ticker_metrics(&symbol, &days, &options)
                });
            }

            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(ticker_metrics) => metrics.extend(ticker_metrics),
                    Err(e) => tracing::warn!("ticker worker panicked: {}", e),
                }
            }
            if cancel.is_cancelled() {
                return Err(LiquidityError::Cancelled);
            }
        } else {
            for (symbol, days) in &tickers {
                if cancel.is_cancelled() {
                    return Err(LiquidityError::Cancelled);
                }
                metrics.extend(compute_ticker_metrics(symbol, days, &self.options));
            }
        }

        Ok(cross_sectional_pass(metrics, &self.options))
    }
}

fn validate_input(data: &[TradingDay]) -> Result<(), LiquidityError> {
    if data.is_empty() {
        return Err(LiquidityError::InvalidInput(
            "no trading data provided".to_string(),
        ));
    }
    let valid = data.iter().filter(|d| d.is_valid()).count();
    if valid < MIN_OBSERVATIONS {
        return Err(LiquidityError::InvalidInput(format!(
            "need at least {} valid records, got {}",
            MIN_OBSERVATIONS, valid
        )));
    }
    if (valid as f64) < data.len() as f64 * 0.5 {
        return Err(LiquidityError::InvalidInput(format!(
            "only {} of {} records are structurally valid",
            valid,
            data.len()
        )));
    }
    Ok(())
}

/// Group valid records by symbol, each ticker sorted by date. Symbols
/// come back in lexical order so a serial run is reproducible.
fn group_by_ticker(data: Vec<TradingDay>) -> Vec<(String, Vec<TradingDay>)> {
    let mut grouped: HashMap<String, Vec<TradingDay>> = HashMap::new();
    let mut dropped = 0usize;
    for day in data {
        if day.is_valid() {
            grouped.entry(day.symbol.clone()).or_default().push(day);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::debug!("dropped {} structurally invalid records", dropped);
    }

    let mut tickers: Vec<(String, Vec<TradingDay>)> = grouped.into_iter().collect();
    tickers.sort_by(|a, b| a.0.cmp(&b.0));
    for (_, days) in tickers.iter_mut() {
        days.sort_by_key(|d| d.date);
    }
    tickers
}

/// Rolling-window metrics for one ticker. Tickers shorter than the
/// window emit a single worst-case record, as does a ticker whose
/// windows were all skipped; window-level failures are logged and
/// dropped.
fn compute_ticker_metrics(
    symbol: &str,
    days: &[TradingDay],
    options: &CalculatorOptions,
) -> Vec<TickerMetrics> {
    if days.is_empty() {
        return Vec::new();
    }
    let window_size = options.window.size();
    let last_date = days[days.len() - 1].date;

    if days.len() < window_size {
        return vec![TickerMetrics::worst_case(
            symbol,
            last_date,
            options.window,
            days.len(),
            options.gap_config.max_penalty,
        )];
    }

    let mut out = Vec::new();
    for end in (window_size - 1)..days.len() {
        let window_days = &days[end + 1 - window_size..=end];
        match compute_window_metrics(symbol, window_days, options) {
            Ok(Some(m)) => out.push(m),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "skipping window ending {} for {}: {}",
                    days[end].date,
                    symbol,
                    e
                );
            }
        }
    }

    if out.is_empty() {
        let mut worst = TickerMetrics::worst_case(
            symbol,
            last_date,
            options.window,
            days.len(),
            options.gap_config.max_penalty,
        );
        // Enough calendar data, just not enough activity: keep the
        // trading-day count so consumers can tell the two apart.
        worst.trading_days = days.iter().filter(|d| d.is_trading()).count();
        out.push(worst);
    }
    out
}

/// Raw components for one window. `Ok(None)` means the window is too
/// inactive to score and is silently skipped.
///
/// Also used by the calibrator on the tail window of each ticker.
pub fn compute_window_metrics(
    symbol: &str,
    window_days: &[TradingDay],
    options: &CalculatorOptions,
) -> Result<Option<TickerMetrics>, LiquidityError> {
    if window_days.is_empty() {
        return Ok(None);
    }
    let total_days = window_days.len();
    let trading_days = window_days.iter().filter(|d| d.is_trading()).count();
    if trading_days < MIN_TRADING_DAYS {
        return Ok(None);
    }

    let date = window_days[total_days - 1].date;
    let mut m = TickerMetrics::new(symbol, date, options.window);
    m.total_days = total_days;
    m.trading_days = trading_days;

    let (k_lower, k_upper) = options.winsorization;
    m.illiq = if trading_days < 3 {
        SPARSE_TRADING_ILLIQ
    } else {
        compute_illiq_with_gap_penalty(
            window_days,
            k_lower,
            k_upper,
            true,
            Some(&options.gap_config),
        )
        .illiq
    };

    let trading_value_sum: f64 = window_days
        .iter()
        .filter(|d| d.is_trading())
        .map(|d| d.value)
        .sum();
    m.avg_value = if options.use_sma {
        trading_value_sum / total_days as f64
    } else {
        trading_value_sum / trading_days as f64
    };

    m.continuity = continuity_ratio(trading_days, total_days);
    m.continuity_nl = continuity_nonlinear(m.continuity, DEFAULT_CONTINUITY_DELTA);
    m.spread_proxy = window_spread(window_days);
    m.activity_score = activity_score(trading_days, total_days);

    let penalty = unified_penalty(m.activity_score, options.penalty_params.piecewise_max);
    m.impact_penalty = penalty;
    m.value_penalty = penalty;

    let mut returns = Vec::new();
    for pair in window_days.windows(2) {
        if pair[0].is_trading() && pair[1].is_trading() && pair[0].close > 0.0 {
            returns.push(pair[1].close / pair[0].close - 1.0);
        }
    }
    m.avg_return = stats::mean(&returns);
    m.return_volatility = stats::std_dev(&returns);

    if !m.illiq.is_finite() || !m.avg_value.is_finite() || !m.spread_proxy.is_finite() {
        return Err(LiquidityError::Calculation(format!(
            "non-finite window metrics for {} at {}",
            symbol, date
        )));
    }
    Ok(Some(m))
}

/// Finalize all metrics date by date: scale, score, derive safe-trade
/// sizes and assign ranks. Takes ownership of the raw metrics and
/// returns the finished list; worst-case records are pinned to zero.
fn cross_sectional_pass(
    mut metrics: Vec<TickerMetrics>,
    options: &CalculatorOptions,
) -> Vec<TickerMetrics> {
    let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (i, m) in metrics.iter().enumerate() {
        by_date.entry(m.date).or_default().push(i);
    }

    for indices in by_date.values() {
        for &i in indices {
            let m = &mut metrics[i];
            if m.is_insufficient() {
                m.illiq_scaled = 0.0;
                m.value_scaled = 0.0;
                m.continuity_scaled = 0.0;
                m.spread_scaled = 0.0;
                m.hybrid_score = 0.0;
                continue;
            }

            m.illiq_scaled = linear_scale_illiq(m.illiq);
            m.value_scaled = linear_scale_value(m.avg_value);
            m.continuity_scaled = linear_scale_continuity(m.continuity_nl);
            m.hybrid_score = compose_hybrid_score(m, &options.weights, options.use_sma);

            let limits = calculate_safe_trading(m);
            m.safe_trade_half_pct = limits.safe_half_pct;
            m.safe_trade_one_pct = limits.safe_one_pct;
            m.safe_trade_two_pct = limits.safe_two_pct;
            m.optimal_trade_size = limits.optimal_trade_size;
        }

        // Descending by score; the stable sort keeps arrival order on ties
        let mut order = indices.clone();
        order.sort_by(|&a, &b| {
            metrics[b]
                .hybrid_score
                .partial_cmp(&metrics[a].hybrid_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (rank, &i) in order.iter().enumerate() {
            metrics[i].hybrid_rank = (rank + 1) as u32;
        }
    }
    metrics
}

//! Penalty parameter calibration: an outer grid over the penalty
//! curves, each candidate scored by fitting component weights against
//! the spread proxy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use liquidity_core::{ComponentWeights, LiquidityError, PenaltyParams, TradingDay};
use liquidity_engine::{compute_window_metrics, CalculatorOptions};
use liquidity_metrics::{exponential_penalty, piecewise_penalty, robust_scale};

use crate::weights::{fit_weights, WeightFitConfig, WeightFitResult, WeightObservation};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Points per parameter axis; the walk strides over them so large
    /// grids stay tractable.
    pub grid_size: usize,
    pub beta_range: (f64, f64),
    pub gamma_range: (f64, f64),
    pub p_star_range: (f64, f64),
    pub alpha_range: (f64, f64),
    pub max_concurrency: usize,
    /// Seed for the candidate shuffle; 0 seeds from the wall clock,
    /// so reproducible runs must pass a nonzero seed.
    pub random_seed: u64,
    pub weight_fit: WeightFitConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            grid_size: 6,
            beta_range: (0.1, 0.8),
            gamma_range: (0.05, 0.4),
            p_star_range: (1.0, 5.0),
            alpha_range: (0.1, 0.5),
            max_concurrency: 4,
            random_seed: 0,
            weight_fit: WeightFitConfig::default(),
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<(), LiquidityError> {
        if self.grid_size == 0 {
            return Err(LiquidityError::InvalidInput(
                "calibration grid_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(LiquidityError::InvalidInput(
                "calibration max_concurrency must be at least 1".to_string(),
            ));
        }
        for (name, (lo, hi)) in [
            ("beta", self.beta_range),
            ("gamma", self.gamma_range),
            ("p_star", self.p_star_range),
            ("alpha", self.alpha_range),
        ] {
            if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || lo > hi {
                return Err(LiquidityError::InvalidInput(format!(
                    "invalid {} range ({}, {})",
                    name, lo, hi
                )));
            }
        }
        Ok(())
    }
}

/// Winning parameter combination with its fitted weights and fit
/// quality on the full observation set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub params: PenaltyParams,
    pub weights: ComponentWeights,
    pub score: f64,
    pub correlation: f64,
    pub r_squared: f64,
}

/// Grid-search the penalty parameter space.
///
/// Candidates run on a bounded worker pool and report through a
/// channel; the collector keeps the first strictly-best score, so with
/// tied candidates the result depends on scheduling unless
/// `max_concurrency` is 1 and a nonzero seed is set. Combinations that
/// cannot be scored are skipped; the call fails only when none scored.
pub async fn calibrate(
    data_by_ticker: &HashMap<String, Vec<TradingDay>>,
    config: &CalibrationConfig,
    cancel: &CancellationToken,
) -> Result<CalibrationResult, LiquidityError> {
    config.validate()?;
    if data_by_ticker.is_empty() {
        return Err(LiquidityError::InvalidInput(
            "no ticker data to calibrate against".to_string(),
        ));
    }

    let mut tickers: Vec<(String, Vec<TradingDay>)> = data_by_ticker
        .iter()
        .map(|(symbol, days)| {
            let mut days = days.clone();
            days.sort_by_key(|d| d.date);
            (symbol.clone(), days)
        })
        .collect();
    tickers.sort_by(|a, b| a.0.cmp(&b.0));
    let tickers = Arc::new(tickers);

    let mut combos = parameter_grid(config);
    let seed = if config.random_seed != 0 {
        config.random_seed
    } else {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    };
    let mut rng = StdRng::seed_from_u64(seed);
    combos.shuffle(&mut rng);
    tracing::info!(
        "calibrating over {} parameter combinations ({} tickers)",
        combos.len(),
        tickers.len()
    );

    let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
    let (tx, mut rx) = mpsc::channel(combos.len().max(1));
    let mut set = JoinSet::new();

    for params in combos {
        if cancel.is_cancelled() {
            return Err(LiquidityError::Cancelled);
        }
        let semaphore = Arc::clone(&semaphore);
        let tickers = Arc::clone(&tickers);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let fit_config = config.weight_fit;
        set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            if cancel.is_cancelled() {
                return;
            }
            let outcome = evaluate_candidate(&tickers, &params, &fit_config);
            let _ = tx.send((params, outcome)).await;
        });
    }
    drop(tx);

    let mut best: Option<CalibrationResult> = None;
    let mut evaluated = 0usize;
    while let Some((params, outcome)) = rx.recv().await {
        evaluated += 1;
        match outcome {
            Some(fit) => {
                if best.as_ref().map_or(true, |b| fit.score > b.score) {
                    best = Some(CalibrationResult {
                        params,
                        weights: fit.weights,
                        score: fit.score,
                        correlation: fit.correlation,
                        r_squared: fit.r_squared,
                    });
                }
            }
            None => {
                tracing::debug!("skipping combination {:?}: too few scorable tickers", params);
            }
        }
    }
    while set.join_next().await.is_some() {}

    if cancel.is_cancelled() {
        return Err(LiquidityError::Cancelled);
    }
    best.ok_or_else(|| {
        LiquidityError::InvalidInput(format!(
            "no parameter combination scored validly ({} evaluated)",
            evaluated
        ))
    })
}

/// Candidate parameter sets: `grid_size` points per axis, walked at
/// stride `ceil(grid_size / 3)`. The penalty max multipliers are not
/// searched.
fn parameter_grid(config: &CalibrationConfig) -> Vec<PenaltyParams> {
    let g = config.grid_size;
    let stride = (g + 2) / 3;
    let axis = |range: (f64, f64)| -> Vec<f64> {
        (0..g)
            .step_by(stride.max(1))
            .map(|i| {
                if g == 1 {
                    range.0
                } else {
                    range.0 + (range.1 - range.0) * i as f64 / (g - 1) as f64
                }
            })
            .collect()
    };

    let fixed = PenaltyParams::default();
    let mut combos = Vec::new();
    for &beta in &axis(config.beta_range) {
        for &gamma in &axis(config.gamma_range) {
            for &p_star in &axis(config.p_star_range) {
                for &alpha in &axis(config.alpha_range) {
                    combos.push(PenaltyParams {
                        beta,
                        gamma,
                        p_star,
                        alpha,
                        piecewise_max: fixed.piecewise_max,
                        exponential_max: fixed.exponential_max,
                    });
                }
            }
        }
    }
    combos
}

/// Score one parameter combination: raw tail-window metrics per
/// ticker, penalty-adjusted, robust-scaled, then weight-fitted against
/// the spread proxy. `None` when too few tickers are scorable.
fn evaluate_candidate(
    tickers: &[(String, Vec<TradingDay>)],
    params: &PenaltyParams,
    fit_config: &WeightFitConfig,
) -> Option<WeightFitResult> {
    let options = CalculatorOptions {
        penalty_params: *params,
        ..CalculatorOptions::default()
    };
    let window = options.window.size();

    let mut adj_illiq = Vec::new();
    let mut adj_value = Vec::new();
    let mut continuity = Vec::new();
    let mut spread = Vec::new();
    for (symbol, days) in tickers {
        let tail = &days[days.len().saturating_sub(window)..];
        let m = match compute_window_metrics(symbol, tail, &options) {
            Ok(Some(m)) => m,
            _ => continue,
        };

        // Penalties are referenced to the ticker's inactivity ratio
        let inactivity = (1.0 - m.continuity).clamp(0.0, 1.0);
        adj_illiq.push(m.illiq * piecewise_penalty(inactivity, params));
        adj_value.push(m.avg_value / exponential_penalty(inactivity, params));
        continuity.push(m.continuity);
        spread.push(m.spread_proxy);
    }
    if adj_illiq.len() < 4 {
        return None;
    }

    let impact_scaled = robust_scale(&adj_illiq, true, true);
    let value_scaled = robust_scale(&adj_value, false, true);
    let continuity_scaled = robust_scale(&continuity, false, false);
    let spread_scaled = robust_scale(&spread, false, false);

    let observations: Vec<WeightObservation> = (0..adj_illiq.len())
        .map(|i| WeightObservation {
            impact: impact_scaled[i],
            value: value_scaled[i],
            continuity: continuity_scaled[i],
            spread: spread_scaled[i],
            spread_proxy: spread[i],
        })
        .collect();

    Some(fit_weights(&observations, fit_config))
}

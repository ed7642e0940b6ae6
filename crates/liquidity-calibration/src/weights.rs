//! Component weight fitting: grid search over the weight simplex,
//! cross-validated against the spread proxy.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use liquidity_core::stats::correlation;
use liquidity_core::ComponentWeights;

/// What the search optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMetric {
    Correlation,
    RSquared,
    Combined,
}

/// One scaled observation: the four component scores for a ticker plus
/// the spread proxy it is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightObservation {
    pub impact: f64,
    pub value: f64,
    pub continuity: f64,
    pub spread: f64,
    pub spread_proxy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightFitConfig {
    /// Simplex grid resolution; capped at 5 to keep the candidate
    /// count tractable.
    pub grid_resolution: usize,
    /// Cross-validation folds; the last fold absorbs the remainder.
    pub folds: usize,
    pub target: TargetMetric,
    /// Correlation weight for the Combined target.
    pub corr_weight: f64,
    /// R-squared weight for the Combined target.
    pub r2_weight: f64,
}

impl Default for WeightFitConfig {
    fn default() -> Self {
        Self {
            grid_resolution: 5,
            folds: 5,
            target: TargetMetric::Combined,
            corr_weight: 0.6,
            r2_weight: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightFitResult {
    pub weights: ComponentWeights,
    pub score: f64,
    pub correlation: f64,
    pub r_squared: f64,
}

/// Fit component weights by exhaustive simplex grid search.
///
/// Every candidate is scored by k-fold cross-validation: per fold the
/// hybrid is the weighted component sum, judged by Pearson correlation
/// against the spread proxy (R-squared is the squared correlation, the
/// fit quality of the implied linear model). Returns the default
/// weights when no candidate scores validly.
pub fn fit_weights(observations: &[WeightObservation], config: &WeightFitConfig) -> WeightFitResult {
    let fallback = WeightFitResult {
        weights: ComponentWeights::default(),
        score: 0.0,
        correlation: 0.0,
        r_squared: 0.0,
    };
    if observations.len() < 4 {
        return fallback;
    }

    let candidates = simplex_grid(config.grid_resolution.clamp(1, 5));
    let folds = fold_ranges(observations.len(), config.folds);

    let scored: Vec<(ComponentWeights, f64)> = candidates
        .par_iter()
        .map(|weights| {
            let mut fold_scores = Vec::with_capacity(folds.len());
            for (start, end) in &folds {
                let fold = &observations[*start..*end];
                if fold.len() < 2 {
                    continue;
                }
                let (corr, r2) = fold_fit(fold, weights);
                fold_scores.push(target_score(corr, r2, config));
            }
            let score = if fold_scores.is_empty() {
                f64::NEG_INFINITY
            } else {
                fold_scores.iter().sum::<f64>() / fold_scores.len() as f64
            };
            (*weights, score)
        })
        .collect();

    let best = scored
        .into_iter()
        .filter(|(_, score)| score.is_finite())
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match best {
        Some((weights, score)) => {
            let (corr, r2) = fold_fit(observations, &weights);
            WeightFitResult {
                weights,
                score,
                correlation: corr,
                r_squared: r2,
            }
        }
        None => fallback,
    }
}

/// Correlation and fit R-squared of the weighted hybrid on one slice.
fn fold_fit(fold: &[WeightObservation], weights: &ComponentWeights) -> (f64, f64) {
    let hybrid: Vec<f64> = fold
        .iter()
        .map(|o| {
            weights.impact * o.impact
                + weights.value * o.value
                + weights.continuity * o.continuity
                + weights.spread * o.spread
        })
        .collect();
    let proxy: Vec<f64> = fold.iter().map(|o| o.spread_proxy).collect();
    let corr = correlation(&hybrid, &proxy);
    (corr, corr * corr)
}

fn target_score(corr: f64, r2: f64, config: &WeightFitConfig) -> f64 {
    match config.target {
        TargetMetric::Correlation => corr.abs(),
        TargetMetric::RSquared => r2,
        TargetMetric::Combined => corr.abs() * config.corr_weight + r2 * config.r2_weight,
    }
}

/// All weight 4-tuples on the simplex at the given resolution, each
/// component floored at 0.05 and renormalized.
fn simplex_grid(resolution: usize) -> Vec<ComponentWeights> {
    let g = resolution as i64;
    let mut grid = Vec::new();
    for i in 0..=g {
        for j in 0..=(g - i) {
            for k in 0..=(g - i - j) {
                let l = g - i - j - k;
                let raw = [
                    i as f64 / g as f64,
                    j as f64 / g as f64,
                    k as f64 / g as f64,
                    l as f64 / g as f64,
                ];
                let floored: Vec<f64> = raw.iter().map(|w| w.max(0.05)).collect();
                let sum: f64 = floored.iter().sum();
                grid.push(ComponentWeights {
                    impact: floored[0] / sum,
                    value: floored[1] / sum,
                    continuity: floored[2] / sum,
                    spread: floored[3] / sum,
                });
            }
        }
    }
    grid
}

/// Contiguous fold boundaries; the last fold takes the remainder.
fn fold_ranges(len: usize, folds: usize) -> Vec<(usize, usize)> {
    let folds = folds.max(1).min((len / 2).max(1));
    let chunk = len / folds;
    (0..folds)
        .map(|f| {
            let start = f * chunk;
            let end = if f == folds - 1 { len } else { start + chunk };
            (start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Observations where impact tracks the spread proxy exactly and
    /// the other components are deterministic scatter.
    fn impact_driven(n: usize) -> Vec<WeightObservation> {
        (0..n)
            .map(|i| {
                let x = i as f64 / n as f64;
                WeightObservation {
                    impact: 100.0 - x * 100.0,
                    value: ((i * 37) % 100) as f64,
                    continuity: ((i * 53) % 100) as f64,
                    spread: ((i * 71) % 100) as f64,
                    spread_proxy: 0.001 + x * 0.02,
                }
            })
            .collect()
    }

    #[test]
    fn test_fit_finds_discriminating_component() {
        let observations = impact_driven(50);
        let config = WeightFitConfig::default();
        let result = fit_weights(&observations, &config);

        // Impact is the only informative component, so its weight wins
        assert!(result.weights.impact > result.weights.value);
        assert!(result.weights.impact > result.weights.continuity);
        assert!(result.correlation.abs() > 0.9);
        assert!(result.r_squared > 0.8);
    }

    #[test]
    fn test_weights_sum_to_one_and_respect_floor() {
        for weights in simplex_grid(5) {
            let sum = weights.impact + weights.value + weights.continuity + weights.spread;
            assert!((sum - 1.0).abs() < 1e-9);
            for w in [weights.impact, weights.value, weights.continuity, weights.spread] {
                assert!(w >= 0.04, "weight below floor: {}", w);
            }
        }
    }

    #[test]
    fn test_too_few_observations_falls_back() {
        let observations = impact_driven(3);
        let result = fit_weights(&observations, &WeightFitConfig::default());
        assert_eq!(result.weights, ComponentWeights::default());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_degenerate_observations_fall_back_or_score_zero() {
        // Constant proxy: correlation is 0 everywhere
        let observations: Vec<WeightObservation> = (0..20)
            .map(|i| WeightObservation {
                impact: i as f64,
                value: 50.0,
                continuity: 50.0,
                spread: 50.0,
                spread_proxy: 0.01,
            })
            .collect();
        let result = fit_weights(&observations, &WeightFitConfig::default());
        assert!(result.score.abs() < 1e-9);
    }

    #[test]
    fn test_fold_ranges_cover_everything() {
        let ranges = fold_ranges(23, 5);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[0], (0, 4));
        assert_eq!(ranges[4], (16, 23));
        let total: usize = ranges.iter().map(|(s, e)| e - s).sum();
        assert_eq!(total, 23);
    }

    #[test]
    fn test_target_metric_variants() {
        let config = WeightFitConfig {
            target: TargetMetric::Correlation,
            ..WeightFitConfig::default()
        };
        assert!((target_score(-0.8, 0.64, &config) - 0.8).abs() < 1e-12);

        let config = WeightFitConfig {
            target: TargetMetric::RSquared,
            ..WeightFitConfig::default()
        };
        assert!((target_score(-0.8, 0.64, &config) - 0.64).abs() < 1e-12);

        let config = WeightFitConfig {
            target: TargetMetric::Combined,
            corr_weight: 0.6,
            r2_weight: 0.4,
            ..WeightFitConfig::default()
        };
        let expected = 0.8 * 0.6 + 0.64 * 0.4;
        assert!((target_score(-0.8, 0.64, &config) - expected).abs() < 1e-12);
    }
}

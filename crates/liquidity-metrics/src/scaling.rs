//! Piecewise-linear maps from raw components onto [0, 100], plus the
//! generic robust scaler used by the calibrator.
//!
//! The linear maps are per-value transforms with fixed breakpoints
//! calibrated to ISX turnover levels; they do not depend on the
//! cross-section but are invoked inside the cross-sectional pass so
//! the pipeline stays uniform.

use liquidity_core::stats::{percentile, LOG_EPSILON};

/// Inverted ILLIQ map: lower impact scores higher.
///
/// Bands: `<= 1e-3` maps 100->90, `<= 1e-2` 90->70, `<= 1e-1` 70->40,
/// `<= 1` 40->10, `<= 10` log-decays 10->0, above 10 scores 0.
pub fn linear_scale_illiq(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    if v <= 0.0 {
        return 100.0;
    }
    let score = if v <= 1e-3 {
        100.0 - (v / 1e-3) * 10.0
    } else if v <= 1e-2 {
        90.0 - ((v - 1e-3) / 9e-3) * 20.0
    } else if v <= 1e-1 {
        70.0 - ((v - 1e-2) / 9e-2) * 30.0
    } else if v <= 1.0 {
        40.0 - ((v - 1e-1) / 0.9) * 30.0
    } else if v <= 10.0 {
        10.0 * (1.0 - v.log10())
    } else {
        0.0
    };
    score.clamp(0.0, 100.0)
}

/// Turnover map (IQD): higher is better.
///
/// `>= 5e8` scores 100; bands step down through 1e8 / 1e7 / 1e6 and
/// turnover under 1M IQD scales linearly into the bottom 20 points.
pub fn linear_scale_value(v: f64) -> f64 {
    if !v.is_finite() || v < 0.0 {
        return 0.0;
    }
    let score = if v >= 5e8 {
        100.0
    } else if v >= 1e8 {
        70.0 + ((v - 1e8) / 4e8) * 30.0
    } else if v >= 1e7 {
        40.0 + ((v - 1e7) / 9e7) * 30.0
    } else if v >= 1e6 {
        20.0 + ((v - 1e6) / 9e6) * 20.0
    } else {
        (v / 1e6) * 20.0
    };
    score.clamp(0.0, 100.0)
}

/// Continuity map: the ratio itself, in points.
pub fn linear_scale_continuity(c: f64) -> f64 {
    if !c.is_finite() {
        return 0.0;
    }
    (c * 100.0).clamp(0.0, 100.0)
}

/// Robust min-max scaler onto [0, 100] using the 5th/95th percentiles,
/// with optional log10 transform and inversion. Degenerate series
/// (no dispersion between the percentile anchors) scale to a neutral
/// 50. Used by the calibrator, where component distributions vary
/// with the candidate parameters.
pub fn robust_scale(values: &[f64], invert: bool, log: bool) -> Vec<f64> {
    let transformed: Vec<f64> = values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return f64::NAN;
            }
            if log {
                (v.max(0.0) + LOG_EPSILON).log10()
            } else {
                *v
            }
        })
        .collect();

    let lo = percentile(&transformed, 0.05);
    let hi = percentile(&transformed, 0.95);
    let span = hi - lo;

    transformed
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return 0.0;
            }
            let scaled = if span > 0.0 {
                ((v - lo) / span * 100.0).clamp(0.0, 100.0)
            } else {
                50.0
            };
            if invert {
                100.0 - scaled
            } else {
                scaled
            }
        })
        .collect()
}

//! Hybrid score composition from the scaled components.

use liquidity_core::{ComponentWeights, TickerMetrics};

/// Compose the 0-100 hybrid score for one metric.
///
/// Inputs are the scaled components, clamped to [0, 100] first. In SMA
/// mode (the default) continuity is already folded into the value
/// average, so low continuity instead discounts the impact and value
/// components through an activity multiplier. In non-SMA mode the
/// unified impact penalty divides them directly. The `spread` weight is
/// carried for calibration compatibility but takes no part here.
pub fn compose_hybrid_score(m: &TickerMetrics, weights: &ComponentWeights, use_sma: bool) -> f64 {
    let impact = m.illiq_scaled.clamp(0.0, 100.0);
    let value = m.value_scaled.clamp(0.0, 100.0);
    let continuity = m.continuity_scaled.clamp(0.0, 100.0);

    let (adj_impact, adj_value) = if use_sma {
        let mult = activity_multiplier(continuity);
        (impact * mult, value * mult)
    } else {
        let penalty = m.impact_penalty.max(1.0);
        (impact / penalty, value / penalty)
    };

    let score =
        weights.impact * adj_impact + weights.value * adj_value + weights.continuity * continuity;
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// SMA-branch discount for thin continuity: full credit at 30 points
/// and above, a linear ramp through [10, 30), and a proportional
/// collapse below 10.
fn activity_multiplier(continuity_scaled: f64) -> f64 {
    if continuity_scaled >= 30.0 {
        1.0
    } else if continuity_scaled >= 10.0 {
        0.7 + (continuity_scaled - 10.0) * 0.015
    } else {
        continuity_scaled / 10.0
    }
}

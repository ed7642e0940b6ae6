//! Inactivity penalty curves.
//!
//! All penalties are multipliers: 1.0 means no penalty, and every
//! function clamps its output to `[1, max]`. Invalid inputs produce 1.0
//! so a bad ratio can never reward a ticker.

use liquidity_core::PenaltyParams;

/// Piecewise-linear penalty in the inactivity ratio `p0` in [0, 1].
///
/// Below the knee `p_star` the penalty rises at rate `beta`; above it
/// the remaining range is charged at `gamma`.
pub fn piecewise_penalty(p0: f64, params: &PenaltyParams) -> f64 {
    if !p0.is_finite() || !(0.0..=1.0).contains(&p0) {
        return 1.0;
    }
    let p_star = params.p_star;
    let penalty = if p0 <= p_star {
        1.0 + params.beta * (p0 / p_star)
    } else if p_star < 1.0 {
        1.0 + params.beta + params.gamma * ((p0 - p_star) / (1.0 - p_star))
    } else {
        1.0 + params.beta
    };
    if penalty.is_finite() {
        penalty.clamp(1.0, params.piecewise_max)
    } else {
        1.0
    }
}

/// Exponential penalty `exp(alpha * p0)` in the inactivity ratio.
pub fn exponential_penalty(p0: f64, params: &PenaltyParams) -> f64 {
    if !p0.is_finite() || !(0.0..=1.0).contains(&p0) {
        return 1.0;
    }
    let penalty = (params.alpha * p0).exp();
    if penalty.is_finite() {
        penalty.clamp(1.0, params.exponential_max)
    } else {
        1.0
    }
}

/// Activity score in [0, 1] from trading-day counts.
///
/// Base is `sqrt(trading/total)`; a bonus of up to +0.10 rewards the
/// mid-continuity band (ramping 0.3 -> 0.5 -> 0.7 at slope 0.5, which
/// keeps the total monotone in the trading-day count), and continuity
/// below 0.1 decays the score exponentially.
pub fn activity_score(trading_days: usize, total_days: usize) -> f64 {
    if total_days == 0 || trading_days == 0 {
        return 0.0;
    }
    let c = (trading_days as f64 / total_days as f64).clamp(0.0, 1.0);
    let mut score = c.sqrt();

    if c > 0.3 && c <= 0.7 {
        let bonus = if c <= 0.5 {
            0.5 * (c - 0.3)
        } else {
            0.5 * (0.7 - c)
        };
        score += bonus;
    }

    if c < 0.1 {
        score *= (-3.0 * (0.1 - c) / 0.1).exp();
    }

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Activity-score-based penalty used by the production scoring path.
///
/// `1 + (max - 1) * exp(-3 * activity)`: fully active tickers approach
/// 1.0, dead tickers approach `max_penalty`.
pub fn unified_penalty(activity: f64, max_penalty: f64) -> f64 {
    if !activity.is_finite() || !max_penalty.is_finite() || max_penalty <= 1.0 {
        return 1.0;
    }
    let penalty = 1.0 + (max_penalty - 1.0) * (-3.0 * activity.clamp(0.0, 1.0)).exp();
    if penalty.is_finite() {
        penalty.clamp(1.0, max_penalty)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PenaltyParams {
        PenaltyParams {
            beta: 0.4,
            gamma: 0.2,
            p_star: 0.5,
            piecewise_max: 3.0,
            alpha: 0.3,
            exponential_max: 2.5,
        }
    }

    #[test]
    fn test_piecewise_below_knee() {
        let p = params();
        // p0 = 0.25, knee at 0.5: 1 + 0.4 * 0.5 = 1.2
        assert!((piecewise_penalty(0.25, &p) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_piecewise_above_knee() {
        let p = params();
        // p0 = 0.75: 1 + 0.4 + 0.2 * 0.5 = 1.5
        assert!((piecewise_penalty(0.75, &p) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_piecewise_invalid_ratio() {
        let p = params();
        assert_eq!(piecewise_penalty(-0.1, &p), 1.0);
        assert_eq!(piecewise_penalty(1.5, &p), 1.0);
        assert_eq!(piecewise_penalty(f64::NAN, &p), 1.0);
    }

    #[test]
    fn test_penalties_bounded() {
        let p = params();
        for i in 0..=100 {
            let p0 = i as f64 / 100.0;
            let pw = piecewise_penalty(p0, &p);
            let ex = exponential_penalty(p0, &p);
            assert!(pw >= 1.0 && pw <= p.piecewise_max);
            assert!(ex >= 1.0 && ex <= p.exponential_max);
        }
    }

    #[test]
    fn test_exponential_at_zero() {
        let p = params();
        assert!((exponential_penalty(0.0, &p) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_activity_score_boundaries() {
        assert_eq!(activity_score(0, 60), 0.0);
        assert!((activity_score(60, 60) - 1.0).abs() < 1e-12);
        assert_eq!(activity_score(10, 0), 0.0);
    }

    #[test]
    fn test_activity_score_monotone_in_trading_days() {
        let n = 60;
        let mut prev = 0.0;
        for k in 0..=n {
            let score = activity_score(k, n);
            assert!(
                score >= prev - 1e-12,
                "activity score decreased at k={}: {} < {}",
                k,
                score,
                prev
            );
            assert!((0.0..=1.0).contains(&score));
            prev = score;
        }
    }

    #[test]
    fn test_activity_score_mid_band_bonus() {
        // Continuity 0.5 gets the full bonus over the plain sqrt
        let mid = activity_score(30, 60);
        assert!((mid - (0.5f64.sqrt() + 0.10)).abs() < 1e-9);
    }

    #[test]
    fn test_unified_penalty_extremes() {
        // Dead ticker: penalty approaches the cap
        let dead = unified_penalty(0.0, 3.0);
        assert!((dead - 3.0).abs() < 1e-12);

        // Fully active: exp(-3) leaves only a small residual penalty
        let active = unified_penalty(1.0, 3.0);
        assert!(active > 1.0 && active < 1.2);
    }

    #[test]
    fn test_unified_penalty_invalid() {
        assert_eq!(unified_penalty(f64::NAN, 3.0), 1.0);
        assert_eq!(unified_penalty(0.5, 1.0), 1.0);
        assert_eq!(unified_penalty(0.5, f64::INFINITY), 1.0);
    }
}

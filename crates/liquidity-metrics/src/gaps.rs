//! Gap detection and the compound gap penalty.

use liquidity_core::{GapInfo, GapPenaltyConfig, TradingDay};

/// Scan a window for maximal runs of non-trading days.
///
/// A gap still open at the end of the window is emitted on close.
pub fn find_gaps(days: &[TradingDay]) -> Vec<GapInfo> {
    let mut gaps = Vec::new();
    let mut start: Option<usize> = None;

    for (i, day) in days.iter().enumerate() {
        if !day.is_trading() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            gaps.push(gap_info(days, s, i - 1));
        }
    }
    if let Some(s) = start {
        gaps.push(gap_info(days, s, days.len() - 1));
    }
    gaps
}

fn gap_info(days: &[TradingDay], start: usize, end: usize) -> GapInfo {
    GapInfo {
        start_index: start,
        end_index: end,
        start_date: days[start].date,
        end_date: days[end].date,
        length: end - start + 1,
    }
}

/// Remove up to `allowed_gap_count` gaps of length at most
/// `allowed_gap_length`, shortest-eligible first. Forgiving the small
/// gaps (rather than the largest) is deliberate leniency: a ticker with
/// one long halt and a couple of stray holidays keeps only the halt.
fn forgive_gaps(gaps: Vec<GapInfo>, config: &GapPenaltyConfig) -> Vec<GapInfo> {
    if config.allowed_gap_count == 0 || config.allowed_gap_length == 0 {
        return gaps;
    }

    let mut eligible: Vec<(usize, usize)> = gaps
        .iter()
        .enumerate()
        .filter(|(_, g)| g.length <= config.allowed_gap_length)
        .map(|(i, g)| (g.length, i))
        .collect();
    eligible.sort();

    let forgiven: Vec<usize> = eligible
        .into_iter()
        .take(config.allowed_gap_count)
        .map(|(_, i)| i)
        .collect();

    gaps.into_iter()
        .enumerate()
        .filter(|(i, _)| !forgiven.contains(i))
        .map(|(_, g)| g)
        .collect()
}

/// Length-tiered multiplier for a single gap.
fn length_penalty(length: usize, config: &GapPenaltyConfig) -> f64 {
    let short = config.short_gap;
    let medium = config.medium_gap;
    if length <= short {
        1.0 + length as f64 * config.short_rate
    } else if length <= medium {
        1.0 + short as f64 * config.short_rate + (length - short) as f64 * config.medium_rate
    } else {
        1.0 + short as f64 * config.short_rate
            + (medium - short) as f64 * config.medium_rate
            + (length - medium) as f64 * config.long_rate
    }
}

/// Compound gap penalty for a window: per-gap length tiers (product),
/// optional frequency and clustering adjustments, capped at
/// `max_penalty`. Windows with no gaps, or whose gaps are all
/// forgiven, cost exactly 1.0.
pub fn calculate_gap_penalty(days: &[TradingDay], config: &GapPenaltyConfig) -> f64 {
    if days.is_empty() {
        return 1.0;
    }
    let gaps = find_gaps(days);
    if gaps.is_empty() {
        return 1.0;
    }
    let surviving = forgive_gaps(gaps, config);
    if surviving.is_empty() {
        return 1.0;
    }

    let mut penalty = 1.0;
    for gap in &surviving {
        penalty *= length_penalty(gap.length, config);
    }

    if config.frequency_penalty {
        let freq = surviving.len() as f64 / days.len() as f64;
        penalty *= 1.0 + 0.5 * freq.sqrt();
    }

    if config.clustering_penalty {
        penalty *= clustering_multiplier(days);
    }

    if !penalty.is_finite() || penalty < 1.0 {
        return 1.0;
    }
    penalty.min(config.max_penalty)
}

/// Clustered outages are worse than scattered ones: variance of the
/// non-trading-day indices around the window midpoint, normalized by
/// the uniform-spread maximum `n^2 / 12`, drives up to +30%.
fn clustering_multiplier(days: &[TradingDay]) -> f64 {
    let n = days.len() as f64;
    let idle: Vec<f64> = days
        .iter()
        .enumerate()
        .filter(|(_, d)| !d.is_trading())
        .map(|(i, _)| i as f64)
        .collect();
    if idle.is_empty() {
        return 1.0;
    }

    let mid = (n - 1.0) / 2.0;
    let var = idle.iter().map(|i| (i - mid).powi(2)).sum::<f64>() / idle.len() as f64;
    let max_var = n * n / 12.0;
    if max_var <= 0.0 {
        return 1.0;
    }
    let ratio = (var / max_var).clamp(0.0, 1.0);
    1.0 + 0.3 * (1.0 - ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use liquidity_core::TradingDay;

    /// Build a window from a trading mask; `true` = traded that day.
    fn window(mask: &[bool]) -> Vec<TradingDay> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        mask.iter()
            .enumerate()
            .map(|(i, &trading)| TradingDay {
                date: start + chrono::Duration::days(i as i64),
                symbol: "TASC".to_string(),
                open: 2.5,
                high: 2.6,
                low: 2.4,
                close: 2.5,
                volume: if trading { 100_000.0 } else { 0.0 },
                value: if trading { 2_000_000.0 } else { 0.0 },
                num_trades: if trading { 50 } else { 0 },
                status: if trading { "ACTIVE" } else { "SUSPENDED" }.to_string(),
            })
            .collect()
    }

    /// Length-tier config with forgiveness and adjustments off.
    fn plain_config() -> GapPenaltyConfig {
        GapPenaltyConfig {
            allowed_gap_length: 0,
            allowed_gap_count: 0,
            frequency_penalty: false,
            clustering_penalty: false,
            ..GapPenaltyConfig::default()
        }
    }

    fn mask_with_gap(total: usize, gap_start: usize, gap_len: usize) -> Vec<bool> {
        (0..total)
            .map(|i| !(i >= gap_start && i < gap_start + gap_len))
            .collect()
    }

    #[test]
    fn test_no_gaps_is_unity() {
        let days = window(&[true; 20]);
        assert_eq!(calculate_gap_penalty(&days, &GapPenaltyConfig::default()), 1.0);
    }

    #[test]
    fn test_find_gaps_trailing() {
        let mut mask = vec![true; 10];
        mask[7] = false;
        mask[8] = false;
        mask[9] = false;
        let gaps = find_gaps(&window(&mask));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_index, 7);
        assert_eq!(gaps[0].end_index, 9);
        assert_eq!(gaps[0].length, 3);
    }

    #[test]
    fn test_five_day_gap_penalty() {
        // 1 + 2*0.05 + 3*0.10 = 1.40
        let days = window(&mask_with_gap(20, 5, 5));
        let penalty = calculate_gap_penalty(&days, &plain_config());
        assert!((penalty - 1.40).abs() < 1e-9);
    }

    #[test]
    fn test_ten_day_gap_penalty() {
        // 1 + 2*0.05 + 5*0.10 + 3*0.20 = 2.20
        let days = window(&mask_with_gap(30, 5, 10));
        let penalty = calculate_gap_penalty(&days, &plain_config());
        assert!((penalty - 2.20).abs() < 1e-9);
    }

    #[test]
    fn test_forgiveness_shortest_first() {
        // Two 5-day gaps, one forgivable: product collapses to a single 1.40
        let mut mask = vec![true; 30];
        for i in 5..10 {
            mask[i] = false;
        }
        for i in 18..23 {
            mask[i] = false;
        }
        let config = GapPenaltyConfig {
            allowed_gap_length: 5,
            allowed_gap_count: 1,
            frequency_penalty: false,
            clustering_penalty: false,
            ..GapPenaltyConfig::default()
        };
        let penalty = calculate_gap_penalty(&window(&mask), &config);
        assert!((penalty - 1.40).abs() < 1e-9);
    }

    #[test]
    fn test_forgiveness_prefers_shortest() {
        // A 2-day and a 6-day gap; only the 2-day one is forgivable
        let mut mask = vec![true; 30];
        mask[3] = false;
        mask[4] = false;
        for i in 12..18 {
            mask[i] = false;
        }
        let config = GapPenaltyConfig {
            allowed_gap_length: 6,
            allowed_gap_count: 1,
            frequency_penalty: false,
            clustering_penalty: false,
            ..GapPenaltyConfig::default()
        };
        // 6-day gap survives: 1 + 2*0.05 + 4*0.10 = 1.50
        let penalty = calculate_gap_penalty(&window(&mask), &config);
        assert!((penalty - 1.50).abs() < 1e-9);
    }

    #[test]
    fn test_all_gaps_forgiven_is_unity() {
        let mut mask = vec![true; 20];
        mask[5] = false;
        mask[12] = false;
        let config = GapPenaltyConfig {
            allowed_gap_length: 2,
            allowed_gap_count: 2,
            ..GapPenaltyConfig::default()
        };
        assert_eq!(calculate_gap_penalty(&window(&mask), &config), 1.0);
    }

    #[test]
    fn test_frequency_penalty_increases() {
        let mut config = plain_config();
        let days = window(&mask_with_gap(20, 5, 5));
        let base = calculate_gap_penalty(&days, &config);
        config.frequency_penalty = true;
        let with_freq = calculate_gap_penalty(&days, &config);
        assert!(with_freq > base);
    }

    #[test]
    fn test_clustering_penalty_favors_spread_out_gaps() {
        let mut config = plain_config();
        config.clustering_penalty = true;

        // Clustered: both idle days adjacent to the midpoint
        let mut clustered = vec![true; 21];
        clustered[9] = false;
        clustered[10] = false;

        // Dispersed: idle days at the edges
        let mut dispersed = vec![true; 21];
        dispersed[0] = false;
        dispersed[20] = false;

        let p_clustered = calculate_gap_penalty(&window(&clustered), &config);
        let p_dispersed = calculate_gap_penalty(&window(&dispersed), &config);
        assert!(p_clustered > p_dispersed);
    }

    #[test]
    fn test_capped_at_max_penalty() {
        let mut config = plain_config();
        config.max_penalty = 1.5;
        let days = window(&mask_with_gap(30, 5, 10));
        assert_eq!(calculate_gap_penalty(&days, &config), 1.5);
    }
}

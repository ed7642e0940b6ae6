//! Contract constants shared across the scoring pipeline.

use std::time::Duration;

/// Default winsorization percentile bounds (lower, upper).
pub const DEFAULT_WINSORIZATION: (f64, f64) = (0.05, 0.95);

/// Default exponent parameter for the non-linear continuity transform.
pub const DEFAULT_CONTINUITY_DELTA: f64 = 0.5;

/// Minimum number of valid records required for a calculation to start.
pub const MIN_OBSERVATIONS: usize = 10;

/// Minimum trading days inside a window for it to be scored at all.
pub const MIN_TRADING_DAYS: usize = 5;

/// Default wall-clock budget for a full calculation.
pub const DEFAULT_CALCULATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Worst-case ILLIQ assigned when a ticker has too little data to score.
pub const ILLIQ_SENTINEL: f64 = 1000.0;

/// Lower bound applied to every computed ILLIQ value.
pub const ILLIQ_FLOOR: f64 = 1e-4;

/// ILLIQ assigned when a window has fewer than 3 trading days.
pub const SPARSE_TRADING_ILLIQ: f64 = 1e6;

/// Daily turnover (IQD) below which a day counts against data quality.
pub const VALUE_QUALITY_THRESHOLD: f64 = 1_000_000.0;

/// Average close (IQD) below which a ticker is treated as a penny stock.
pub const PENNY_STOCK_THRESHOLD: f64 = 0.5;

/// Upper bound on any recommended trade size (IQD).
pub const MAX_TRADE_SIZE: f64 = 100_000_000.0;

/// Minimum useful trade size (IQD); applied only when daily turnover
/// supports at least ten times this amount.
pub const MIN_TRADE_SIZE_FLOOR: f64 = 100_000.0;

use crate::{LiquidityError, TickerMetrics, TradingDay};
use async_trait::async_trait;

/// Boundary trait for the ingestion layer (CSV scanners, archives).
/// The engine only requires the semantic invariants of [`TradingDay`];
/// where the rows come from is the implementor's business.
#[async_trait]
pub trait TradingDataSource: Send + Sync {
    async fn read_trading_days(&self) -> Result<Vec<TradingDay>, LiquidityError>;
}

/// Boundary trait for the output layer (CSV/JSON writers, reports).
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn write_metrics(&self, metrics: &[TickerMetrics]) -> Result<(), LiquidityError>;
}

use async_trait::async_trait;
use crate::{AnalysisError, PriceSeries};

/// Source of daily close history for a symbol.
///
/// Implementations return a fully materialized series or fail; retries and
/// timeouts are their own business.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_daily_closes(&self, symbol: &str) -> Result<PriceSeries, AnalysisError>;
}

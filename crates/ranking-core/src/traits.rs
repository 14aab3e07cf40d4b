use async_trait::async_trait;
use crate::{MarketSnapshot, RankingError};

/// Source of the raw ETF screener snapshot
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot, RankingError>;
}

use chrono::{DateTime, Utc};
use etf_scoring::{build_etf_entries, find_empty_indicators, EtfScorer};
use market_data_client::MarketDataClient;
use ranking_core::{MarketDataSource, MarketSnapshot, RankedEtf, RankingError};
use std::sync::Arc;
use std::time::Duration;

pub mod cache;
pub mod config;


pub use cache::{CachedValue, TtlCache};
pub use config::RankingConfig;

/// Cache key of the full ranking
pub const RANKING_CACHE_KEY: &str = "ranking";

/// How long a computed ranking is served before the next refresh
pub const RANKING_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Fetches the screener snapshot, ranks it, and caches the result
pub struct RankingService {
    source: Arc<dyn MarketDataSource>,
    scorer: Arc<EtfScorer>,
    cache: TtlCache<Vec<RankedEtf>>,
    cache_ttl: Duration,
}

impl RankingService {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self::with_config(source, &RankingConfig::default())
    }

    pub fn with_config(source: Arc<dyn MarketDataSource>, config: &RankingConfig) -> Self {
        Self {
            source,
            scorer: Arc::new(EtfScorer::new()),
            cache: TtlCache::new(config.load_timeout),
            cache_ttl: config.cache_ttl,
        }
    }

    /// Service backed by the live screener endpoint
    pub fn from_config(config: &RankingConfig) -> Self {
        let url = config
            .market_data_url
            .clone()
            .unwrap_or_else(market_data_client::screener_url);
        let client = MarketDataClient::with_url(url, config.http_timeout);
        Self::with_config(Arc::new(client), config)
    }

    /// Replace the canonical scorer, e.g. with a custom policy
    pub fn with_scorer(mut self, scorer: EtfScorer) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    /// Full ranking, best first. Served from cache while fresh; concurrent
    /// callers during a refresh share one upstream fetch.
    pub async fn fetch_ranked_etfs(&self) -> Result<Arc<Vec<RankedEtf>>, RankingError> {
        let source = self.source.clone();
        let scorer = self.scorer.clone();

        self.cache
            .fetch_with_cache(RANKING_CACHE_KEY, self.cache_ttl, move || async move {
                let snapshot = source.fetch_snapshot().await?;
                let entries = build_etf_entries(snapshot.data.data);
                let ranked = scorer.score(entries);
                tracing::info!("Ranked {} ETFs", ranked.len());
                Ok(ranked)
            })
            .await
    }

    /// One ranked ETF, matched case-insensitively
    pub async fn find_etf(&self, symbol: &str) -> Result<RankedEtf, RankingError> {
        let symbol = symbol.trim();
        let ranked = self.fetch_ranked_etfs().await?;
        ranked
            .iter()
            .find(|etf| etf.symbol.eq_ignore_ascii_case(symbol))
            .cloned()
            .ok_or_else(|| RankingError::NotFound(symbol.to_string()))
    }

    /// The provider payload as received, uncached
    pub async fn market_snapshot(&self) -> Result<MarketSnapshot, RankingError> {
        self.source.fetch_snapshot().await
    }

    /// Indicators that no ETF in a fresh snapshot carries a value for
    pub async fn empty_indicators(&self) -> Result<Vec<String>, RankingError> {
        let snapshot = self.source.fetch_snapshot().await?;
        let empty = find_empty_indicators(&snapshot);
        if !empty.is_empty() {
            tracing::warn!("{} indicators have no data: {:?}", empty.len(), empty);
        }
        Ok(empty)
    }

    /// When the cached ranking was computed, if there is one
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.read(RANKING_CACHE_KEY).map(|cached| cached.updated_at)
    }

    /// Drop the cached ranking so the next call refetches
    pub fn reset(&self) {
        self.cache.clear();
    }
}

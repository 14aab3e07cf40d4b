use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    /// Screener endpoint; `None` uses the built-in URL
    pub market_data_url: Option<String>,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    /// Upper bound on one ranking load, fetch included
    pub load_timeout: Duration,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            market_data_url: None,
            http_timeout: Duration::from_secs(30),
            cache_ttl: crate::RANKING_CACHE_TTL,
            load_timeout: Duration::from_secs(60),
        }
    }
}

impl RankingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match var(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw)),
                None => Ok(default),
            }
        };

        Ok(Self {
            market_data_url: var("MARKET_DATA_URL").filter(|url| !url.trim().is_empty()),
            http_timeout: secs("MARKET_DATA_HTTP_TIMEOUT_SECS", defaults.http_timeout)?,
            cache_ttl: secs("RANKING_CACHE_TTL_SECS", defaults.cache_ttl)?,
            load_timeout: secs("RANKING_LOAD_TIMEOUT_SECS", defaults.load_timeout)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<RankingConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RankingConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, RankingConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("MARKET_DATA_URL", "http://localhost:9000/screener.json"),
            ("RANKING_CACHE_TTL_SECS", "120"),
            ("RANKING_LOAD_TIMEOUT_SECS", " 10 "),
        ])
        .unwrap();
        assert_eq!(config.market_data_url.as_deref(), Some("http://localhost:9000/screener.json"));
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.load_timeout, Duration::from_secs(10));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = config(&[("RANKING_CACHE_TTL_SECS", "fifteen minutes")]).unwrap_err();
        assert!(err.to_string().contains("RANKING_CACHE_TTL_SECS"));
    }

    #[test]
    fn test_blank_url_uses_builtin() {
        assert_eq!(config(&[("MARKET_DATA_URL", "  ")]).unwrap().market_data_url, None);
    }
}

use async_trait::async_trait;
use ranking_core::{MarketDataSource, MarketSnapshot, RankingError, SCREENER_FIELDS};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const SCREENER_BASE_URL: &str = "https://stockanalysis.com/api/screener/e/bd";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_WAIT_SECS: u64 = 5;

/// Full screener URL: every requested field joined with `+`
pub fn screener_url() -> String {
    format!("{}/{}.json", SCREENER_BASE_URL, SCREENER_FIELDS.join("+"))
}

/// Decode a screener body and check the payload-level status
pub fn parse_snapshot(body: &str) -> Result<MarketSnapshot, RankingError> {
    let snapshot: MarketSnapshot =
        serde_json::from_str(body).map_err(|e| RankingError::InvalidPayload(e.to_string()))?;

    if snapshot.status != 200 {
        return Err(RankingError::Upstream(format!(
            "provider returned status {}",
            snapshot.status
        )));
    }

    Ok(snapshot)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Client for the ETF screener endpoint
#[derive(Clone)]
pub struct MarketDataClient {
    client: Client,
    url: String,
}

impl Default for MarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataClient {
    pub fn new() -> Self {
        Self::with_url(screener_url(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Point the client at another endpoint (mirrors, local fixtures)
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET with automatic 429 retry
    async fn send_request(&self) -> Result<reqwest::Response, RankingError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .get(&self.url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| RankingError::Upstream(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            tracing::warn!(
                "Screener rate limited, waiting {}s before retry {}/{}",
                RETRY_WAIT_SECS,
                attempt,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_secs(RETRY_WAIT_SECS)).await;
        }

        Err(RankingError::Upstream(status_text(StatusCode::TOO_MANY_REQUESTS)))
    }

    /// Fetch the whole ETF universe in one request
    pub async fn get_snapshot(&self) -> Result<MarketSnapshot, RankingError> {
        let response = self.send_request().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RankingError::Upstream(status_text(status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RankingError::Upstream(e.to_string()))?;

        let snapshot = parse_snapshot(&body)?;
        tracing::debug!("Fetched screener snapshot with {} symbols", snapshot.data.data.len());
        Ok(snapshot)
    }
}

#[async_trait]
impl MarketDataSource for MarketDataClient {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot, RankingError> {
        self.get_snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranking_core::MetricValue;

    #[test]
    fn test_screener_url_lists_fields_in_order() {
        let url = screener_url();
        assert!(url.starts_with("https://stockanalysis.com/api/screener/e/bd/name+open+low+high+close+"));
        assert!(url.ends_with("+cusip+isin.json"));
        assert_eq!(url.matches('+').count(), SCREENER_FIELDS.len() - 1);
    }

    #[test]
    fn test_parse_snapshot() {
        let body = r#"{
            "status": 200,
            "data": {
                "data": {
                    "VOO": {"name": "Vanguard S&P 500 ETF", "close": 512.3, "tags": ["index"], "optionable": true},
                    "DEAD": null
                }
            }
        }"#;

        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.data.data.len(), 2);
        let voo = snapshot.data.data["VOO"].as_ref().unwrap();
        assert_eq!(voo.number("close"), Some(512.3));
        assert_eq!(voo.get("optionable"), Some(&MetricValue::Flag(true)));
        assert!(snapshot.data.data["DEAD"].is_none());
    }

    #[test]
    fn test_payload_status_must_be_200() {
        let err = parse_snapshot(r#"{"status": 503, "data": {"data": {}}}"#).unwrap_err();
        assert!(matches!(err, RankingError::Upstream(_)));
        assert!(err.to_string().starts_with("Failed to fetch market data:"));
    }

    #[test]
    fn test_missing_data_is_empty_snapshot() {
        let snapshot = parse_snapshot(r#"{"status": 200}"#).unwrap();
        assert!(snapshot.data.data.is_empty());
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_snapshot("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, RankingError::InvalidPayload(_)));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(StatusCode::BAD_GATEWAY), "Bad Gateway");
    }
}

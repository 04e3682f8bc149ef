//! JSON-over-HTTP snapshot provider.
//!
//! Talks to a screening gateway exposing two endpoints:
//! - `GET {base}/snapshots/{symbol}` returning a `ScreeningSnapshot`
//! - `GET {base}/listings?exchange={exchange}` returning a list of `ListedSymbol`

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{normalize_exchange, ListedSymbol, ScreeningSnapshot};
use crate::provider::MarketDataProvider;

const PROVIDER_ID: &str = "SNAPSHOT_API";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the HTTP provider.
#[derive(Clone, Debug)]
pub struct HttpProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl HttpProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for a screening snapshot gateway.
#[derive(Clone)]
pub struct HttpSnapshotProvider {
    client: Client,
    base_url: String,
}

impl HttpSnapshotProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, MarketDataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &config.api_key {
            let value = header::HeaderValue::from_str(key).map_err(|e| {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Invalid API key header: {}", e),
                }
            })?;
            headers.insert("X-API-Key", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn retry_after(response: &reqwest::Response) -> Option<u64> {
        response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    /// Map a non-success status into the matching error.
    fn status_error(symbol: &str, response: &reqwest::Response) -> MarketDataError {
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after: Self::retry_after(response),
            },
            StatusCode::NOT_FOUND => MarketDataError::SymbolNotFound(symbol.to_string()),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            }
            status => MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("request for {} failed: {}", symbol, status),
            },
        }
    }
}

#[async_trait]
impl MarketDataProvider for HttpSnapshotProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch(&self, symbol: &str) -> Result<ScreeningSnapshot, MarketDataError> {
        let url = format!(
            "{}/snapshots/{}",
            self.base_url,
            urlencoding::encode(&symbol.to_uppercase())
        );
        debug!("Fetching snapshot for {} from {}", symbol, url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let error = Self::status_error(symbol, &response);
            if error.is_rate_limited() {
                warn!("{} rate limited the snapshot request for {}", PROVIDER_ID, symbol);
            }
            return Err(error);
        }

        let mut snapshot: ScreeningSnapshot = response.json().await?;
        if snapshot.symbol.is_empty() {
            snapshot.symbol = symbol.to_string();
        }
        if snapshot.is_empty() {
            return Err(MarketDataError::NoData(symbol.to_string()));
        }
        snapshot.exchange = snapshot.exchange.as_deref().map(normalize_exchange);
        Ok(snapshot)
    }

    async fn list_symbols(&self, exchange: &str) -> Result<Vec<ListedSymbol>, MarketDataError> {
        let exchange = normalize_exchange(exchange);
        let url = format!(
            "{}/listings?exchange={}",
            self.base_url,
            urlencoding::encode(&exchange)
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(&exchange, &response));
        }

        let listings: Vec<ListedSymbol> = response.json().await?;
        Ok(listings
            .into_iter()
            .map(|mut l| {
                l.exchange = normalize_exchange(&l.exchange);
                l
            })
            .filter(|l| l.exchange == exchange)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let provider =
            HttpSnapshotProvider::new(HttpProviderConfig::new("http://localhost:9000/api/"))
                .unwrap();
        assert_eq!(provider.base_url, "http://localhost:9000/api");
        assert_eq!(provider.id(), "SNAPSHOT_API");
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let mut config = HttpProviderConfig::new("http://localhost:9000");
        config.api_key = Some("bad\nkey".to_string());
        assert!(HttpSnapshotProvider::new(config).is_err());
    }

    #[tokio::test]
    #[ignore] // Requires a running gateway
    async fn test_fetch_snapshot() {
        let provider =
            HttpSnapshotProvider::new(HttpProviderConfig::new("http://localhost:9000")).unwrap();
        let snapshot = provider.fetch("VNM").await.unwrap();
        assert_eq!(snapshot.symbol, "VNM");
    }
}

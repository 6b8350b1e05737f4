//! HTTP funding feed client
//!
//! Performs a single `GET` against the configured endpoint per call,
//! validates the status, parses the body and hands it to the normalizer.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::feed::errors::{FeedError, FeedResult};
use crate::feed::normalizer::Normalizer;
use crate::feed::traits::FeedClient;
use crate::feed::types::{FeedSnapshot, RateUnit, RawFeedPayload};

/// Default HTTP timeout for one fetch
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Descriptor of the upstream funding endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSource {
    /// Full URL of the funding document
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Unit the provider uses for rates
    pub rate_unit: RateUnit,
}

impl FeedSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            rate_unit: RateUnit::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_unit(mut self, rate_unit: RateUnit) -> Self {
        self.rate_unit = rate_unit;
        self
    }
}

/// `FeedClient` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: reqwest::Client,
    source: FeedSource,
    normalizer: Normalizer,
}

impl HttpFeedClient {
    /// Build a client with its own connection pool
    pub fn new(source: FeedSource) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(source.timeout)
            .build()
            .map_err(|e| FeedError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, source))
    }

    /// Reuse an existing reqwest client
    pub fn with_client(client: reqwest::Client, source: FeedSource) -> Self {
        let normalizer = Normalizer::new(source.rate_unit);
        Self {
            client,
            source,
            normalizer,
        }
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    async fn fetch_payload(&self) -> FeedResult<RawFeedPayload> {
        let response = self
            .client
            .get(&self.source.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.source.timeout)
            .send()
            .await
            .map_err(|e| FeedError::Network(format!("Funding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(format!("Failed to read funding response: {}", e)))?;

        debug!(
            endpoint = %self.source.endpoint,
            bytes = body.len(),
            "Funding payload received"
        );

        RawFeedPayload::from_json(&body)
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch_snapshot(&self) -> FeedResult<FeedSnapshot> {
        let payload = self.fetch_payload().await?;
        Ok(self.normalizer.normalize(&payload))
    }

    fn source_name(&self) -> &str {
        &self.source.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::SnapshotOrigin;
    use rust_decimal_macros::dec;

    const BODY: &str = r#"{
        "funding_rates": {"BTC": {"binance": -1, "bybit": 5, "okx": 3}},
        "oi_rankings": {"BTC": 1}
    }"#;

    fn client_for(server: &mockito::Server) -> HttpFeedClient {
        let source = FeedSource::new(format!("{}/funding", server.url()))
            .with_timeout(Duration::from_secs(2));
        HttpFeedClient::new(source).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_snapshot_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/funding")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .expect(1)
            .create_async()
            .await;

        let snapshot = client_for(&server).fetch_snapshot().await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.origin, SnapshotOrigin::Live);
        let btc = snapshot.get("BTC").unwrap();
        assert_eq!(btc.samples[0].rate, dec!(-0.0001));
        assert_eq!(btc.open_interest_rank, Some(1));
    }

    #[tokio::test]
    async fn test_fetch_snapshot_bad_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/funding")
            .with_status(503)
            .create_async()
            .await;

        let err = client_for(&server).fetch_snapshot().await.unwrap_err();
        assert_eq!(err, FeedError::BadStatus(503));
    }

    #[tokio::test]
    async fn test_fetch_snapshot_missing_mapping_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/funding")
            .with_status(200)
            .with_body(r#"{"funding_rates": {}}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, FeedError::MalformedPayload(_)), "Got: {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_network_error() {
        // Nothing listens on port 9 of localhost in the test environment
        let source = FeedSource::new("http://127.0.0.1:9/funding")
            .with_timeout(Duration::from_millis(500));
        let client = HttpFeedClient::new(source).unwrap();

        let err = client.fetch_snapshot().await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn test_feed_source_builder() {
        let source = FeedSource::new("https://api.example.com/funding")
            .with_rate_unit(RateUnit::Percent)
            .with_timeout(Duration::from_secs(3));
        assert_eq!(source.rate_unit, RateUnit::Percent);
        assert_eq!(source.timeout, Duration::from_secs(3));

        let client = HttpFeedClient::new(source).unwrap();
        assert_eq!(client.source_name(), "https://api.example.com/funding");
    }
}

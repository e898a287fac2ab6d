//! Plot transport: resolving a geohash cell to raw payload bytes.
//!
//! The trait keeps the network swappable for tests; the loader owns the
//! timeout and cancellation around every fetch, so implementations only
//! need to produce bytes or an explicit failure.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{trace, warn};

use crate::geohash::GeohashKey;

/// Transport-level fetch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response within the loader's timeout; the in-flight operation was
    /// aborted.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The fetch was cancelled before completing.
    #[error("fetch cancelled")]
    Cancelled,

    /// The transport reported an explicit failure.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Resolves a geohash cell to raw payload bytes.
pub trait PlotFetcher: Send + Sync {
    /// Fetch the raw payload for a cell.
    fn fetch(&self, key: &GeohashKey) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// HTTP transport fetching `{base_url}/geohash/{key}.json`.
#[derive(Clone)]
pub struct HttpPlotFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlotFetcher {
    /// Build a fetcher against a base URL.
    ///
    /// The client carries no request timeout of its own: the loader bounds
    /// every fetch externally and aborts it on expiry.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, key: &GeohashKey) -> String {
        format!("{}/geohash/{}.json", self.base_url.trim_end_matches('/'), key)
    }
}

impl PlotFetcher for HttpPlotFetcher {
    async fn fetch(&self, key: &GeohashKey) -> Result<Bytes, FetchError> {
        let url = self.url_for(key);
        trace!(key = %key, url = %url, "plot fetch starting");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!(key = %key, status = response.status().as_u16(), "plot fetch error status");
            return Err(FetchError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(format!("failed to read response: {}", e)))?;
        trace!(key = %key, bytes = bytes.len(), "plot fetch complete");
        Ok(bytes)
    }
}

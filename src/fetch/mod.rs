//! Single-attempt retrieval of raw feed bytes.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::error::SourceError;

/// Transport limits applied to every feed request.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Performs one GET against `url` and returns the response body.
///
/// No retry is attempted. An empty or unparsable `url` is reported as
/// [`SourceError::Configuration`], a non-2xx answer as
/// [`SourceError::Protocol`] with the status and body kept for diagnostics.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Bytes, SourceError> {
    if url.trim().is_empty() {
        return Err(SourceError::Configuration(
            "no endpoint configured".to_string(),
        ));
    }

    let url: reqwest::Url = url
        .parse()
        .map_err(|e| SourceError::Configuration(format!("invalid endpoint URL: {e}")))?;

    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SourceError::Protocol {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Feed bytes received");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_url_is_configuration_error() {
        let client = BasicClient::new();
        let err = fetch_bytes(&client, "").await.unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_malformed_url_is_configuration_error() {
        let client = BasicClient::new();
        let err = fetch_bytes(&client, "not a url").await.unwrap_err();
        assert_eq!(err.kind(), "config_error");
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let client = BasicClient::with_config(&FetchConfig::default()).unwrap();
        // Nothing listens on port 1 on loopback
        let err = fetch_bytes(&client, "http://127.0.0.1:1/feed").await.unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
    }
}

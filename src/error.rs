//! Failure taxonomy for a single source's fetch-and-decode pipeline.
//!
//! Every variant is local to one source: the aggregator turns it into that
//! source's `{line, error}` entry and never lets it reach other sources.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has no endpoint configured, or the endpoint is not a URL.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection refused, DNS failure, timeout: no response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("HTTP status {status}")]
    Protocol { status: u16, body: String },

    /// The body arrived but is not a valid feed.
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The body decoded but lacks fields every feed must carry.
    #[error("invalid feed: {0}")]
    InvalidFeed(String),

    /// The pipeline task panicked or was aborted before finishing.
    #[error("task failed: {0}")]
    Task(String),
}

impl SourceError {
    /// Short failure class used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Configuration(_) => "config_error",
            SourceError::Network(_) => "network_error",
            SourceError::Protocol { .. } => "http_status_error",
            SourceError::Decode(_) | SourceError::InvalidFeed(_) => "decode_error",
            SourceError::Task(_) => "task_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_kind_labels() {
        let config = SourceError::Configuration("missing endpoint".to_string());
        assert_eq!(config.kind(), "config_error");

        let protocol = SourceError::Protocol {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(protocol.kind(), "http_status_error");
        assert_eq!(protocol.to_string(), "HTTP status 503");
    }

    #[test]
    fn test_decode_error_converts() {
        let err = crate::gtfs_rt::FeedMessage::decode(&[0xFF, 0xFE, 0x00, 0x01][..]).unwrap_err();
        let source_err: SourceError = err.into();
        assert_eq!(source_err.kind(), "decode_error");
    }

    #[test]
    fn test_invalid_feed_is_decode_class() {
        let err = SourceError::InvalidFeed("missing header".to_string());
        assert_eq!(err.kind(), "decode_error");
    }
}

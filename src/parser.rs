//! Protobuf parser for GTFS Realtime feeds.

use prost::Message;

use crate::error::SourceError;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Entities keep the order in which they appear in the payload.
///
/// # Errors
///
/// Returns [`SourceError::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`, and [`SourceError::InvalidFeed`] if they decode but carry no
/// header. prost does not enforce proto2 `required`, so an empty body or one
/// holding only unknown fields would otherwise pass as an empty feed.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, SourceError> {
    let feed = FeedMessage::decode(bytes)?;

    // gtfs_realtime_version is required and non-empty in every valid header
    if feed.header.gtfs_realtime_version.is_empty() {
        return Err(SourceError::InvalidFeed(
            "missing required header".to_string(),
        ));
    }

    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};

    fn header() -> FeedHeader {
        FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1700000000),
            incrementality: None,
            feed_version: None,
        }
    }

    #[test]
    fn test_parse_empty_bytes_is_rejected() {
        let result = parse_feed(&[]);
        assert!(matches!(result, Err(SourceError::InvalidFeed(_))));
    }

    #[test]
    fn test_parse_unknown_fields_only_is_rejected() {
        // Field 15, varint 1: well-formed protobuf, but not a feed
        let result = parse_feed(&[0x78, 0x01]);
        assert!(matches!(result, Err(SourceError::InvalidFeed(_))));
    }

    #[test]
    fn test_parse_header_without_version_is_rejected() {
        let feed = FeedMessage {
            header: FeedHeader {
                timestamp: Some(1700000000),
                ..Default::default()
            },
            entity: vec![],
        };
        let result = parse_feed(&feed.encode_to_vec());
        assert_eq!(result.unwrap_err().kind(), "decode_error");
    }

    #[test]
    fn test_parse_valid_empty_feed() {
        let feed = FeedMessage {
            header: header(),
            entity: vec![],
        };
        let parsed = parse_feed(&feed.encode_to_vec()).unwrap();
        assert!(parsed.entity.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        let result = parse_feed(&invalid_bytes);
        assert!(matches!(result, Err(SourceError::Decode(_))));
    }

    #[test]
    fn test_parse_truncated_payload() {
        let feed = FeedMessage {
            header: header(),
            entity: vec![FeedEntity {
                id: "e1".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("123".to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };
        let encoded = feed.encode_to_vec();

        let result = parse_feed(&encoded[..encoded.len() - 3]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_preserves_entity_order() {
        let feed = FeedMessage {
            header: header(),
            entity: ["a", "b", "c"]
                .iter()
                .map(|id| FeedEntity {
                    id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
        };

        let parsed = parse_feed(&feed.encode_to_vec()).unwrap();
        let ids: Vec<_> = parsed.entity.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(parsed.header.timestamp, Some(1700000000));
    }
}

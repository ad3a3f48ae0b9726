//! Projection of decoded feed entities into the tracker's JSON records.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::gtfs_rt::{FeedEntity, FeedMessage, Position};

/// Placeholder for an identifier or time the entity does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// 12-hour wall clock time, e.g. `5:13:20 PM`.
const TIME_OF_DAY_FORMAT: &str = "%-I:%M:%S %p";

/// One train as served to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub trip_id: String,
    pub route_id: String,
    pub arrival_time: String,
    pub vehicle_position: VehiclePositionJson,
}

impl NormalizedRecord {
    /// A record is kept only when it names a trip and has a first-stop arrival.
    pub fn is_complete(&self) -> bool {
        self.trip_id != NOT_AVAILABLE && self.arrival_time != NOT_AVAILABLE
    }
}

/// Vehicle position as JSON. Serializes to `{}` when the entity has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehiclePositionJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl From<&Position> for VehiclePositionJson {
    fn from(pos: &Position) -> Self {
        Self {
            latitude: Some(pos.latitude),
            longitude: Some(pos.longitude),
            bearing: pos.bearing,
            odometer: pos.odometer,
            speed: pos.speed,
        }
    }
}

/// Formats epoch seconds as a time of day in `tz`.
///
/// Returns `None` when the timestamp is outside chrono's representable range.
pub fn format_arrival<Tz: TimeZone>(epoch_secs: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: Display,
{
    let utc = DateTime::from_timestamp(epoch_secs, 0)?;
    Some(utc.with_timezone(tz).format(TIME_OF_DAY_FORMAT).to_string())
}

/// Maps an entity to a record without applying the completeness filter.
///
/// Only the first stop-time update is consulted for the arrival time.
pub fn normalize_entity<Tz: TimeZone>(entity: &FeedEntity, tz: &Tz) -> NormalizedRecord
where
    Tz::Offset: Display,
{
    let trip = entity.trip_update.as_ref().map(|tu| &tu.trip);

    let trip_id = trip
        .and_then(|t| t.trip_id.as_deref())
        .filter(|id| !id.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

    let route_id = trip
        .and_then(|t| t.route_id.as_deref())
        .filter(|id| !id.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string();

    // A zero timestamp is treated the same as a missing one
    let arrival_time = entity
        .trip_update
        .as_ref()
        .and_then(|tu| tu.stop_time_update.first())
        .and_then(|stu| stu.arrival.as_ref())
        .and_then(|arrival| arrival.time)
        .filter(|&time| time != 0)
        .and_then(|time| format_arrival(time, tz))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let vehicle_position = entity
        .vehicle
        .as_ref()
        .and_then(|v| v.position.as_ref())
        .map(VehiclePositionJson::from)
        .unwrap_or_default();

    NormalizedRecord {
        trip_id,
        route_id,
        arrival_time,
        vehicle_position,
    }
}

/// Maps an entity to zero or one record, formatting times in `tz`.
pub fn project_entity_in<Tz: TimeZone>(entity: &FeedEntity, tz: &Tz) -> Option<NormalizedRecord>
where
    Tz::Offset: Display,
{
    Some(normalize_entity(entity, tz)).filter(NormalizedRecord::is_complete)
}

/// Maps an entity to zero or one record, formatting times in the local zone.
pub fn project_entity(entity: &FeedEntity) -> Option<NormalizedRecord> {
    project_entity_in(entity, &Local)
}

/// Projects every entity of a feed, keeping feed order.
pub fn project_feed_in<Tz: TimeZone>(feed: &FeedMessage, tz: &Tz) -> Vec<NormalizedRecord>
where
    Tz::Offset: Display,
{
    feed.entity
        .iter()
        .filter_map(|e| project_entity_in(e, tz))
        .collect()
}

/// Projects every entity of a feed in the local zone.
pub fn project_feed(feed: &FeedMessage) -> Vec<NormalizedRecord> {
    project_feed_in(feed, &Local)
}

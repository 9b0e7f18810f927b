//! Daily storyline payloads and their flattening into track points.
//!
//! A day's storyline is a list of segments: `place` segments describe time
//! spent at a single location, `move` segments carry the recorded track of
//! one or more activities.

use serde::Deserialize;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct DailySummary {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Place(PlaceSegment),
    Move(MoveSegment),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSegment {
    pub start_time: String,
    pub end_time: String,
    pub place: Place,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub location: Location,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveSegment {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub track_points: Vec<RecordedPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: OffsetDateTime,
}

impl TrackPoint {
    fn at(location: Location, time: &str) -> Result<Self> {
        Ok(Self {
            lat: location.lat,
            lon: location.lon,
            time: parse_compact_time(time)?,
        })
    }
}

impl Segment {
    pub fn track_points(&self) -> Result<Vec<TrackPoint>> {
        match self {
            Segment::Place(place) => Ok(vec![
                TrackPoint::at(place.place.location, &place.start_time)?,
                TrackPoint::at(place.place.location, &place.end_time)?,
            ]),
            Segment::Move(movement) => movement
                .activities
                .iter()
                .flat_map(|activity| &activity.track_points)
                .map(|point| {
                    TrackPoint::at(
                        Location {
                            lat: point.lat,
                            lon: point.lon,
                        },
                        &point.time,
                    )
                })
                .collect(),
            Segment::Unknown => Ok(Vec::new()),
        }
    }
}

/// Flattens one day's response into track points.
///
/// Only the first summary is used. A missing or `null` entry and a missing
/// or `null` segment list all mean the day has no points.
pub fn day_track_points(days: &[Option<DailySummary>]) -> Result<Vec<TrackPoint>> {
    let Some(Some(summary)) = days.first() else {
        return Ok(Vec::new());
    };
    let Some(segments) = &summary.segments else {
        return Ok(Vec::new());
    };

    let mut points = Vec::new();
    for segment in segments {
        points.extend(segment.track_points()?);
    }
    Ok(points)
}

/// Parses a compact timestamp (`20230101T120000Z` or `20230101T140000+0200`)
/// into UTC.
pub fn parse_compact_time(value: &str) -> Result<OffsetDateTime> {
    let utc = format_description!("[year][month][day]T[hour][minute][second]Z");
    if let Ok(time) = PrimitiveDateTime::parse(value, utc) {
        return Ok(time.assume_utc());
    }

    let with_offset = format_description!(
        "[year][month][day]T[hour][minute][second][offset_hour sign:mandatory][offset_minute]"
    );
    OffsetDateTime::parse(value, with_offset)
        .map(|time| time.to_offset(UtcOffset::UTC))
        .map_err(|_| Error::InvalidTimestamp(value.to_string()))
}

pub fn format_gpx_time(time: OffsetDateTime) -> Result<String> {
    let iso = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    Ok(time.to_offset(UtcOffset::UTC).format(iso)?)
}

/// Rewrites a compact timestamp in the ISO form used in GPX files.
pub fn gpx_time(value: &str) -> Result<String> {
    format_gpx_time(parse_compact_time(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn parse_day(value: serde_json::Value) -> Vec<Option<DailySummary>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn gpx_time_reformats_compact_utc() {
        assert_eq!(gpx_time("20230101T120000Z").unwrap(), "2023-01-01T12:00:00Z");
    }

    #[test]
    fn gpx_time_normalizes_offsets_to_utc() {
        assert_eq!(
            gpx_time("20121212T071430+0200").unwrap(),
            "2012-12-12T05:14:30Z"
        );
        assert_eq!(
            parse_compact_time("20121231T230000-0100").unwrap(),
            datetime!(2013-01-01 00:00:00 UTC)
        );
    }

    #[test]
    fn gpx_time_rejects_garbage() {
        for bad in ["", "2023-01-01T12:00:00Z", "20230101T1200Z", "20231301T120000Z"] {
            assert!(
                matches!(gpx_time(bad), Err(Error::InvalidTimestamp(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn place_segment_emits_start_and_end() {
        let day = parse_day(json!([{
            "date": "20230101",
            "segments": [{
                "type": "place",
                "startTime": "20230101T080000Z",
                "endTime": "20230101T093000Z",
                "place": { "id": 1, "location": { "lat": 60.17, "lon": 24.94 } }
            }]
        }]));

        let points = day_track_points(&day).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.lat == 60.17 && p.lon == 24.94));
        assert_eq!(points[0].time, datetime!(2023-01-01 08:00:00 UTC));
        assert_eq!(points[1].time, datetime!(2023-01-01 09:30:00 UTC));
    }

    #[test]
    fn move_segment_emits_every_point_in_order() {
        let day = parse_day(json!([{
            "segments": [{
                "type": "move",
                "startTime": "20230101T100000Z",
                "endTime": "20230101T110000Z",
                "activities": [
                    {
                        "activity": "walking",
                        "trackPoints": [
                            { "lat": 1.0, "lon": 2.0, "time": "20230101T100000Z" },
                            { "lat": 1.5, "lon": 2.5, "time": "20230101T101000Z" }
                        ]
                    },
                    { "activity": "transport" },
                    {
                        "activity": "cycling",
                        "trackPoints": [
                            { "lat": 3.0, "lon": 4.0, "time": "20230101T105000Z" }
                        ]
                    }
                ]
            }]
        }]));

        let points = day_track_points(&day).unwrap();
        let lats: Vec<f64> = points.iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![1.0, 1.5, 3.0]);
        assert_eq!(points[2].time, datetime!(2023-01-01 10:50:00 UTC));
    }

    #[test]
    fn unknown_segment_types_are_ignored() {
        let day = parse_day(json!([{
            "segments": [
                { "type": "off", "startTime": "20230101T000000Z" },
                {
                    "type": "place",
                    "startTime": "20230101T010000Z",
                    "endTime": "20230101T020000Z",
                    "place": { "location": { "lat": 0.5, "lon": 0.25 } }
                }
            ]
        }]));

        assert_eq!(day_track_points(&day).unwrap().len(), 2);
    }

    #[test]
    fn empty_days_contribute_nothing() {
        for value in [
            json!([]),
            json!([null]),
            json!([{ "date": "20230101" }]),
            json!([{ "date": "20230101", "segments": null }]),
            json!([{ "date": "20230101", "segments": [] }]),
        ] {
            let day = parse_day(value.clone());
            assert!(day_track_points(&day).unwrap().is_empty(), "{value}");
        }
    }

    #[test]
    fn only_first_summary_is_used() {
        let day = parse_day(json!([
            { "segments": null },
            {
                "segments": [{
                    "type": "place",
                    "startTime": "20230101T010000Z",
                    "endTime": "20230101T020000Z",
                    "place": { "location": { "lat": 0.5, "lon": 0.25 } }
                }]
            }
        ]));

        assert!(day_track_points(&day).unwrap().is_empty());
    }

    #[test]
    fn bad_point_time_is_an_error() {
        let day = parse_day(json!([{
            "segments": [{
                "type": "move",
                "activities": [{
                    "trackPoints": [{ "lat": 1.0, "lon": 2.0, "time": "yesterday" }]
                }]
            }]
        }]));

        assert!(matches!(
            day_track_points(&day),
            Err(Error::InvalidTimestamp(t)) if t == "yesterday"
        ));
    }
}

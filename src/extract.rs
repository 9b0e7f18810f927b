use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use geo_types::Point;
use gpx::{Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint};
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::client::MovesApi;
use crate::error::{Error, Result};
use crate::storyline::{day_track_points, format_gpx_time, TrackPoint};

/// Inclusive range of calendar days. A range whose end is before its start
/// holds no days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        if end < start {
            tracing::warn!(%start, %end, "End date is before start date, nothing to fetch");
        }
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        ((self.end - self.start).whole_days() + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn days(&self) -> impl Iterator<Item = Date> {
        let end = self.end;
        std::iter::successors(Some(self.start).filter(|start| *start <= end), move |day| {
            day.next_day().filter(|next| *next <= end)
        })
    }
}

/// Fetches every day in `range` in order and flattens them into one list.
///
/// `wait` is slept between consecutive requests, never before the first.
pub fn fetch_track_points(
    api: &impl MovesApi,
    access_token: &str,
    range: &DateRange,
    wait: Duration,
) -> Result<Vec<TrackPoint>> {
    let total = range.len();
    let mut points = Vec::new();

    for (index, day) in range.days().enumerate() {
        if index > 0 && !wait.is_zero() {
            std::thread::sleep(wait);
        }

        let day_points = day_track_points(&api.daily_storyline(access_token, day)?)?;
        tracing::info!(
            date = %day,
            day = index + 1,
            total,
            points = day_points.len(),
            "Fetched storyline"
        );
        points.extend(day_points);
    }

    Ok(points)
}

pub fn build_gpx(points: &[TrackPoint], track_name: &str) -> Gpx {
    let mut segment = TrackSegment::new();
    for track_point in points {
        let mut point = Waypoint::new(Point::new(track_point.lon, track_point.lat));
        point.time = Some(Time::from(track_point.time));
        segment.points.push(point);
    }

    let mut track = Track::new();
    track.name = Some(track_name.to_string());
    track.segments.push(segment);

    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some(env!("CARGO_PKG_NAME").to_string());
    gpx.tracks.push(track);
    gpx
}

/// Writes `gpx` to `path`, replacing any existing file.
///
/// The document goes to a sibling temporary file first and is renamed into
/// place once complete.
pub fn write_gpx(gpx: &Gpx, path: &Path) -> Result<()> {
    let mut document = Vec::new();
    gpx::write(gpx, &mut document)?;
    let document = whole_second_times(&document)?;

    let tmp_path = temporary_path(path);
    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(&document)?;
        writer.flush()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

/// Rewrites every `<time>` of a serialized GPX document as
/// `YYYY-MM-DDTHH:MM:SSZ`. The gpx writer always emits nanoseconds.
fn whole_second_times(xml: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut in_time = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                in_time = e.name().as_ref() == b"time";
                writer.write_event(Event::Start(e))?;
            }
            Event::Text(e) if in_time => {
                let raw = e.unescape()?;
                let time = OffsetDateTime::parse(raw.trim(), &Rfc3339)
                    .map_err(|_| Error::InvalidTimestamp(raw.to_string()))?;
                writer.write_event(Event::Text(BytesText::new(&format_gpx_time(time)?)))?;
            }
            Event::End(e) => {
                in_time = false;
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Fetches `range`, converts it and writes the GPX file. Returns the number
/// of track points written.
pub fn export(
    api: &impl MovesApi,
    access_token: &str,
    range: &DateRange,
    wait: Duration,
    output: &Path,
    track_name: &str,
) -> Result<usize> {
    let points = fetch_track_points(api, access_token, range, wait)?;
    let gpx = build_gpx(&points, track_name);
    write_gpx(&gpx, output)?;

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        tracing::info!(
            path = %output.display(),
            points = points.len(),
            from = %format_gpx_time(first.time)?,
            to = %format_gpx_time(last.time)?,
            "Wrote GPX"
        );
    } else {
        tracing::info!(path = %output.display(), "Wrote GPX without track points");
    }
    Ok(points.len())
}

//! Track data model and GPX loading.
//!
//! An ordered sequence of recorded positions with optional wall-clock
//! timestamps and instantaneous speeds. Point order is semantically
//! meaningful (the direction of travel); segments are immutable once
//! loaded.

mod loader;

pub use loader::{load_gpx, TrackError};

use time::OffsetDateTime;

use crate::geo;

/// A single recorded track position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Wall-clock time of the recording, when the source carried one.
    pub time: Option<OffsetDateTime>,
    /// Instantaneous speed in m/s, when the source carried one.
    pub speed: Option<f64>,
}

impl TrackPoint {
    /// Create a point with no timestamp or speed.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            time: None,
            speed: None,
        }
    }

    /// Attach a recording timestamp.
    pub fn with_time(mut self, time: OffsetDateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Attach an instantaneous speed in m/s.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}

/// One contiguous run of track points.
#[derive(Debug, Clone, Default)]
pub struct TrackSegment {
    /// Points in travel order.
    pub points: Vec<TrackPoint>,
}

impl TrackSegment {
    /// Create a segment from points in travel order.
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }

    /// Number of points in the segment.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the segment has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whole-segment great-circle distance in meters.
    ///
    /// Segments with fewer than two points have zero length.
    pub fn total_distance(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| {
                geo::haversine_distance(
                    pair[0].latitude,
                    pair[0].longitude,
                    pair[1].latitude,
                    pair[1].longitude,
                )
            })
            .sum()
    }

    /// Elapsed seconds between the first and last point, when every point
    /// in the segment carries a timestamp.
    pub fn total_time_seconds(&self) -> Option<f64> {
        if !self.fully_timed() || self.points.len() < 2 {
            return None;
        }
        let first = self.points.first()?.time?;
        let last = self.points.last()?.time?;
        Some((last - first).as_seconds_f64())
    }

    /// Whether every point carries a timestamp.
    pub fn fully_timed(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.time.is_some())
    }

    /// Whether any point carries an instantaneous speed.
    pub fn has_speed(&self) -> bool {
        self.points.iter().any(|p| p.speed.is_some())
    }
}

/// A recorded track: one or more segments in file order.
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// Segments in file order.
    pub segments: Vec<TrackSegment>,
}

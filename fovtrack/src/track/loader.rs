//! GPX track file loading.
//!
//! Thin adapter from the GPX document model to [`Track`] and
//! [`TrackSegment`]. Waypoints keep their optional timestamp and speed so
//! the exposure passes can attribute time.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use super::{Track, TrackPoint, TrackSegment};

/// Errors raised while loading a GPX track file.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The file could not be opened for reading.
    #[error("failed to read track file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid GPX document.
    #[error("failed to parse GPX: {0}")]
    Parse(#[from] gpx::errors::GpxError),
}

/// Load every track from a GPX file.
///
/// Tracks and their segments keep file order, so indices reported
/// downstream line up with the source document.
pub fn load_gpx(path: impl AsRef<Path>) -> Result<Vec<Track>, TrackError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = gpx::read(BufReader::new(file))?;

    let tracks: Vec<Track> = document
        .tracks
        .iter()
        .map(|track| Track {
            segments: track.segments.iter().map(convert_segment).collect(),
        })
        .collect();

    info!(
        path = %path.display(),
        tracks = tracks.len(),
        "loaded GPX track file"
    );
    Ok(tracks)
}

fn convert_segment(segment: &gpx::TrackSegment) -> TrackSegment {
    let points = segment
        .points
        .iter()
        .map(|waypoint| {
            // GPX stores x = longitude, y = latitude
            let (longitude, latitude) = waypoint.point().x_y();
            TrackPoint {
                latitude,
                longitude,
                time: waypoint.time.map(OffsetDateTime::from),
                speed: waypoint.speed,
            }
        })
        .collect();
    TrackSegment::new(points)
}

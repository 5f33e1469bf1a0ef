//! Camera catalog loading from CSV.
//!
//! Required columns: `latitude` and `longitude`. Optional columns:
//! `name`, `radius` (meters, default 10), `camera type` (`round` or
//! `directed`, default round), `angle of view` (degrees, default 360),
//! and `direction` (compass bearing of the view axis, required for a
//! directed camera with a view angle below 360). Rows are validated into
//! typed [`Camera`] records at load time; a malformed row fails the whole
//! load with an error naming the row.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::{Camera, CameraCatalog, CameraId, CameraKind, DEFAULT_RADIUS_M};

/// View angle assumed when the column is absent.
const DEFAULT_VIEW_ANGLE_DEG: f64 = 360.0;

/// Errors raised while loading a camera catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be opened for reading.
    #[error("failed to read camera file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed against the expected columns.
    #[error("failed to parse camera file: {0}")]
    Csv(#[from] csv::Error),

    /// A row parsed but does not describe a usable camera.
    #[error("invalid camera definition in row {row}: {reason}")]
    InvalidCamera { row: usize, reason: String },
}

/// One raw CSV row prior to validation.
#[derive(Debug, Deserialize)]
struct RawCamera {
    #[serde(default)]
    name: Option<String>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    radius: Option<f64>,
    #[serde(rename = "camera type", default)]
    camera_type: Option<String>,
    #[serde(rename = "angle of view", default)]
    angle_of_view: Option<f64>,
    #[serde(default)]
    direction: Option<f64>,
}

/// Load and validate a camera catalog from a CSV file.
///
/// Row order becomes camera identity: the camera in data row `n`
/// (zero-indexed, headers excluded) gets [`CameraId`] `n`.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CameraCatalog, CatalogError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut cameras = Vec::new();
    for (row, record) in reader.deserialize::<RawCamera>().enumerate() {
        cameras.push(validate(row, record?)?);
    }

    info!(
        path = %path.display(),
        cameras = cameras.len(),
        "loaded camera catalog"
    );
    Ok(CameraCatalog::new(cameras))
}

fn validate(row: usize, raw: RawCamera) -> Result<Camera, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidCamera { row, reason };

    if !(-90.0..=90.0).contains(&raw.latitude) {
        return Err(invalid(format!("latitude {} out of range", raw.latitude)));
    }
    if !(-180.0..=180.0).contains(&raw.longitude) {
        return Err(invalid(format!("longitude {} out of range", raw.longitude)));
    }

    let radius_m = raw.radius.unwrap_or(DEFAULT_RADIUS_M);
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(invalid(format!("radius {} is not a positive length", radius_m)));
    }

    let kind = match raw.camera_type.as_deref().unwrap_or("round") {
        "round" => CameraKind::Round,
        "directed" => {
            let view_angle_deg = raw.angle_of_view.unwrap_or(DEFAULT_VIEW_ANGLE_DEG);
            if !view_angle_deg.is_finite() || view_angle_deg <= 0.0 || view_angle_deg > 360.0 {
                return Err(invalid(format!(
                    "angle of view {} outside (0, 360]",
                    view_angle_deg
                )));
            }
            if view_angle_deg < 360.0 {
                let direction_deg = raw.direction.ok_or_else(|| {
                    invalid("directed camera is missing the direction column".to_string())
                })?;
                if !(0.0..=360.0).contains(&direction_deg) {
                    return Err(invalid(format!(
                        "direction {} outside [0, 360]",
                        direction_deg
                    )));
                }
                CameraKind::Directed {
                    view_angle_deg,
                    direction_deg,
                }
            } else {
                // A full-circle cone is just a round camera
                CameraKind::Round
            }
        }
        other => return Err(invalid(format!("unknown camera type '{}'", other))),
    };

    Ok(Camera {
        id: CameraId(row),
        name: raw.name,
        latitude: raw.latitude,
        longitude: raw.longitude,
        radius_m,
        kind,
    })
}

//! Segment report assembly.
//!
//! Reduces one segment's survey and exposure summary into a serializable
//! report: totals, percentages, proximity statistics, and the per-camera
//! breakdown. Time-derived fields appear only when every point in the
//! segment carries a timestamp.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::camera::{CameraCatalog, CameraId, CameraKind};
use crate::exposure::{ExposureSummary, MembershipSurvey};
use crate::track::TrackSegment;

/// Errors raised while assembling a segment report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The segment has too little data to compute exposure statistics.
    #[error("insufficient track data: {0}")]
    InsufficientTrackData(String),
}

/// Per-camera entry in the report: static attributes plus accumulated
/// exposure.
#[derive(Debug, Clone, Serialize)]
pub struct CameraReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Configured FOV radius in meters, before any global override.
    pub radius: f64,
    pub camera_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_of_view: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
    /// Accumulated seconds inside this camera's FOV.
    pub time_in_camera_fov: f64,
    /// Accumulated meters inside this camera's FOV.
    pub distance_in_camera_fov: f64,
}

/// One report per track segment.
#[derive(Debug, Serialize)]
pub struct SegmentReport {
    /// Source file name.
    pub file: String,
    /// Track index within the source file.
    pub track: usize,
    /// Segment index within the track.
    pub segment: usize,
    /// Whole-segment great-circle distance in meters.
    pub total_distance: f64,
    /// Cameras that observed at least one point.
    pub number_of_unique_cams: usize,
    /// Estimated meters inside at least one camera's FOV.
    pub exposure_distance: f64,
    /// Exposure distance as a percentage of the total.
    pub dist_percentage: f64,
    /// Mean of every raw point-to-camera distance.
    pub camera_distance_avg: f64,
    /// Median of every raw point-to-camera distance.
    pub camera_distance_median: f64,
    /// Average travel speed in km/h; present only for a fully timed
    /// segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    /// Estimated seconds inside at least one camera's FOV; present only
    /// for a fully timed segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f64>,
    /// Exposure time as a percentage of the total duration; present only
    /// for a fully timed segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_percentage: Option<f64>,
    /// The global radius override, when one was configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fov_radius: Option<f64>,
    /// Per-camera breakdown, keyed by camera identifier.
    pub cameras: BTreeMap<CameraId, CameraReport>,
}

/// Assemble the report for one segment.
///
/// Fails with [`ReportError::InsufficientTrackData`] when the segment has
/// no measurable distance, or carries timestamps spanning zero seconds,
/// rather than producing NaN percentages.
pub fn build_report(
    source: &str,
    track_index: usize,
    segment_index: usize,
    segment: &TrackSegment,
    catalog: &CameraCatalog,
    survey: &MembershipSurvey,
    summary: &ExposureSummary,
) -> Result<SegmentReport, ReportError> {
    if segment.len() < 2 {
        return Err(ReportError::InsufficientTrackData(format!(
            "segment has {} point(s), need at least 2",
            segment.len()
        )));
    }

    let total_distance = segment.total_distance();
    if total_distance <= 0.0 {
        return Err(ReportError::InsufficientTrackData(
            "segment covers zero distance".to_string(),
        ));
    }

    let total_time_s = segment.total_time_seconds();
    if let Some(seconds) = total_time_s {
        if seconds <= 0.0 {
            return Err(ReportError::InsufficientTrackData(
                "segment timestamps span zero seconds".to_string(),
            ));
        }
    }

    let (camera_distance_avg, camera_distance_median) = distance_stats(&survey.distances_m);

    // Every observed camera appears in the breakdown, including one whose
    // only sighting was a boundary point with no neighbor to probe
    let unique_cameras = survey.unique_cameras();
    let cameras = unique_cameras
        .iter()
        .map(|&id| {
            let exposure = summary.per_camera.get(&id).cloned().unwrap_or_default();
            let camera = catalog.get(id);
            let (camera_type, angle_of_view, direction) = match camera.kind {
                CameraKind::Round => ("round", None, None),
                CameraKind::Directed {
                    view_angle_deg,
                    direction_deg,
                } => ("directed", Some(view_angle_deg), Some(direction_deg)),
            };
            let entry = CameraReport {
                name: camera.name.clone(),
                latitude: camera.latitude,
                longitude: camera.longitude,
                radius: camera.radius_m,
                camera_type,
                angle_of_view,
                direction,
                time_in_camera_fov: round2(exposure.time_s),
                distance_in_camera_fov: round2(exposure.distance_m),
            };
            (id, entry)
        })
        .collect();

    Ok(SegmentReport {
        file: source.to_string(),
        track: track_index,
        segment: segment_index,
        total_distance,
        number_of_unique_cams: unique_cameras.len(),
        exposure_distance: summary.distance_m,
        dist_percentage: round2(summary.distance_m / total_distance * 100.0),
        camera_distance_avg,
        camera_distance_median,
        avg_speed: total_time_s.map(|seconds| round2(total_distance / seconds * 3.6)),
        exposure_time: total_time_s.map(|_| round2(summary.time_s)),
        time_percentage: total_time_s.map(|seconds| round2(summary.time_s / seconds * 100.0)),
        fov_radius: catalog.radius_override(),
        cameras,
    })
}

/// Mean and median of the raw point-to-camera distances. An empty sample
/// (no cameras in the catalog) yields zeros.
fn distance_stats(distances_m: &[f64]) -> (f64, f64) {
    if distances_m.is_empty() {
        return (0.0, 0.0);
    }

    let mean = distances_m.iter().sum::<f64>() / distances_m.len() as f64;

    let mut sorted = distances_m.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    (mean, median)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

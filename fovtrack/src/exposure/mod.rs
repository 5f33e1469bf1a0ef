//! Route exposure tracking.
//!
//! Walks an ordered track segment against a camera catalog in three
//! stages:
//!
//! 1. **Survey** - every point is tested against every camera once,
//!    producing per-point observer sets and the raw point-to-camera
//!    distances used for proximity statistics.
//! 2. **Directional passes** - once toward each point's successor and
//!    once toward its predecessor, exposure inside each inter-point gap
//!    is estimated by synthesizing pseudo points along the travel bearing
//!    and re-testing the FOV at each hop. Each pass is an independent
//!    partial result.
//! 3. **Merge** - the two partial results are combined by addition.
//!
//! Sparse, unevenly spaced recordings are the norm; the pseudo-point
//! probe is what turns "point 17 was seen" into an estimate of how many
//! meters and seconds around point 17 were seen.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::camera::{Camera, CameraCatalog, CameraId};
use crate::geo;
use crate::track::{TrackPoint, TrackSegment};

/// Default interpolation step in meters between synthesized pseudo points.
pub const DEFAULT_RESOLUTION_M: f64 = 0.5;

/// Default acceptance margin in meters added to the FOV radius while
/// probing, compensating for the planar distance approximation.
pub const DEFAULT_MARGIN_M: f64 = 1.0;

/// Tuning for the interpolation passes.
#[derive(Debug, Clone, Copy)]
pub struct ExposureConfig {
    /// Interpolation step in meters.
    pub resolution_m: f64,
    /// FOV acceptance margin in meters used while probing.
    pub margin_m: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            resolution_m: DEFAULT_RESOLUTION_M,
            margin_m: DEFAULT_MARGIN_M,
        }
    }
}

/// Which neighbor a directional pass scans from each point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Stage output of the membership survey.
#[derive(Debug, Default)]
pub struct MembershipSurvey {
    /// Observing cameras per track-point index. Points with no observers
    /// are absent; iteration follows point order.
    pub per_point: BTreeMap<usize, Vec<CameraId>>,
    /// Raw point-to-camera distance in meters for every (point, camera)
    /// pair, unfiltered by FOV membership.
    pub distances_m: Vec<f64>,
}

impl MembershipSurvey {
    /// Cameras that observed at least one point, in identifier order.
    pub fn unique_cameras(&self) -> BTreeSet<CameraId> {
        self.per_point.values().flatten().copied().collect()
    }

    fn observes(&self, index: usize, id: CameraId) -> bool {
        self.per_point
            .get(&index)
            .map_or(false, |observers| observers.contains(&id))
    }
}

/// Accumulated exposure for one camera.
#[derive(Debug, Clone, Default)]
pub struct CameraExposure {
    /// Point indices already attributed to this camera.
    visited: HashSet<usize>,
    /// Cumulative exposure distance in meters.
    pub distance_m: f64,
    /// Cumulative exposure time in seconds.
    pub time_s: f64,
}

impl CameraExposure {
    /// Track-point indices attributed to this camera.
    pub fn attributed_points(&self) -> impl Iterator<Item = usize> + '_ {
        self.visited.iter().copied()
    }
}

/// Partial result of one directional pass.
#[derive(Debug, Default)]
struct DirectionPass {
    per_camera: BTreeMap<CameraId, CameraExposure>,
    /// Sum over points of the largest per-camera exposure distance.
    distance_m: f64,
    /// Sum over points of the largest per-camera exposure time.
    time_s: f64,
}

/// Combined exposure over a whole segment.
///
/// Totals are the sum of the forward and backward passes. Summation can
/// double-count coverage where a FOV boundary falls inside a single
/// inter-point gap; accepted as an approximation in exchange for two
/// independent, order-insensitive passes.
#[derive(Debug, Default)]
pub struct ExposureSummary {
    /// Per-camera accumulated exposure, in identifier order.
    pub per_camera: BTreeMap<CameraId, CameraExposure>,
    /// Estimated meters of track inside at least one camera's FOV.
    pub distance_m: f64,
    /// Estimated seconds of track inside at least one camera's FOV.
    pub time_s: f64,
}

impl ExposureSummary {
    fn absorb(&mut self, pass: DirectionPass) {
        self.distance_m += pass.distance_m;
        self.time_s += pass.time_s;
        for (id, exposure) in pass.per_camera {
            let entry = self.per_camera.entry(id).or_default();
            entry.distance_m += exposure.distance_m;
            entry.time_s += exposure.time_s;
            entry.visited.extend(exposure.visited);
        }
    }
}

/// Tests every point against every catalog camera (the survey stage).
pub fn survey_segment(segment: &TrackSegment, catalog: &CameraCatalog) -> MembershipSurvey {
    let mut survey = MembershipSurvey::default();

    for (index, point) in segment.points.iter().enumerate() {
        let mut observers = Vec::new();
        for camera in catalog.cameras() {
            let distance = geo::quick_distance(
                point.latitude,
                point.longitude,
                camera.latitude,
                camera.longitude,
            );
            survey.distances_m.push(distance);
            if catalog.is_in_fov(point.latitude, point.longitude, camera, 0.0) {
                observers.push(camera.id);
            }
        }
        if !observers.is_empty() {
            survey.per_point.insert(index, observers);
        }
    }

    debug!(
        points = segment.len(),
        cameras = catalog.len(),
        observed_points = survey.per_point.len(),
        "membership survey complete"
    );
    survey
}

/// Runs both directional passes and combines them.
pub fn measure_exposure(
    segment: &TrackSegment,
    catalog: &CameraCatalog,
    survey: &MembershipSurvey,
    config: &ExposureConfig,
) -> ExposureSummary {
    let backward = direction_pass(segment, catalog, survey, config, Direction::Backward);
    let forward = direction_pass(segment, catalog, survey, config, Direction::Forward);

    let mut summary = ExposureSummary::default();
    summary.absorb(backward);
    summary.absorb(forward);

    debug!(
        exposure_distance_m = summary.distance_m,
        exposure_time_s = summary.time_s,
        cameras = summary.per_camera.len(),
        "exposure passes merged"
    );
    summary
}

/// One directional pass over the observed points.
///
/// A pure function of the survey: it mutates nothing shared, so the
/// forward and backward partials can be computed in either order and
/// merged afterwards.
fn direction_pass(
    segment: &TrackSegment,
    catalog: &CameraCatalog,
    survey: &MembershipSurvey,
    config: &ExposureConfig,
    direction: Direction,
) -> DirectionPass {
    let mut pass = DirectionPass::default();
    let points = &segment.points;

    for (&index, observers) in &survey.per_point {
        // Boundary points have no neighbor in this direction
        let neighbor = match direction {
            Direction::Backward if index > 0 => index - 1,
            Direction::Forward if index + 1 < points.len() => index + 1,
            _ => continue,
        };
        let here = &points[index];
        let there = &points[neighbor];

        let course = geo::bearing(here.latitude, here.longitude, there.latitude, there.longitude);
        let gap_m =
            geo::quick_distance(here.latitude, here.longitude, there.latitude, there.longitude);
        let steps = if gap_m > config.resolution_m {
            (gap_m / config.resolution_m).round() as u32
        } else {
            1
        };

        let mut highest_distance_m = 0.0_f64;
        let mut highest_time_s = 0.0_f64;

        for &id in observers {
            // The gap between a point and its successor belongs to the
            // backward pass from the successor; the forward pass only
            // probes gaps whose far end left the FOV.
            if direction == Direction::Forward && survey.observes(neighbor, id) {
                continue;
            }

            let camera = catalog.get(id);
            let pseudo_points =
                if direction == Direction::Backward && survey.observes(neighbor, id) {
                    // The predecessor is still inside, so the whole gap is
                    // covered without probing
                    steps
                } else {
                    probe_coverage(here, course, steps, catalog, camera, config)
                };

            let covered_m = f64::from(pseudo_points) * config.resolution_m;
            let covered_s = match speed_for_gap(here, there, gap_m) {
                Some(speed) if speed > 0.0 => Some(covered_m / speed),
                // Without a usable speed the full gap duration is attributed
                _ => gap_seconds(here, there),
            };

            let exposure = pass.per_camera.entry(id).or_default();
            exposure.visited.insert(index);
            exposure.distance_m += covered_m;
            if covered_m > highest_distance_m {
                highest_distance_m = covered_m;
            }
            if let Some(seconds) = covered_s {
                exposure.time_s += seconds;
                if seconds > highest_time_s {
                    highest_time_s = seconds;
                }
            }
        }

        // The pass total takes the largest single-camera exposure at this
        // point: overlapping cameras watch the same meters once
        pass.distance_m += highest_distance_m;
        pass.time_s += highest_time_s;
    }

    pass
}

/// Counts consecutive in-FOV pseudo points along `course`, hopping one
/// resolution step at a time, until the first miss or `steps` hops.
fn probe_coverage(
    origin: &TrackPoint,
    course: f64,
    steps: u32,
    catalog: &CameraCatalog,
    camera: &Camera,
    config: &ExposureConfig,
) -> u32 {
    let mut hits = 0;
    let (mut latitude, mut longitude) = (origin.latitude, origin.longitude);

    for _ in 0..steps {
        let (next_lat, next_lon) = geo::destination(latitude, longitude, course, config.resolution_m);
        if !catalog.is_in_fov(next_lat, next_lon, camera, config.margin_m) {
            break;
        }
        hits += 1;
        latitude = next_lat;
        longitude = next_lon;
    }
    hits
}

/// Speed in m/s used to attribute time across a gap: the recorded
/// instantaneous speed at the point when present, else the average speed
/// implied by the gap's timestamps.
fn speed_for_gap(here: &TrackPoint, there: &TrackPoint, gap_m: f64) -> Option<f64> {
    if let Some(speed) = here.speed {
        return Some(speed);
    }
    let elapsed_s = gap_seconds(here, there)?;
    if elapsed_s > 0.0 {
        Some(gap_m / elapsed_s)
    } else {
        None
    }
}

/// Absolute wall-clock span of a gap, when both ends are timestamped.
fn gap_seconds(here: &TrackPoint, there: &TrackPoint) -> Option<f64> {
    match (here.time, there.time) {
        (Some(t0), Some(t1)) => Some((t1 - t0).as_seconds_f64().abs()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraKind;
    use time::{Duration, OffsetDateTime};

    fn round_camera(latitude: f64, longitude: f64, radius_m: f64) -> Camera {
        Camera {
            id: CameraId(0),
            name: None,
            latitude,
            longitude,
            radius_m,
            kind: CameraKind::Round,
        }
    }

    fn timestamp(offset_s: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap() + Duration::seconds(offset_s)
    }

    /// Three points ~11 m apart along the equator.
    fn three_point_segment() -> TrackSegment {
        TrackSegment::new(vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.0001),
            TrackPoint::new(0.0, 0.0002),
        ])
    }

    #[test]
    fn test_survey_records_every_pair_distance() {
        let segment = three_point_segment();
        let catalog = CameraCatalog::new(vec![
            round_camera(0.0, 0.0001, 15.0),
            round_camera(1.0, 1.0, 15.0),
        ]);

        let survey = survey_segment(&segment, &catalog);
        // 3 points x 2 cameras, membership notwithstanding
        assert_eq!(survey.distances_m.len(), 6);
    }

    #[test]
    fn test_survey_membership_for_covering_camera() {
        let segment = three_point_segment();
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        // All three points are within 15 m of the midpoint camera
        assert_eq!(survey.per_point.len(), 3);
        assert_eq!(survey.unique_cameras().len(), 1);
        for index in 0..3 {
            assert!(survey.observes(index, CameraId(0)), "Point {} not observed", index);
        }
    }

    #[test]
    fn test_track_outside_every_camera_yields_zero() {
        let segment = three_point_segment();
        let catalog = CameraCatalog::new(vec![round_camera(50.0, 50.0, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        assert!(survey.per_point.is_empty());
        assert_eq!(summary.distance_m, 0.0);
        assert_eq!(summary.time_s, 0.0);
        assert!(summary.per_camera.is_empty());
    }

    #[test]
    fn test_single_point_track_yields_zero() {
        let segment = TrackSegment::new(vec![TrackPoint::new(0.0, 0.0001)]);
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        // The point is observed but has no neighbor in either direction
        assert_eq!(survey.per_point.len(), 1);
        assert_eq!(summary.distance_m, 0.0);
        assert_eq!(summary.time_s, 0.0);
    }

    #[test]
    fn test_fully_covered_track_exposure_close_to_total() {
        // Three points ~11 m apart, one round camera at the midpoint with
        // a 15 m radius covering the whole track
        let segment = three_point_segment();
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);
        let config = ExposureConfig::default();

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &config);

        let total = segment.total_distance();
        assert_eq!(summary.per_camera.len(), 1);
        assert!(
            (summary.distance_m - total).abs() <= config.resolution_m,
            "Exposure {} m should be within one step of total {} m",
            summary.distance_m,
            total
        );
    }

    #[test]
    fn test_partial_coverage_is_less_than_total() {
        // Camera over the first gap only; the second gap is outside
        let segment = TrackSegment::new(vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.0001),
            TrackPoint::new(0.0, 0.0006),
        ]);
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.00005, 8.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        assert!(summary.distance_m > 0.0);
        assert!(
            summary.distance_m < segment.total_distance() / 2.0,
            "Exposure {} m should cover well under half of {} m",
            summary.distance_m,
            segment.total_distance()
        );
    }

    #[test]
    fn test_overlapping_cameras_do_not_inflate_the_total() {
        // Two identical cameras: per-camera accumulators double, the
        // aggregate total must not
        let segment = three_point_segment();
        let single = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);
        let double = CameraCatalog::new(vec![
            round_camera(0.0, 0.0001, 15.0),
            round_camera(0.0, 0.0001, 15.0),
        ]);
        let config = ExposureConfig::default();

        let single_summary = {
            let survey = survey_segment(&segment, &single);
            measure_exposure(&segment, &single, &survey, &config)
        };
        let double_summary = {
            let survey = survey_segment(&segment, &double);
            measure_exposure(&segment, &double, &survey, &config)
        };

        assert_eq!(double_summary.per_camera.len(), 2);
        assert!(
            (double_summary.distance_m - single_summary.distance_m).abs() < 1e-9,
            "Aggregate exposure changed from {} to {} when doubling cameras",
            single_summary.distance_m,
            double_summary.distance_m
        );
        let first = &double_summary.per_camera[&CameraId(0)];
        let second = &double_summary.per_camera[&CameraId(1)];
        assert!((first.distance_m - second.distance_m).abs() < 1e-9);
    }

    #[test]
    fn test_halving_resolution_never_reduces_exposure() {
        // A camera whose FOV boundary cuts through the middle of a gap
        let segment = TrackSegment::new(vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.0003),
        ]);
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0, 13.3)]);

        let mut previous = 0.0_f64;
        for resolution_m in [2.0, 1.0, 0.5, 0.25] {
            let config = ExposureConfig {
                resolution_m,
                margin_m: DEFAULT_MARGIN_M,
            };
            let survey = survey_segment(&segment, &catalog);
            let summary = measure_exposure(&segment, &catalog, &survey, &config);
            assert!(
                summary.distance_m >= previous - 1e-9,
                "Exposure dropped from {} to {} at resolution {}",
                previous,
                summary.distance_m,
                resolution_m
            );
            previous = summary.distance_m;
        }
    }

    #[test]
    fn test_recorded_speed_drives_exposure_time() {
        // Walking 2 m/s through full coverage: time = distance / speed
        let points: Vec<TrackPoint> = (0..3)
            .map(|i| TrackPoint::new(0.0, 0.0001 * i as f64).with_speed(2.0))
            .collect();
        let segment = TrackSegment::new(points);
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        let expected = summary.distance_m / 2.0;
        assert!(
            (summary.time_s - expected).abs() < 1e-9,
            "Expected {} s, got {} s",
            expected,
            summary.time_s
        );
    }

    #[test]
    fn test_timestamps_drive_exposure_time_without_speed() {
        // 10 s per gap at ~1.1 m/s; full coverage means nearly the whole
        // span counts as exposed
        let points: Vec<TrackPoint> = (0..3)
            .map(|i| {
                TrackPoint::new(0.0, 0.0001 * i as f64).with_time(timestamp(10 * i as i64))
            })
            .collect();
        let segment = TrackSegment::new(points);
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        assert!(
            summary.time_s > 18.0 && summary.time_s <= 20.5,
            "Expected ~20 s of exposure, got {} s",
            summary.time_s
        );
    }

    #[test]
    fn test_untimed_track_accumulates_distance_but_no_time() {
        let segment = three_point_segment();
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        assert!(summary.distance_m > 0.0);
        assert_eq!(summary.time_s, 0.0);
    }

    #[test]
    fn test_directed_camera_limits_exposure_to_its_cone() {
        // Eastward track; a camera just south of the midpoint looking
        // north with a narrow cone sees the middle of the track only
        let segment = TrackSegment::new(vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.0002),
            TrackPoint::new(0.0, 0.0004),
        ]);
        let directed = Camera {
            id: CameraId(0),
            name: None,
            latitude: -0.00005,
            longitude: 0.0002,
            radius_m: 12.0,
            kind: CameraKind::Directed {
                view_angle_deg: 60.0,
                direction_deg: 0.0,
            },
        };
        let catalog = CameraCatalog::new(vec![directed]);

        let survey = survey_segment(&segment, &catalog);
        // Only the middle point sits inside the narrow northward cone
        assert_eq!(survey.per_point.len(), 1);
        assert!(survey.observes(1, CameraId(0)));

        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());
        assert!(summary.distance_m > 0.0);
        assert!(
            summary.distance_m < segment.total_distance() / 2.0,
            "Cone exposure {} m should stay well under total {} m",
            summary.distance_m,
            segment.total_distance()
        );
    }

    #[test]
    fn test_attributed_points_are_deduplicated() {
        let segment = three_point_segment();
        let catalog = CameraCatalog::new(vec![round_camera(0.0, 0.0001, 15.0)]);

        let survey = survey_segment(&segment, &catalog);
        let summary = measure_exposure(&segment, &catalog, &survey, &ExposureConfig::default());

        let exposure = &summary.per_camera[&CameraId(0)];
        let mut attributed: Vec<usize> = exposure.attributed_points().collect();
        attributed.sort_unstable();
        attributed.dedup();
        assert_eq!(attributed.len(), exposure.attributed_points().count());
    }
}

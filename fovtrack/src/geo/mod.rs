//! Spherical-earth geometry primitives.
//!
//! Distance, bearing, and destination projection over latitude/longitude
//! pairs in degrees. Two distance functions coexist deliberately: an
//! equirectangular approximation for the sub-kilometer separations that
//! field-of-view tests operate on, and the exact haversine great-circle
//! distance for whole-route totals.

use std::f64::consts::PI;

/// Mean earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Meters spanned by one degree of arc at the equator.
const METERS_PER_DEGREE: f64 = 111_319.0;

/// Equirectangular approximation of the distance in meters between two
/// points, with the longitude delta corrected for meridian convergence at
/// the mean latitude.
///
/// Accurate to a small fraction of a percent for separations under ~1 km,
/// which is the regime every FOV test operates in. Symmetric in its
/// arguments.
#[inline]
pub fn quick_distance(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let x = lat1 - lat0;
    let y = (lon1 - lon0) * ((lat0 + lat1) / 2.0).to_radians().cos();
    METERS_PER_DEGREE * (x * x + y * y).sqrt()
}

/// Exact great-circle distance in meters between two points.
///
/// Used for whole-route distance totals; FOV membership tests use
/// [`quick_distance`] instead.
pub fn haversine_distance(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let phi0 = lat0.to_radians();
    let phi1 = lat1.to_radians();
    let dphi = (lat1 - lat0).to_radians();
    let dlambda = (lon1 - lon0).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi0.cos() * phi1.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}

/// Compass bearing in degrees from the first point to the second, using
/// the rhumb-line (Mercator) formula.
///
/// Returns a value in `[0, 360)` where 0 = north and 90 = east. Longitude
/// deltas beyond ±180° are folded back so the bearing follows the shorter
/// way around the antimeridian.
pub fn bearing(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let mut dlon = (lon1 - lon0).to_radians();
    let dphi = ((lat1.to_radians() / 2.0 + PI / 4.0).tan()
        / (lat0.to_radians() / 2.0 + PI / 4.0).tan())
    .ln();

    if dlon.abs() > PI {
        dlon = if dlon > 0.0 {
            dlon - 2.0 * PI
        } else {
            dlon + 2.0 * PI
        };
    }

    (dlon.atan2(dphi).to_degrees() + 360.0) % 360.0
}

/// Projects a new point `distance_m` meters from the origin along
/// `bearing_deg`, using the spherical direct solution.
///
/// A zero distance returns the origin unchanged.
pub fn destination(lat: f64, lon: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let theta = bearing_deg.to_radians();
    // Angular distance on the sphere.
    let delta = distance_m / 1000.0 / EARTH_RADIUS_KM;
    let phi = lat.to_radians();
    let lambda = lon.to_radians();

    let phi2 = (phi.sin() * delta.cos() + phi.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda
        + (theta.sin() * delta.sin() * phi.cos()).atan2(delta.cos() - phi.sin() * phi2.sin());

    (phi2.to_degrees(), lambda2.to_degrees())
}

/// Whether `bearing_deg` falls inside the angular cone of
/// `view_angle_deg` degrees centered on `direction_deg`.
///
/// The comparison wraps at the 0/360 boundary: a cone centered on 350°
/// with a 40° view contains both 355° and 5°. Bounds are inclusive.
pub fn angle_within(bearing_deg: f64, direction_deg: f64, view_angle_deg: f64) -> bool {
    let mut diff = (bearing_deg - direction_deg) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    diff.abs() <= view_angle_deg / 2.0
}

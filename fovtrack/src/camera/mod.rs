//! Camera catalog and field-of-view membership.
//!
//! A catalog is an immutable set of validated camera records plus the
//! single FOV-membership predicate used by every exposure stage. An
//! optional global radius override replaces each camera's individual
//! radius uniformly.

mod loader;

pub use loader::{load_catalog, CatalogError};

use serde::Serialize;

use crate::geo;

/// Field-of-view radius in meters when the catalog does not specify one.
pub const DEFAULT_RADIUS_M: f64 = 10.0;

/// Stable camera identifier, assigned from catalog row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CameraId(pub usize);

/// How a camera's field of view is bounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraKind {
    /// Omnidirectional within the radius.
    Round,
    /// Bounded by the radius and an angular cone around a view axis.
    Directed {
        /// Width of the cone in degrees, exclusive of 360 (a full circle
        /// is normalized to [`CameraKind::Round`] at load time).
        view_angle_deg: f64,
        /// Compass bearing of the view axis.
        direction_deg: f64,
    },
}

/// A fixed surveillance camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Identifier within the owning catalog.
    pub id: CameraId,
    /// Display name, when the catalog carried one.
    pub name: Option<String>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Configured field-of-view radius in meters.
    pub radius_m: f64,
    /// Field-of-view shape.
    pub kind: CameraKind,
}

/// Immutable camera catalog with the FOV-membership predicate.
#[derive(Debug, Clone, Default)]
pub struct CameraCatalog {
    cameras: Vec<Camera>,
    radius_override_m: Option<f64>,
}

impl CameraCatalog {
    /// Build a catalog, reassigning identifiers from position so that
    /// [`CameraId`] always indexes into the catalog.
    pub fn new(mut cameras: Vec<Camera>) -> Self {
        for (index, camera) in cameras.iter_mut().enumerate() {
            camera.id = CameraId(index);
        }
        Self {
            cameras,
            radius_override_m: None,
        }
    }

    /// Replace every camera's radius with a single global value.
    pub fn with_radius_override(mut self, radius_m: f64) -> Self {
        self.radius_override_m = Some(radius_m);
        self
    }

    /// The configured global radius override, if any.
    pub fn radius_override(&self) -> Option<f64> {
        self.radius_override_m
    }

    /// All cameras in catalog order.
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Number of cameras in the catalog.
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the catalog holds no cameras.
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Look up a camera by identifier.
    pub fn get(&self, id: CameraId) -> &Camera {
        &self.cameras[id.0]
    }

    /// Effective FOV radius for a camera, honoring the global override.
    pub fn effective_radius(&self, camera: &Camera) -> f64 {
        self.radius_override_m.unwrap_or(camera.radius_m)
    }

    /// Whether the position lies inside the camera's field of view.
    ///
    /// `margin_m` widens the radius test; the interpolation probe passes a
    /// small margin to compensate for the planar distance approximation.
    pub fn is_in_fov(&self, latitude: f64, longitude: f64, camera: &Camera, margin_m: f64) -> bool {
        let distance =
            geo::quick_distance(latitude, longitude, camera.latitude, camera.longitude);
        if distance > self.effective_radius(camera) + margin_m {
            return false;
        }
        match camera.kind {
            CameraKind::Round => true,
            CameraKind::Directed {
                view_angle_deg,
                direction_deg,
            } => {
                let bearing =
                    geo::bearing(camera.latitude, camera.longitude, latitude, longitude);
                geo::angle_within(bearing, direction_deg, view_angle_deg)
            }
        }
    }
}

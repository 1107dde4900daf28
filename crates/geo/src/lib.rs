//! Nearest-facility resolution and feasibility classification.
//!
//! This crate provides:
//! - Haversine distance calculations
//! - Immutable facility registries, one per connectivity technology
//! - Facility file loading with skip-and-count for malformed records
//! - A pluggable [`DistanceMetric`] and the nearest-facility [`resolve`] scan
//! - Threshold classification and distance rendering
//!
//! # Example
//!
//! ```
//! use lastmile_geo::{classify, resolve_geodesic, Coordinate, FacilityRecord, FacilitySet, Technology};
//!
//! let towers = FacilitySet::new(
//!     Technology::Wireless,
//!     vec![FacilityRecord::new(Coordinate::new(12.3480, 67.8900))],
//! );
//! let point = Coordinate::new(12.3450, 67.8900);
//!
//! let resolution = resolve_geodesic(&point, &towers);
//! let verdict = classify(Technology::Wireless, &resolution, 500.0);
//! assert!(verdict.is_feasible);
//! assert_eq!(verdict.distance_display(), "334 m");
//! ```

mod classifier;
mod error;
mod facility;
mod haversine;
mod postgis;
mod resolver;

pub mod loader;
pub mod metric;
pub mod ranking;

pub use classifier::{classify, format_distance, is_within, unavailable, FeasibilityVerdict, Outcome};
pub use error::{GeoError, GeoErrorCode, MetricError, Result};
pub use facility::{FacilityRecord, FacilitySet, Technology};
pub use haversine::{haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM, EARTH_RADIUS_M};
pub use loader::LoadReport;
pub use metric::{DistanceMetric, Geodesic, Unavailable};
pub use postgis::parse_postgis_point;
pub use resolver::{resolve, resolve_geodesic, Resolution};

use std::fmt;

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

/// A user-supplied location being checked.
pub type QueryPoint = Coordinate;

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns true if the coordinate has valid WGS-84 values.
    ///
    /// NaN fails every comparison and is therefore rejected.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

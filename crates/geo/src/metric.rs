//! Distance metrics.
//!
//! The resolver is generic over [`DistanceMetric`] so a technology can be
//! measured by straight-line distance or by an external routing service
//! behind the same interface.

use crate::{haversine_distance, Coordinate, MetricError};
use async_trait::async_trait;

/// A way of measuring the distance between two coordinates.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one metric instance serves every
/// in-flight request.
#[async_trait]
pub trait DistanceMetric: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Distance from `from` to `to` in kilometers.
    ///
    /// # Returns
    /// * `Ok(f64)` - A finite, non-negative distance
    /// * `Err(MetricError)` - The metric could not answer for this pair
    async fn distance_km(&self, from: &Coordinate, to: &Coordinate) -> Result<f64, MetricError>;
}

/// Great-circle distance. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geodesic;

#[async_trait]
impl DistanceMetric for Geodesic {
    fn name(&self) -> &'static str {
        "geodesic"
    }

    async fn distance_km(&self, from: &Coordinate, to: &Coordinate) -> Result<f64, MetricError> {
        Ok(haversine_distance(from, to))
    }
}

/// Stand-in for a metric that is not configured, e.g. a road metric without
/// a routing endpoint. Every call fails.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    /// Create with the reason reported on every call.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl DistanceMetric for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn distance_km(&self, _from: &Coordinate, _to: &Coordinate) -> Result<f64, MetricError> {
        Err(MetricError::Unavailable(self.reason.clone()))
    }
}

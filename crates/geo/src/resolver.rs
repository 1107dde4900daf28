//! Nearest-facility resolution.

use crate::{haversine_distance, Coordinate, DistanceMetric, FacilityRecord, FacilitySet, MetricError};
use serde::Serialize;

/// Closest facility to a query point.
///
/// An empty set resolves to `facility: None` with an infinite distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Closest record, if the set had any
    pub facility: Option<FacilityRecord>,
    /// Distance to it in kilometers
    pub distance_km: f64,
}

impl Resolution {
    /// Resolution of an empty set.
    pub fn none() -> Self {
        Self {
            facility: None,
            distance_km: f64::INFINITY,
        }
    }
}

/// Running minimum over a scan; only a strict improvement replaces the
/// current best, so the earliest record wins ties.
struct Nearest<'a> {
    best: Option<&'a FacilityRecord>,
    distance_km: f64,
}

impl<'a> Nearest<'a> {
    fn new() -> Self {
        Self {
            best: None,
            distance_km: f64::INFINITY,
        }
    }

    /// NaN distances are never candidates.
    #[inline]
    fn offer(&mut self, record: &'a FacilityRecord, distance_km: f64) {
        if distance_km.is_nan() {
            return;
        }
        if self.best.is_none() || distance_km < self.distance_km {
            self.best = Some(record);
            self.distance_km = distance_km;
        }
    }

    fn finish(self) -> Resolution {
        match self.best {
            Some(record) => Resolution {
                facility: Some(record.clone()),
                distance_km: self.distance_km,
            },
            None => Resolution::none(),
        }
    }
}

/// Find the facility closest to `point` under `metric`.
///
/// Linear scan in registry order. Any metric failure aborts the scan: a
/// partial minimum could name the wrong facility.
pub async fn resolve<M>(point: &Coordinate, set: &FacilitySet, metric: &M) -> Result<Resolution, MetricError>
where
    M: DistanceMetric + ?Sized,
{
    let mut nearest = Nearest::new();
    for record in set.iter() {
        let distance_km = metric.distance_km(point, &record.coordinate).await?;
        nearest.offer(record, distance_km);
    }

    let resolution = nearest.finish();
    tracing::debug!(
        technology = %set.technology(),
        metric = metric.name(),
        candidates = set.len(),
        distance_km = resolution.distance_km,
        "Resolved nearest facility"
    );
    Ok(resolution)
}

/// Great-circle resolution without an async runtime.
pub fn resolve_geodesic(point: &Coordinate, set: &FacilitySet) -> Resolution {
    let mut nearest = Nearest::new();
    for record in set.iter() {
        nearest.offer(record, haversine_distance(point, &record.coordinate));
    }
    nearest.finish()
}

//! Geodesic ranking of facilities with optional parallelism.
//!
//! Used to shortlist candidates before an expensive metric (one routing call
//! per candidate) runs over them.

use crate::{haversine_distance, Coordinate, FacilityRecord, FacilitySet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Great-circle distance to one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedFacility {
    /// Position of the record in its set
    pub index: usize,
    /// Distance in kilometers
    pub distance_km: f64,
}

/// Great-circle distances from `point` to every record, in registry order.
///
/// # Example
/// ```
/// use lastmile_geo::{ranking::geodesic_distances, Coordinate, FacilityRecord, FacilitySet, Technology};
///
/// let set = FacilitySet::new(
///     Technology::Fiber,
///     vec![
///         FacilityRecord::new(Coordinate::new(12.3500, 67.8900)),
///         FacilityRecord::new(Coordinate::new(12.3480, 67.8900)),
///     ],
/// );
/// let ranked = geodesic_distances(&Coordinate::new(12.3450, 67.8900), &set);
/// assert_eq!(ranked.len(), 2);
/// assert!(ranked[1].distance_km < ranked[0].distance_km);
/// ```
pub fn geodesic_distances(point: &Coordinate, set: &FacilitySet) -> Vec<RankedFacility> {
    let records = set.records();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        records
            .par_iter()
            .enumerate()
            .map(|(index, record)| rank_single(point, index, record))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| rank_single(point, index, record))
            .collect()
    }
}

/// Records sorted by great-circle distance, closest first.
///
/// Equal distances keep registry order.
pub fn nearest_geodesic(point: &Coordinate, set: &FacilitySet, max_results: Option<usize>) -> Vec<RankedFacility> {
    let mut ranked = geodesic_distances(point, set);

    // Stable sort, so ties stay in registry order
    ranked.sort_by(|a, b| a.distance_km.partial_cmp(&b.distance_km).unwrap_or(Ordering::Equal));

    if let Some(max) = max_results {
        ranked.truncate(max);
    }

    ranked
}

/// The `k` geodesically-nearest records as a new set, in registry order.
///
/// Keeping registry order means an exact tie under the final metric still
/// resolves to the earlier-scanned record. `k == 0` or `k >= len` returns
/// the set unchanged.
pub fn shortlist(point: &Coordinate, set: &FacilitySet, k: usize) -> FacilitySet {
    if k == 0 || k >= set.len() {
        return set.clone();
    }

    let mut picked: Vec<usize> = nearest_geodesic(point, set, Some(k))
        .into_iter()
        .map(|r| r.index)
        .collect();
    picked.sort_unstable();

    let records = set.records();
    FacilitySet::new(
        set.technology(),
        picked.into_iter().map(|i| records[i].clone()).collect(),
    )
}

#[inline]
fn rank_single(point: &Coordinate, index: usize, record: &FacilityRecord) -> RankedFacility {
    RankedFacility {
        index,
        distance_km: haversine_distance(point, &record.coordinate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Technology;

    const QUERY: Coordinate = Coordinate { latitude: 12.3450, longitude: 67.8900 };

    fn boxes() -> FacilitySet {
        FacilitySet::new(
            Technology::Fiber,
            vec![
                FacilityRecord::named(Coordinate::new(12.3600, 67.8900), "far"),
                FacilityRecord::named(Coordinate::new(12.3460, 67.8900), "near"),
                FacilityRecord::named(Coordinate::new(12.3500, 67.8900), "mid"),
                FacilityRecord::named(Coordinate::new(12.3460, 67.8900), "near-again"),
            ],
        )
    }

    #[test]
    fn test_distances_in_registry_order() {
        let ranked = geodesic_distances(&QUERY, &boxes());
        let indices: Vec<_> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn test_nearest_sorted_and_truncated() {
        let ranked = nearest_geodesic(&QUERY, &boxes(), Some(2));
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].distance_km <= ranked[1].distance_km);
        // near and near-again share a location; registry order wins
        assert_eq!(ranked[0].index, 1);
    }

    #[test]
    fn test_shortlist_keeps_registry_order() {
        let set = shortlist(&QUERY, &boxes(), 3);
        let names: Vec<_> = set.iter().map(FacilityRecord::label).collect();
        assert_eq!(names, ["near", "mid", "near-again"]);
        assert_eq!(set.technology(), Technology::Fiber);
    }

    #[test]
    fn test_shortlist_zero_means_all() {
        assert_eq!(shortlist(&QUERY, &boxes(), 0).len(), 4);
        assert_eq!(shortlist(&QUERY, &boxes(), 10).len(), 4);
    }

    #[test]
    fn test_shortlist_empty_set() {
        let set = shortlist(&QUERY, &FacilitySet::empty(Technology::Fiber), 5);
        assert!(set.is_empty());
    }
}

//! Feasibility classification and distance rendering.

use crate::{FacilityRecord, Resolution, Technology};
use serde::Serialize;

/// How a verdict's distance was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum Outcome {
    /// A nearest facility was found and measured
    Resolved,
    /// The registry for this technology is empty or failed to load
    NoFacilities,
    /// The distance metric failed for this request
    MetricUnavailable(String),
}

/// Feasibility of one technology at one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasibilityVerdict {
    /// Technology judged
    pub technology: Technology,
    /// Nearest facility, when one was resolved
    pub facility: Option<FacilityRecord>,
    /// Distance in kilometers; infinite when unknown
    pub distance_km: f64,
    /// Threshold applied, in meters
    pub threshold_m: f64,
    /// `distance_km * 1000 < threshold_m`
    pub is_feasible: bool,
    /// How the distance was obtained
    pub outcome: Outcome,
}

impl FeasibilityVerdict {
    /// Distance rendered for replies.
    pub fn distance_display(&self) -> String {
        format_distance(self.distance_km)
    }

    /// True when a facility was actually measured.
    pub fn is_known(&self) -> bool {
        self.outcome == Outcome::Resolved
    }

    /// Short verdict word for replies.
    pub fn verdict_label(&self) -> &'static str {
        match (&self.outcome, self.is_feasible) {
            (Outcome::MetricUnavailable(_), _) => "Unknown",
            (_, true) => "Feasible",
            (_, false) => "Not feasible",
        }
    }
}

/// Apply the strict threshold rule to a distance.
///
/// Infinite and NaN distances are never within a threshold.
#[inline]
pub fn is_within(distance_km: f64, threshold_m: f64) -> bool {
    distance_km * 1000.0 < threshold_m
}

/// Turn a resolution into a verdict.
pub fn classify(technology: Technology, resolution: &Resolution, threshold_m: f64) -> FeasibilityVerdict {
    let outcome = if resolution.facility.is_some() {
        Outcome::Resolved
    } else {
        Outcome::NoFacilities
    };

    FeasibilityVerdict {
        technology,
        facility: resolution.facility.clone(),
        distance_km: resolution.distance_km,
        threshold_m,
        is_feasible: outcome == Outcome::Resolved && is_within(resolution.distance_km, threshold_m),
        outcome,
    }
}

/// Verdict for a technology whose metric failed.
pub fn unavailable(technology: Technology, threshold_m: f64, reason: impl Into<String>) -> FeasibilityVerdict {
    FeasibilityVerdict {
        technology,
        facility: None,
        distance_km: f64::INFINITY,
        threshold_m,
        is_feasible: false,
        outcome: Outcome::MetricUnavailable(reason.into()),
    }
}

/// Render a distance: whole meters below 1 km, kilometers with two
/// decimals otherwise.
///
/// The unit is chosen on the unrounded meter value. Meter values round to
/// nearest with exact halves rounded down, so `0.9995` km renders `"999 m"`.
///
/// # Example
/// ```
/// use lastmile_geo::format_distance;
///
/// assert_eq!(format_distance(0.499), "499 m");
/// assert_eq!(format_distance(1.5), "1.50 km");
/// assert_eq!(format_distance(0.9995), "999 m");
/// ```
pub fn format_distance(distance_km: f64) -> String {
    if !distance_km.is_finite() {
        return "n/a".to_string();
    }

    let meters = distance_km * 1000.0;
    if meters < 1000.0 {
        let mut rounded = meters.round();
        if rounded - meters == 0.5 {
            rounded -= 1.0;
        }
        format!("{rounded:.0} m")
    } else {
        format!("{distance_km:.2} km")
    }
}

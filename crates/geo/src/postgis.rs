//! Point parsing for facility records exported from spatial databases.
//!
//! Supports:
//! - GeoJSON geometry: `{"type": "Point", "coordinates": [lng, lat]}`
//! - WKT: `POINT(lng lat)`, optionally with an `SRID=4326;` prefix

use crate::{Coordinate, GeoError, Result};

/// Parse a point from a JSON value.
///
/// Returns `None` for null or unrecognised values; the loader counts those
/// records as skipped.
///
/// # Example
/// ```
/// use lastmile_geo::parse_postgis_point;
/// use serde_json::json;
///
/// let geojson = json!({"type": "Point", "coordinates": [67.8900, 12.3480]});
/// let coord = parse_postgis_point(&geojson).unwrap();
/// assert!((coord.latitude - 12.3480).abs() < 1e-9);
///
/// let wkt = json!("SRID=4326;POINT(67.8900 12.3500)");
/// let coord = parse_postgis_point(&wkt).unwrap();
/// assert!((coord.latitude - 12.3500).abs() < 1e-9);
/// ```
pub fn parse_postgis_point(value: &serde_json::Value) -> Option<Coordinate> {
    if value.is_null() {
        return None;
    }

    if let Some(coords) = value.get("coordinates").and_then(|c| c.as_array()) {
        if coords.len() >= 2 {
            let lng = coords[0].as_f64()?;
            let lat = coords[1].as_f64()?;
            return Some(Coordinate::new(lat, lng));
        }
        return None;
    }

    value.as_str().and_then(|wkt| parse_wkt_point(wkt).ok())
}

/// Parse a WKT POINT string.
///
/// Format: `POINT(longitude latitude)`
fn parse_wkt_point(wkt: &str) -> Result<Coordinate> {
    let wkt = wkt.trim();
    let wkt = match wkt.split_once(';') {
        Some((srid, rest)) if srid.to_ascii_uppercase().starts_with("SRID=") => rest.trim(),
        _ => wkt,
    };

    let upper = wkt.to_ascii_uppercase();
    if !upper.starts_with("POINT(") && !upper.starts_with("POINT (") {
        return Err(GeoError::InvalidWkt(format!("Expected POINT, got: {wkt}")));
    }

    let start = wkt.find('(').ok_or_else(|| GeoError::InvalidWkt("Missing '('".into()))?;
    let end = wkt.find(')').ok_or_else(|| GeoError::InvalidWkt("Missing ')'".into()))?;

    if start >= end {
        return Err(GeoError::InvalidWkt("Invalid parentheses".into()));
    }

    let parts: Vec<&str> = wkt[start + 1..end].split_whitespace().collect();
    let [lng, lat] = parts.as_slice() else {
        return Err(GeoError::InvalidWkt(format!(
            "Expected 2 coordinates, got {}",
            parts.len()
        )));
    };

    let lng: f64 = lng
        .parse()
        .map_err(|_| GeoError::InvalidWkt(format!("Invalid longitude: {lng}")))?;
    let lat: f64 = lat
        .parse()
        .map_err(|_| GeoError::InvalidWkt(format!("Invalid latitude: {lat}")))?;

    Ok(Coordinate::new(lat, lng))
}

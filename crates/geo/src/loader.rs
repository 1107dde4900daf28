//! Facility file loading.
//!
//! Three source formats are understood, picked by file extension:
//!
//! - **Text** (default): one facility per line in the document-export form
//!   `Name: <name>, Latitude: <lat>, Longitude: <lon>`. Lines that do not start
//!   with `Name:` are prose and ignored.
//! - **JSON** (`.json`, `.geojson`): an array of
//!   `{"name"?, "latitude", "longitude"}` or `{"name"?, "location": <point>}`
//!   objects, or a GeoJSON `FeatureCollection` of points.
//! - **CSV** (`.csv`): `lat,lon[,name]` rows; `#` comments and a header row are ignored.
//!
//! Malformed or out-of-range records never abort a load. They are skipped
//! and counted in [`LoadReport::skipped`].

use crate::{parse_postgis_point, Coordinate, FacilityRecord, FacilitySet, GeoError, Result, Technology};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of loading one facility source.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Loaded facilities
    pub set: FacilitySet,
    /// Records that looked like facilities but could not be used
    pub skipped: usize,
}

impl LoadReport {
    /// Report for a source that yielded nothing.
    pub fn empty(technology: Technology) -> Self {
        Self {
            set: FacilitySet::empty(technology),
            skipped: 0,
        }
    }
}

/// Source file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `Name: .., Latitude: .., Longitude: ..` lines
    Text,
    /// JSON records or GeoJSON
    Json,
    /// `lat,lon[,name]` rows
    Csv,
}

impl SourceFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json" | "geojson") => SourceFormat::Json,
            Some("csv") => SourceFormat::Csv,
            _ => SourceFormat::Text,
        }
    }
}

/// Load a facility file.
///
/// Fails only when the file cannot be read or a JSON document is not JSON at
/// all; callers degrade that to an empty set.
pub fn load_path(technology: Technology, path: &Path) -> Result<LoadReport> {
    let content = std::fs::read_to_string(path).map_err(|source| GeoError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let report = parse(technology, SourceFormat::from_path(path), &content)?;
    debug!(
        technology = %technology,
        path = %path.display(),
        records = report.set.len(),
        skipped = report.skipped,
        "Facility source loaded"
    );
    if report.skipped > 0 {
        warn!(
            technology = %technology,
            path = %path.display(),
            skipped = report.skipped,
            "Skipped malformed facility records"
        );
    }
    Ok(report)
}

/// Parse source text in the given format.
pub fn parse(technology: Technology, format: SourceFormat, content: &str) -> Result<LoadReport> {
    match format {
        SourceFormat::Text => Ok(parse_text(technology, content)),
        SourceFormat::Csv => Ok(parse_csv(technology, content)),
        SourceFormat::Json => parse_json(technology, content),
    }
}

/// Parse `Name: .., Latitude: .., Longitude: ..` lines.
pub fn parse_text(technology: Technology, content: &str) -> LoadReport {
    let mut records = Vec::new();
    let mut skipped = 0;

    for line in content.lines().map(str::trim) {
        if !line.starts_with("Name:") {
            continue;
        }
        match parse_labelled_line(line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    LoadReport {
        set: FacilitySet::new(technology, records),
        skipped,
    }
}

fn parse_labelled_line(line: &str) -> Option<FacilityRecord> {
    let mut name = None;
    let mut lat = None;
    let mut lon = None;

    for field in line.split(',') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => name = Some(value),
            "latitude" | "lat" => lat = Some(value.parse::<f64>().ok()?),
            "longitude" | "lon" | "lng" => lon = Some(value.parse::<f64>().ok()?),
            _ => {}
        }
    }

    build_record(lat?, lon?, name)
}

/// Parse `lat,lon[,name]` rows.
pub fn parse_csv(technology: Technology, content: &str) -> LoadReport {
    let mut records = Vec::new();
    let mut skipped = 0;
    let mut first_row = true;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let is_first = std::mem::replace(&mut first_row, false);

        let mut cols = line.splitn(3, ',').map(str::trim);
        let lat = cols.next().and_then(|v| v.parse::<f64>().ok());
        let lon = cols.next().and_then(|v| v.parse::<f64>().ok());
        let name = cols.next();

        match (lat, lon) {
            (Some(lat), Some(lon)) => match build_record(lat, lon, name) {
                Some(record) => records.push(record),
                None => skipped += 1,
            },
            // A non-numeric first row is a header
            _ if is_first => {}
            _ => skipped += 1,
        }
    }

    LoadReport {
        set: FacilitySet::new(technology, records),
        skipped,
    }
}

/// Parse JSON records or a GeoJSON FeatureCollection.
pub fn parse_json(technology: Technology, content: &str) -> Result<LoadReport> {
    let document: Value = serde_json::from_str(content)?;

    let items: Vec<&Value> = if let Some(features) = document.get("features").and_then(Value::as_array) {
        features.iter().collect()
    } else if let Some(array) = document.as_array() {
        array.iter().collect()
    } else {
        return Err(GeoError::InvalidCoordinate(
            "expected a JSON array or a FeatureCollection".into(),
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for item in items {
        match json_record(item) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    Ok(LoadReport {
        set: FacilitySet::new(technology, records),
        skipped,
    })
}

fn json_record(item: &Value) -> Option<FacilityRecord> {
    // GeoJSON Feature
    if let Some(geometry) = item.get("geometry") {
        let coord = parse_postgis_point(geometry)?;
        let name = item
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str);
        return build_record(coord.latitude, coord.longitude, name);
    }

    let name = item.get("name").and_then(Value::as_str);

    if let (Some(lat), Some(lon)) = (
        item.get("latitude").and_then(Value::as_f64),
        item.get("longitude").and_then(Value::as_f64),
    ) {
        return build_record(lat, lon, name);
    }

    let coord = parse_postgis_point(item.get("location")?)?;
    build_record(coord.latitude, coord.longitude, name)
}

fn build_record(lat: f64, lon: f64, name: Option<&str>) -> Option<FacilityRecord> {
    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return None;
    }
    Some(match name {
        Some(name) => FacilityRecord::named(coordinate, name),
        None => FacilityRecord::new(coordinate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC_EXPORT: &str = "\
5G Tower Details
Name: North Ridge, Latitude: 12.3480, Longitude: 67.8900
Name: Harbor, Latitude: 12.3600, Longitude: 67.9100
Name: Broken, Latitude: twelve, Longitude: 67.9100
Name: Missing longitude, Latitude: 12.3600
Name: Out of range, Latitude: 123.0, Longitude: 67.9100
Prepared by network planning
";

    #[test]
    fn test_text_skips_and_counts() {
        let report = parse_text(Technology::Wireless, DOC_EXPORT);
        assert_eq!(report.set.len(), 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.set.records()[0].name.as_deref(), Some("North Ridge"));
        assert_eq!(report.set.technology(), Technology::Wireless);
    }

    #[test]
    fn test_text_preserves_order() {
        let report = parse_text(Technology::Wireless, DOC_EXPORT);
        let names: Vec<_> = report.set.iter().map(FacilityRecord::label).collect();
        assert_eq!(names, ["North Ridge", "Harbor"]);
    }

    #[test]
    fn test_csv_with_header_and_comments() {
        let csv = "lat,lon,name\n# fiber boxes\n12.35,67.89,FB-01\n12.36,67.90\nbad,row\n";
        let report = parse_csv(Technology::Fiber, csv);
        assert_eq!(report.set.len(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.set.records()[0].label(), "FB-01");
        assert_eq!(report.set.records()[1].label(), "12.36, 67.9");
    }

    #[test]
    fn test_json_record_shapes() {
        let json = r#"[
            {"name": "FB-01", "latitude": 12.35, "longitude": 67.89},
            {"location": {"type": "Point", "coordinates": [67.90, 12.36]}},
            {"name": "FB-03", "location": "POINT(67.91 12.37)"},
            {"name": "no coordinates"},
            {"latitude": 95.0, "longitude": 10.0}
        ]"#;
        let report = parse_json(Technology::Fiber, json).unwrap();
        assert_eq!(report.set.len(), 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.set.records()[2].name.as_deref(), Some("FB-03"));
    }

    #[test]
    fn test_geojson_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [67.89, 12.348]},
                 "properties": {"name": "North Ridge"}},
                {"type": "Feature", "geometry": null, "properties": {}}
            ]
        }"#;
        let report = parse_json(Technology::Wireless, json).unwrap();
        assert_eq!(report.set.len(), 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_json_not_a_collection() {
        assert!(parse_json(Technology::Fiber, r#"{"towers": 3}"#).is_err());
        assert!(parse_json(Technology::Fiber, "not json").is_err());
    }

    #[test]
    fn test_load_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxes.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "12.35,67.89,FB-01").unwrap();

        let report = load_path(Technology::Fiber, &path).unwrap();
        assert_eq!(report.set.len(), 1);
        assert_eq!(SourceFormat::from_path(Path::new("x.GeoJSON")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("towers.txt")), SourceFormat::Text);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_path(Technology::Wireless, Path::new("/nonexistent/towers.txt")).unwrap_err();
        assert_eq!(err.code(), crate::GeoErrorCode::SourceUnavailable);
    }
}

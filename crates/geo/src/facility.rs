//! Facility records and per-technology registries.

use crate::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Last-mile connectivity technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    /// Wireless point-to-point service fed from a tower
    Wireless,
    /// Fiber drop fed from a distribution box
    Fiber,
}

impl Technology {
    /// Every known technology, in report order.
    pub const ALL: [Technology; 2] = [Technology::Wireless, Technology::Fiber];

    /// Configuration key for this technology.
    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Wireless => "wireless",
            Technology::Fiber => "fiber",
        }
    }

    /// Name used in replies.
    pub fn display_name(&self) -> &'static str {
        match self {
            Technology::Wireless => "Wireless",
            Technology::Fiber => "Fiber",
        }
    }

    /// Word for one facility of this technology.
    pub fn facility_noun(&self) -> &'static str {
        match self {
            Technology::Wireless => "tower",
            Technology::Fiber => "fiber box",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wireless" | "p2p" | "5g" | "tower" => Ok(Technology::Wireless),
            "fiber" | "fibre" | "ftth" => Ok(Technology::Fiber),
            other => Err(format!("unknown technology '{other}'")),
        }
    }
}

/// One infrastructure node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Location of the node
    pub coordinate: Coordinate,
    /// Display name, when the data source has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FacilityRecord {
    /// Unnamed record.
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate, name: None }
    }

    /// Named record. Blank names are treated as absent.
    pub fn named(coordinate: Coordinate, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() { None } else { Some(name.trim().to_string()) };
        Self { coordinate, name }
    }

    /// Name if present, coordinates otherwise.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.coordinate.to_string(),
        }
    }
}

/// Immutable set of facilities for one technology.
///
/// Records sit behind an `Arc`, so clones are cheap and concurrent readers
/// need no locking. Reloading means building a new set.
#[derive(Debug, Clone)]
pub struct FacilitySet {
    technology: Technology,
    records: Arc<[FacilityRecord]>,
}

impl FacilitySet {
    /// Build a set from records in scan order.
    pub fn new(technology: Technology, records: Vec<FacilityRecord>) -> Self {
        Self {
            technology,
            records: records.into(),
        }
    }

    /// A set with no records.
    pub fn empty(technology: Technology) -> Self {
        Self::new(technology, Vec::new())
    }

    /// Technology the records belong to.
    pub fn technology(&self) -> Technology {
        self.technology
    }

    /// Records in scan order.
    pub fn records(&self) -> &[FacilityRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in scan order.
    pub fn iter(&self) -> std::slice::Iter<'_, FacilityRecord> {
        self.records.iter()
    }
}

//! Error types for the geo crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur while reading facility data.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Invalid WKT format
    #[error("Invalid WKT format: {0}")]
    InvalidWkt(String),

    /// Invalid coordinate values
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Facility source could not be read
    #[error("Failed to read facility source {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Error code for integration with lastmile-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Invalid WKT format
    InvalidWkt = 10001,
    /// Invalid coordinate values
    InvalidCoordinate = 10002,
    /// JSON parsing error
    JsonParsing = 10003,
    /// Facility source unreadable
    SourceUnavailable = 10004,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidWkt(_) => GeoErrorCode::InvalidWkt,
            GeoError::InvalidCoordinate(_) => GeoErrorCode::InvalidCoordinate,
            GeoError::JsonError(_) => GeoErrorCode::JsonParsing,
            GeoError::Io { .. } => GeoErrorCode::SourceUnavailable,
        }
    }
}

/// Failures of a distance metric. Any of these makes the affected
/// technology's feasibility unknown for the current request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetricError {
    /// The metric did not answer in time
    #[error("distance metric timed out after {0:?}")]
    Timeout(Duration),

    /// The metric is not configured or its backend is unreachable
    #[error("distance metric unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with something unusable
    #[error("invalid distance response: {0}")]
    InvalidResponse(String),

    /// The backend found no route between the points
    #[error("no route between the points")]
    NoRoute,
}

//! Error types for the routing and link clients

use lastmile_geo::MetricError;
use thiserror::Error;

/// Result type alias for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Routing client errors
#[derive(Error, Debug)]
pub enum RoutingError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service returned an error response
    #[error("routing service error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error body from the service
        message: String,
    },

    /// Circuit breaker is open
    #[error("Circuit breaker is open - routing service temporarily unavailable")]
    CircuitOpen,

    /// Request timeout
    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Service answered but found no route
    #[error("no route found ({0})")]
    NoRoute(String),

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl RoutingError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a service response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            // 5xx and 429
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout(_) => true,
            Self::CircuitOpen
            | Self::Config(_)
            | Self::Json(_)
            | Self::NoRoute(_)
            | Self::InvalidUrl(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }
}

impl From<RoutingError> for MetricError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::Timeout(after) => MetricError::Timeout(after),
            RoutingError::Request(e) if e.is_timeout() => MetricError::Unavailable(format!("request timed out: {e}")),
            RoutingError::NoRoute(_) => MetricError::NoRoute,
            RoutingError::Json(e) => MetricError::InvalidResponse(e.to_string()),
            other => MetricError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retryable_statuses() {
        assert!(RoutingError::api_response(503, "busy").is_retryable());
        assert!(RoutingError::api_response(429, "slow down").is_retryable());
        assert!(!RoutingError::api_response(400, "bad coordinates").is_retryable());
        assert!(RoutingError::api_response(404, "").is_client_error());
        assert!(RoutingError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!RoutingError::CircuitOpen.is_retryable());
        assert!(!RoutingError::NoRoute("NoRoute".into()).is_retryable());
    }

    #[test]
    fn test_metric_error_mapping() {
        let timeout: MetricError = RoutingError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(timeout, MetricError::Timeout(Duration::from_secs(5)));

        let no_route: MetricError = RoutingError::NoRoute("NoRoute".into()).into();
        assert_eq!(no_route, MetricError::NoRoute);

        let open: MetricError = RoutingError::CircuitOpen.into();
        assert!(matches!(open, MetricError::Unavailable(_)));
    }
}

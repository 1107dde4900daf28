//! Configuration for the routing client
//!
//! Built from the `[routing]` section of the lastmile configuration, which
//! already carries the environment overrides.

use crate::error::{RoutingError, RoutingResult};
use lastmile_core::config::{Config, RoutingSection};
use lastmile_core::retry::{CircuitBreakerConfig, RetryConfig};
use std::time::Duration;

/// Default routing profile
const DEFAULT_PROFILE: &str = "foot";

/// Client configuration
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Base URL of the OSRM-compatible service
    pub endpoint: String,
    /// Bearer key sent with every request
    pub api_key: Option<String>,
    /// Routing profile path segment
    pub profile: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Circuit breaker configuration
    pub circuit: CircuitBreakerConfig,
}

impl RoutingConfig {
    /// Configuration for an endpoint with defaults for everything else
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            profile: DEFAULT_PROFILE.to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryConfig::quick(),
            circuit: CircuitBreakerConfig::default(),
        }
    }

    /// Build from a `[routing]` section. `None` when no endpoint is configured.
    pub fn from_section(section: &RoutingSection) -> Option<Self> {
        let endpoint = section.endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }

        let mut config = Self::new(endpoint)
            .with_profile(section.profile.clone())
            .with_timeout(Duration::from_secs(section.timeout_secs));
        config.api_key = section.api_key.clone();
        Some(config)
    }

    /// Build from the loaded configuration
    pub fn from_config(config: &Config) -> Option<Self> {
        Self::from_section(&config.schema.routing)
    }

    /// Builder-style method to set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder-style method to set the profile
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style method to set circuit breaker config
    #[must_use]
    pub fn with_circuit(mut self, circuit: CircuitBreakerConfig) -> Self {
        self.circuit = circuit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> RoutingResult<()> {
        if self.endpoint.is_empty() {
            return Err(RoutingError::config("endpoint cannot be empty"));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(RoutingError::config("endpoint must start with http:// or https://"));
        }

        if self.profile.is_empty() || self.profile.contains('/') {
            return Err(RoutingError::config(format!("invalid profile '{}'", self.profile)));
        }

        if self.timeout.is_zero() {
            return Err(RoutingError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

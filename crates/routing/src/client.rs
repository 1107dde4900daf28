//! Routing service client

use crate::config::RoutingConfig;
use crate::endpoints::RouteApi;
use crate::error::{RoutingError, RoutingResult};
use lastmile_core::retry::{CircuitBreaker, CircuitState};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Routing service client with built-in resilience patterns
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker so an outage fails fast instead of stalling every request
/// - Request correlation IDs for tracing
///
/// Clones share the connection pool and the circuit breaker.
#[derive(Clone)]
pub struct RoutingClient {
    inner: Client,
    config: Arc<RoutingConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl RoutingClient {
    /// Create a new client with specific configuration
    pub fn with_config(config: RoutingConfig) -> RoutingResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("lastmile-routing/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| RoutingError::config("api_key contains invalid header characters"))?;
            default_headers.insert(AUTHORIZATION, value);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(RoutingError::Request)?;

        let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit.clone()));

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Get the endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    /// Access route endpoints
    #[must_use]
    pub fn route(&self) -> RouteApi {
        RouteApi::new(self.clone())
    }

    /// Perform a GET request relative to the endpoint
    #[instrument(skip(self), fields(request_id))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> RoutingResult<T> {
        let url = format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path.trim_start_matches('/'));
        self.get_url(&url).await
    }

    /// Perform a GET request to an absolute URL with full resilience patterns
    pub async fn get_url<T: DeserializeOwned>(&self, url: &str) -> RoutingResult<T> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        if !self.circuit_breaker.can_execute() {
            warn!(
                request_id = %request_id,
                url = %url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(RoutingError::CircuitOpen);
        }

        self.execute_with_retry(&request_id, url).await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T: DeserializeOwned>(&self, request_id: &str, url: &str) -> RoutingResult<T> {
        let retry_config = &self.config.retry;
        let mut last_error: Option<RoutingError> = None;

        for attempt in 0..retry_config.max_attempts {
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self.execute_single_request(request_id, url).await;
            let elapsed = start.elapsed();

            match result {
                Ok(value) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis(),
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    // A 4xx means the service is up; only count outages
                    if !e.is_client_error() {
                        self.circuit_breaker.record_failure();
                    }

                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(RoutingError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned>(&self, request_id: &str, url: &str) -> RoutingResult<T> {
        let response = self
            .inner
            .get(url)
            .header(X_REQUEST_ID, request_id)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RoutingError::Timeout(self.config.timeout)
                } else {
                    RoutingError::Request(e)
                }
            })?;
        handle_response(response).await
    }
}

/// Handle HTTP response and deserialize
async fn handle_response<T: DeserializeOwned>(response: Response) -> RoutingResult<T> {
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    } else {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(RoutingError::api_response(status.as_u16(), message))
    }
}

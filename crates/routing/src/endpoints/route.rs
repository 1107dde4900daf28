//! Route endpoint of an OSRM-compatible service

use crate::client::RoutingClient;
use crate::error::{RoutingError, RoutingResult};
use lastmile_geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Route API interface
#[derive(Clone)]
pub struct RouteApi {
    client: RoutingClient,
}

impl RouteApi {
    /// Create a new route API interface
    pub(crate) fn new(client: RoutingClient) -> Self {
        Self { client }
    }

    /// Fetch the route between two points
    pub async fn fetch(&self, from: &Coordinate, to: &Coordinate) -> RoutingResult<RouteResponse> {
        let path = route_path(&self.client.config().profile, from, to);
        self.client.get(&path).await
    }

    /// Length of the best route in meters
    pub async fn distance_m(&self, from: &Coordinate, to: &Coordinate) -> RoutingResult<f64> {
        self.fetch(from, to).await?.best_distance_m()
    }
}

/// Service path for a route query. Coordinates go longitude first.
pub fn route_path(profile: &str, from: &Coordinate, to: &Coordinate) -> String {
    format!(
        "route/v1/{profile}/{},{};{},{}?overview=false",
        from.longitude, from.latitude, to.longitude, to.latitude
    )
}

/// Route response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    /// `"Ok"` on success, an error code such as `"NoRoute"` otherwise
    pub code: String,
    /// Candidate routes, best first
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Error detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Length in meters
    pub distance: f64,
    /// Travel time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl RouteResponse {
    /// Distance of the first route, validated.
    pub fn best_distance_m(&self) -> RoutingResult<f64> {
        if self.code != "Ok" {
            return Err(RoutingError::NoRoute(self.code.clone()));
        }
        let route = self
            .routes
            .first()
            .ok_or_else(|| RoutingError::NoRoute("no routes returned".into()))?;

        if !route.distance.is_finite() || route.distance < 0.0 {
            return Err(RoutingError::api_response(
                200,
                format!("invalid route distance {}", route.distance),
            ));
        }
        Ok(route.distance)
    }
}

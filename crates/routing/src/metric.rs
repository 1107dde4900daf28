//! Road-network distance metric

use crate::client::RoutingClient;
use async_trait::async_trait;
use lastmile_geo::{Coordinate, DistanceMetric, MetricError};
use tracing::warn;

/// Distance along the routing service's best route.
#[derive(Clone)]
pub struct RoadNetwork {
    client: RoutingClient,
}

impl RoadNetwork {
    /// Metric over a routing client
    pub fn new(client: RoutingClient) -> Self {
        Self { client }
    }

    /// The underlying client
    pub fn client(&self) -> &RoutingClient {
        &self.client
    }
}

#[async_trait]
impl DistanceMetric for RoadNetwork {
    fn name(&self) -> &'static str {
        "road"
    }

    async fn distance_km(&self, from: &Coordinate, to: &Coordinate) -> Result<f64, MetricError> {
        match self.client.route().distance_m(from, to).await {
            Ok(meters) => Ok(meters / 1000.0),
            Err(e) => {
                warn!(from = %from, to = %to, error = %e, "Road distance unavailable");
                Err(e.into())
            }
        }
    }
}

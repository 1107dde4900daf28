//! HTTP clients for the lastmile feasibility checks
//!
//! This crate provides:
//!
//! - **Routing client**: an OSRM-compatible route query with retries,
//!   circuit breaking and request correlation ids
//! - **Road metric**: [`RoadNetwork`], a [`lastmile_geo::DistanceMetric`]
//!   backed by the routing client
//! - **Short-link expansion**: redirect-following for map short links with an
//!   insert-only cache
//!
//! # Example
//!
//! ```rust,no_run
//! use lastmile_geo::{resolve, Coordinate, FacilityRecord, FacilitySet, Technology};
//! use lastmile_routing::{RoadNetwork, RoutingClient, RoutingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RoutingConfig::new("https://router.example.net");
//!     let metric = RoadNetwork::new(RoutingClient::with_config(config)?);
//!
//!     let boxes = FacilitySet::new(
//!         Technology::Fiber,
//!         vec![FacilityRecord::new(Coordinate::new(12.3500, 67.8900))],
//!     );
//!     let resolution = resolve(&Coordinate::new(12.3450, 67.8900), &boxes, &metric).await?;
//!     println!("{} km by road", resolution.distance_km);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod links;
pub mod metric;

pub use client::RoutingClient;
pub use config::RoutingConfig;
pub use error::{RoutingError, RoutingResult};
pub use links::{is_short_link, HttpLinkResolver, LinkResolver, ShortLinkExpander};
pub use metric::RoadNetwork;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::RoutingClient;
    pub use crate::config::RoutingConfig;
    pub use crate::endpoints::RouteApi;
    pub use crate::error::{RoutingError, RoutingResult};
    pub use crate::links::{LinkResolver, ShortLinkExpander};
    pub use crate::metric::RoadNetwork;
}

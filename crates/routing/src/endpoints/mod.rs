//! Endpoint-specific API implementations
//!
//! | Module | Service path | Description |
//! |--------|--------------|-------------|
//! | `route` | `route/v1/{profile}` | Distance of the best route between two points |

pub mod route;

pub use route::RouteApi;

//! Messaging shell around the lastmile feasibility core
//!
//! This crate provides:
//!
//! - **Parsing**: coordinates from plain pairs and map URLs, short-link detection
//! - **Access**: a static allow-list and per-caller response roles
//! - **Sessions**: the per-chat location / menu / order-code flow
//! - **Service**: concurrent resolution and classification per technology
//! - **Reports**: one reply text per request, detailed or summary
//! - **Ports**: inbound/outbound traits with channel and JSON-lines adapters
//! - **Dispatcher**: the receive loop tying everything together
//!
//! # Example
//!
//! ```rust
//! use lastmile_bot::{render, FeasibilityService, Role, TechnologyEntry};
//! use lastmile_geo::{Coordinate, FacilityRecord, FacilitySet, Technology};
//!
//! # tokio_test::block_on(async {
//! let towers = FacilitySet::new(
//!     Technology::Wireless,
//!     vec![FacilityRecord::new(Coordinate::new(12.3480, 67.8900))],
//! );
//! let service = FeasibilityService::builder()
//!     .technology(TechnologyEntry::geodesic(towers, 500.0))
//!     .build();
//!
//! let report = service.check(Coordinate::new(12.3450, 67.8900)).await;
//! assert!(render(&report, Role::Summary).contains("Wireless: Feasible (334 m"));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod access;
pub mod dispatcher;
pub mod orders;
pub mod parse;
pub mod ports;
pub mod report;
pub mod service;
pub mod session;

pub use access::{Access, AccessPolicy, Role};
pub use dispatcher::{Dispatcher, DispatcherBuilder, LinkExpander};
pub use orders::{InMemoryOrders, NotFound, OrderStatusLookup};
pub use parse::{extract, extract_coordinates, Extracted};
pub use ports::{
    memory_ports, ChannelInbound, ChannelOutbound, InboundMessage, InboundPort, JsonLinesInbound,
    JsonLinesOutbound, MemoryPorts, OutboundMessage, OutboundPort, Payload,
};
pub use report::render;
pub use service::{FeasibilityReport, FeasibilityService, LoadSummary, TechnologyEntry};
pub use session::{Action, Session, SessionEvent, SessionState};

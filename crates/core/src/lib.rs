//! Core utilities shared by the lastmile crates
//!
//! This crate provides the pieces every other crate leans on:
//!
//! - **Error handling**: coded errors with context and recovery suggestions
//! - **Configuration**: TOML-based configuration with per-technology sections
//!   and environment overrides
//! - **Resilience**: retry policies with exponential backoff and a circuit breaker
//! - **Caching**: an insert-only in-memory cache for derived values
//!
//! # Example
//!
//! ```rust,no_run
//! use lastmile_core::config::Config;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! for (name, tech) in &config.schema.technologies {
//!     println!("{name}: threshold {} m", tech.threshold_m);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::MemoCache;
    pub use crate::config::{Config, ConfigSchema, MetricKind, TechnologyConfig};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};
}

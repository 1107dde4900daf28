//! Configuration loading and schema definitions

mod loader;
mod schema;

pub use loader::{
    apply_env_overrides, Config, ENV_ROUTING_API_KEY, ENV_ROUTING_TIMEOUT_SECS, ENV_ROUTING_URL,
};
pub use schema::*;

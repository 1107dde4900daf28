//! Configuration file loading

use super::schema::{ConfigSchema, MetricKind};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the routing endpoint
pub const ENV_ROUTING_URL: &str = "LASTMILE_ROUTING_URL";
/// Environment variable overriding the routing key
pub const ENV_ROUTING_API_KEY: &str = "LASTMILE_ROUTING_API_KEY";
/// Environment variable overriding the routing timeout
pub const ENV_ROUTING_TIMEOUT_SECS: &str = "LASTMILE_ROUTING_TIMEOUT_SECS";

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed schema
    pub schema: ConfigSchema,
    /// File the schema came from, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults.
    ///
    /// An explicit path must exist. Without one, the standard locations are
    /// searched and defaults are used when none is found. Environment
    /// overrides are applied and the result validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let mut schema = if let Some(p) = &config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        apply_env_overrides(&mut schema, |key| std::env::var(key).ok());
        tracing::debug!(
            path = ?config_path,
            technologies = schema.technologies.len(),
            "Configuration loaded"
        );
        let config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        let config = Self { schema, path: None };
        config.validate()?;
        Ok(config)
    }

    /// Load with defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Resolve a data source path relative to the configuration file
    pub fn resolve_source(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            return source.to_path_buf();
        }
        match self.path.as_deref().and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(source),
            _ => source.to_path_buf(),
        }
    }

    /// Routing timeout as a duration
    pub fn routing_timeout(&self) -> Duration {
        Duration::from_secs(self.schema.routing.timeout_secs)
    }

    /// Validate thresholds and routing settings
    pub fn validate(&self) -> Result<()> {
        for (name, tech) in &self.schema.technologies {
            if !tech.threshold_m.is_finite() || tech.threshold_m <= 0.0 {
                return Err(Error::config_invalid(format!(
                    "threshold_m for '{name}' must be a positive number, got {}",
                    tech.threshold_m
                )));
            }
        }

        if let Some(endpoint) = &self.schema.routing.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(Error::config_invalid(format!(
                    "routing.endpoint must start with http:// or https://, got '{endpoint}'"
                )));
            }
        }

        if self.schema.routing.timeout_secs == 0 {
            return Err(Error::config_invalid("routing.timeout_secs cannot be zero"));
        }

        Ok(())
    }

    /// True when at least one technology needs the routing service
    pub fn uses_road_metric(&self) -> bool {
        self.schema
            .technologies
            .values()
            .any(|t| t.metric == MetricKind::Road)
    }
}

/// Apply environment overrides using the supplied lookup
pub fn apply_env_overrides<F>(schema: &mut ConfigSchema, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_ROUTING_URL).filter(|v| !v.is_empty()) {
        schema.routing.endpoint = Some(url);
    }
    if let Some(key) = lookup(ENV_ROUTING_API_KEY).filter(|v| !v.is_empty()) {
        schema.routing.api_key = Some(key);
    }
    if let Some(secs) = lookup(ENV_ROUTING_TIMEOUT_SECS).and_then(|s| s.parse().ok()) {
        schema.routing.timeout_secs = secs;
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = ["lastmile.toml", ".lastmile.toml", ".config/lastmile.toml"];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("lastmile").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {e}", path.display())).with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::config(format!("Failed to parse config file {}: {e}", path.display())).with_source(e)
    })
}

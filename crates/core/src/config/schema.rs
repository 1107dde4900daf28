//! Configuration schema definitions
//!
//! Every section defaults sensibly so an empty file (or no file) yields a
//! working single-process configuration with geodesic wireless checks and
//! road-network fiber checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the wireless technology section
pub const WIRELESS: &str = "wireless";

/// Name of the fiber technology section
pub const FIBER: &str = "fiber";

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Process-wide settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Per-technology thresholds, metrics and data sources keyed by technology name.
    /// When the section is present only the listed technologies are registered.
    #[serde(default = "default_technologies")]
    pub technologies: BTreeMap<String, TechnologyConfig>,

    /// Routing service used by the road-network metric
    #[serde(default)]
    pub routing: RoutingSection,

    /// Caller allow-list and response roles
    #[serde(default)]
    pub access: AccessConfig,

    /// Interactive flow settings
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            technologies: default_technologies(),
            routing: RoutingSection::default(),
            access: AccessConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

fn default_technologies() -> BTreeMap<String, TechnologyConfig> {
    let mut technologies = BTreeMap::new();
    technologies.insert(
        WIRELESS.to_string(),
        TechnologyConfig {
            threshold_m: 500.0,
            metric: MetricKind::Geodesic,
            source: None,
        },
    );
    technologies.insert(
        FIBER.to_string(),
        TechnologyConfig {
            threshold_m: 150.0,
            metric: MetricKind::Road,
            source: None,
        },
    );
    technologies
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Name used in replies and logs
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Send a "processing" acknowledgement before the result
    #[serde(default)]
    pub acknowledge: bool,

    /// Default log level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            acknowledge: false,
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "lastmile".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Distance metric used for a technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Great-circle distance
    Geodesic,
    /// Route distance from the routing service
    Road,
}

/// Settings for one technology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologyConfig {
    /// Feasibility threshold in meters (strictly-less-than)
    pub threshold_m: f64,

    /// Distance metric
    #[serde(default = "default_metric")]
    pub metric: MetricKind,

    /// Facility data file (text export, JSON or CSV)
    #[serde(default)]
    pub source: Option<PathBuf>,
}

fn default_metric() -> MetricKind {
    MetricKind::Geodesic
}

/// Routing service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSection {
    /// Base URL of an OSRM-compatible routing service; unset disables road metrics
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer key sent with routing requests
    #[serde(default)]
    pub api_key: Option<String>,

    /// Routing profile (foot, driving, ...)
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Upper bound for one technology's road-metric resolution, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Geodesically-nearest candidates passed to the routing service (0 = all)
    #[serde(default = "default_candidates")]
    pub candidates: usize,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            profile: default_profile(),
            timeout_secs: default_timeout_secs(),
            candidates: default_candidates(),
        }
    }
}

fn default_profile() -> String {
    "foot".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_candidates() -> usize {
    5
}

/// Caller access settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccessConfig {
    /// Chat identifiers allowed to use the bot; `"*"` allows everyone
    #[serde(default)]
    pub allow_list: Vec<String>,

    /// Chat identifiers that receive detailed responses
    #[serde(default)]
    pub detailed: Vec<String>,

    /// Reply sent to rejected callers; unset means silent drop
    #[serde(default)]
    pub reject_message: Option<String>,
}

/// Interactive flow settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Offer "new check" / "order status" before answering a location
    #[serde(default)]
    pub interactive: bool,
}

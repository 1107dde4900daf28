//! Subcommands

pub mod check;
pub mod inspect;
pub mod serve;

use lastmile_bot::{FeasibilityService, LoadSummary};
use lastmile_core::config::Config;
use lastmile_core::error::exit_codes;
use lastmile_core::ResultExt;
use lastmile_telemetry::MetricsRegistry;
use std::sync::Arc;

/// Load every configured registry and build the service.
pub fn load_service(config: &Config) -> anyhow::Result<(FeasibilityService, Vec<LoadSummary>)> {
    let loaded = FeasibilityService::from_config(config, Arc::new(MetricsRegistry::new()))
        .context("while loading facility registries")?;
    Ok(loaded)
}

/// Process exit code for a failed command.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    let Some(error) = error.downcast_ref::<lastmile_core::Error>() else {
        return exit_codes::FAILURE;
    };
    match error.code.category() {
        "Configuration" => exit_codes::CONFIG_ERROR,
        "Data" => exit_codes::DATA_ERROR,
        "Input" => exit_codes::INPUT_ERROR,
        _ => exit_codes::FAILURE,
    }
}

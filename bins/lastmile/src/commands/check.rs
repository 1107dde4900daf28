//! One-shot feasibility checks

use super::load_service;
use lastmile_bot::{extract, extract_coordinates, render, Extracted, FeasibilityReport, Role};
use lastmile_core::config::Config;
use lastmile_core::{Error, ErrorCode};
use lastmile_geo::Coordinate;
use lastmile_routing::ShortLinkExpander;
use tracing::{debug, warn};

/// Check a coordinate given on the command line.
pub async fn run(config: &Config, latitude: f64, longitude: f64, json: bool, detailed: bool) -> anyhow::Result<()> {
    let point = Coordinate::new(latitude, longitude);
    if !point.is_valid() {
        return Err(Error::new(ErrorCode::MalformedInput, format!("coordinate out of range: {point}"))
            .with_suggestion("Latitude must be within -90..90 and longitude within -180..180")
            .into());
    }
    check_point(config, point, json, detailed).await
}

/// Parse a message the way the bot would, then check it.
///
/// Text without a location prints nothing and succeeds, matching the bot's
/// silence.
pub async fn run_text(config: &Config, text: &str, json: bool, detailed: bool) -> anyhow::Result<()> {
    let point = match extract(text) {
        Some(Extracted::Point(point)) => Some(point),
        Some(Extracted::ShortLink(url)) => {
            let expander = ShortLinkExpander::http(config.routing_timeout())?;
            match expander.expand(&url).await {
                Ok(expanded) => extract_coordinates(&expanded),
                Err(e) => {
                    warn!(url = %url, error = %e, "Short link expansion failed");
                    None
                }
            }
        }
        None => None,
    };

    match point {
        Some(point) => check_point(config, point, json, detailed).await,
        None => {
            debug!("No location in text");
            Ok(())
        }
    }
}

async fn check_point(config: &Config, point: Coordinate, json: bool, detailed: bool) -> anyhow::Result<()> {
    let (service, _) = load_service(config)?;
    let report = service.check(point).await;
    print_report(&report, json, detailed)
}

fn print_report(report: &FeasibilityReport, json: bool, detailed: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let role = if detailed { Role::Detailed } else { Role::Summary };
        println!("{}", render(report, role));
    }
    Ok(())
}

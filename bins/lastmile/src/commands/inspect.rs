//! Registry inspection

use super::load_service;
use lastmile_bot::AccessPolicy;
use lastmile_core::config::Config;
use lastmile_geo::format_distance;
use owo_colors::OwoColorize;

/// Print what each technology loaded.
pub fn run(config: &Config, json: bool) -> anyhow::Result<()> {
    let (_, summaries) = load_service(config)?;
    let access = AccessPolicy::from_config(&config.schema.access);

    if json {
        let output = serde_json::json!({
            "config": config.path,
            "technologies": summaries,
            "routing_configured": config.schema.routing.endpoint.is_some(),
            "open_access": access.is_open(),
            "interactive": config.schema.session.interactive,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match &config.path {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Config: {}", "defaults".dimmed()),
    }
    println!();

    for summary in &summaries {
        let status = if summary.available {
            "ok".green().to_string()
        } else {
            "unavailable".red().to_string()
        };
        let source = summary
            .source
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());
        println!(
            "  {:<10} {:>6} records  {:>4} skipped  {:<11} threshold {:<8} source {} [{}]",
            summary.technology.display_name().bold(),
            summary.records,
            summary.skipped,
            summary.metric,
            format_distance(summary.threshold_m / 1000.0),
            source,
            status
        );
    }

    println!();
    println!(
        "Access: {}",
        if access.is_open() { "everyone" } else { "allow-list" }
    );
    Ok(())
}

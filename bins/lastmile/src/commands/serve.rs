//! Bot over a JSON-lines bridge

use super::load_service;
use lastmile_bot::{Dispatcher, JsonLinesInbound, JsonLinesOutbound};
use lastmile_core::config::Config;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

/// Serve until stdin closes.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let (service, summaries) = load_service(config)?;
    let metrics = Arc::clone(service.metrics());
    info!(
        technologies = summaries.len(),
        interactive = config.schema.session.interactive,
        "Serving on stdin/stdout"
    );

    let outbound = JsonLinesOutbound::new(tokio::io::stdout());
    let dispatcher = Dispatcher::from_config(config, service, Arc::new(outbound))?;
    let received = dispatcher
        .run(JsonLinesInbound::new(BufReader::new(tokio::io::stdin())))
        .await;

    info!(received, metrics = %metrics.export_json(), "Inbound closed, shutting down");
    Ok(())
}

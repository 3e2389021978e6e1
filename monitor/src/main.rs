use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use common::logger::init_logger;
use market::{SnapshotBuilder, yahoo::YahooClient};
use monitor::{
    alerts::AlertEvaluator, api, config::AppConfig, facade::QueryFacade, poller::Poller, store,
};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("spreadwatch", is_production);

    let cfg = AppConfig::from_env().context("invalid configuration")?;

    info!(
        instruments = cfg.market.instruments.len(),
        thresholds = cfg.market.thresholds.len(),
        spreads = cfg.market.spreads.len(),
        poll_every_ms = cfg.poll_interval.as_millis() as u64,
        history_capacity = cfg.history_capacity,
        "Starting spreadwatch..."
    );

    let source = YahooClient::new(cfg.quote_endpoint.clone(), cfg.fetch_timeout)
        .context("failed to build quote client")?;

    let builder = SnapshotBuilder::new(
        Arc::new(source),
        cfg.market.instruments.clone(),
        cfg.fetch_timeout,
    );
    let evaluator = AlertEvaluator::new(cfg.market.thresholds.clone(), cfg.market.spreads.clone());
    let (publisher, reader) = store::channel(cfg.history_capacity);

    let poller = Poller::new(builder, evaluator, publisher, cfg.poll_interval).spawn();

    let app = api::router(QueryFacade::new(reader));
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    info!(addr = %cfg.bind_addr, "query api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.shutdown().await?;
    info!("spreadwatch stopped");

    Ok(())
}

//! # Dataspace Exchange Runtime
//!
//! Entry point: configure, wire, self-check, then wait for shutdown.

use anyhow::{Context, Result};
use tracing::info;

use exchange_runtime::container::ExchangeConfig;
use exchange_runtime::telemetry::init_logging;
use exchange_runtime::ExchangeRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExchangeConfig::from_env();

    init_logging(&config.telemetry).context("Failed to initialize logging")?;

    config.validate().context("Invalid configuration")?;

    info!("===========================================");
    info!("  Dataspace Exchange Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!("Connector: {}", config.connector.connector_id);
    info!("Rejection policy: {:?}", config.exchange.rejection_policy);

    let runtime = ExchangeRuntime::new(config).context("Failed to build runtime")?;

    let report = runtime
        .self_check()
        .await
        .context("Startup self-check failed")?;
    info!(
        protocols = ?runtime.requests().supported_protocols(),
        directory_entries = report.directory_entries,
        "Connector ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, stopping");
    Ok(())
}

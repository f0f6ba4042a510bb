//! # Data Node
//!
//! Entry point: telemetry, configuration, runtime, then wait for SIGINT or
//! SIGTERM and shut down gracefully.

use anyhow::{Context, Result};
use dn_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("received ctrl-c");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("failed to initialize telemetry")?;

    let config = NodeConfig::from_env().context("failed to load configuration")?;
    info!(?config, "configuration loaded");

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("node is running, send SIGINT or SIGTERM to stop");
    shutdown_signal().await?;

    runtime.shutdown().await
}

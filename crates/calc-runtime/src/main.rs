//! # Calc Runtime
//!
//! Runs the HTTP gateway and the compute worker in one process, joined by an
//! in-memory bus.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs + metrics)
//! 2. Load configuration (file, then environment)
//! 3. Start the worker and the response listener
//! 4. Bind and serve HTTP
//! 5. Wait for Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use calc_runtime::{load_config, CalcRuntime};
use calc_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    let _telemetry = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = load_config().context("Failed to load configuration")?;

    let mut runtime = CalcRuntime::new(config).context("Invalid runtime configuration")?;
    runtime.start()?;

    let listener = runtime.bind().await?;
    info!(addr = %runtime.config().gateway.http_addr(), "Listening for HTTP requests");
    runtime.spawn_http(listener);

    info!("Calculator is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;

    Ok(())
}

//! # Calc Telemetry
//!
//! Logging and metrics shared by every crate in the workspace.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, either as
//!   human-readable lines or as JSON for log shippers.
//! - **Metrics**: a Prometheus registry exposed by the gateway on `/metrics`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use calc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CALC_SERVICE_NAME` | `calc-bridge` | Service name attached to startup logs |
//! | `CALC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CALC_JSON_LOGS` | `false` (true in containers) | JSON log output |
//! | `CALC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, BUS_MESSAGES_PUBLISHED,
    GATEWAY_PENDING_REQUESTS, GATEWAY_REQUESTS, GATEWAY_REQUEST_DURATION, GATEWAY_STALE_RESPONSES,
    WORKER_COMPUTATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Handle returned once telemetry is installed.
#[derive(Debug)]
pub struct TelemetryGuard {
    pub service_name: String,
}

/// Install the log subscriber and register all metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(config)?;
    register_metrics()?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        log_level = %config.log_level,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

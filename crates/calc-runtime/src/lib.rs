//! # Calc Runtime
//!
//! Wires the gateway and the compute worker onto one in-memory bus and runs
//! them in a single process. The `calc-runtime` binary is a thin shell
//! around [`CalcRuntime`].
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Create the bus and the gateway (pending table + bridge)
//! 3. Subscribe the worker and the response listener, before any request
//!    can be published, so nothing is lost to a late subscription
//! 4. Spawn both consumers under a shared shutdown signal
//! 5. Bind and serve HTTP
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown (HTTP stops accepting, consumers stop)
//! 2. Close the bus
//! 3. Wait for spawned tasks, bounded by a grace period

pub mod config;

pub use config::{load_config, load_config_with, ConfigError, RuntimeConfig};

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use calc_01_compute_worker::{CalcError, CalculatorService, ComputeWorker};
use calc_02_gateway::{
    CalcGatewayService, CorrelationBridge, GatewayError, PendingRequestStore,
};
use shared_bus::{ChannelFilter, InMemoryEventBus};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long `shutdown` waits for spawned tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("worker error: {0}")]
    Worker(#[from] CalcError),

    #[error("runtime already started")]
    AlreadyStarted,
}

/// Gateway, worker and bus in one process.
pub struct CalcRuntime {
    config: RuntimeConfig,
    bus: Arc<InMemoryEventBus>,
    gateway: Arc<CalcGatewayService>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
    started: bool,
}

impl CalcRuntime {
    /// Create a runtime. Nothing runs until [`CalcRuntime::start`].
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let gateway = Arc::new(CalcGatewayService::new(config.gateway.clone(), bus.clone())?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            bus,
            gateway,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
            started: false,
        })
    }

    /// Start the worker and the response listener.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }

        info!("===========================================");
        info!("  Calc Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let calculator = Arc::new(CalculatorService::from_config(
            &self.config.worker.arithmetic,
        )?);
        let worker = ComputeWorker::new(calculator, self.bus.clone(), &self.config.worker);
        let listener = self.gateway.response_listener();

        // Subscribe both before either task runs.
        let requests = self
            .bus
            .subscribe(ChannelFilter::channel(
                self.config.worker.request_channel.clone(),
            ))
            .into_stream();
        let responses = self
            .bus
            .subscribe(ChannelFilter::channel(
                self.config.gateway.channels.response.clone(),
            ))
            .into_stream();

        let worker_shutdown = self.shutdown_rx.clone();
        self.tasks.push(tokio::spawn(async move {
            tokio::select! {
                _ = worker.run(requests) => {}
                _ = stopped(worker_shutdown) => {
                    info!("[ComputeWorker] Shutdown signal received");
                }
            }
        }));

        let listener_shutdown = self.shutdown_rx.clone();
        self.tasks.push(tokio::spawn(async move {
            tokio::select! {
                _ = listener.run(responses) => {}
                _ = stopped(listener_shutdown) => {
                    info!("[ResponseListener] Shutdown signal received");
                }
            }
        }));

        self.started = true;
        info!(
            request_channel = %self.config.worker.request_channel,
            response_channel = %self.config.gateway.channels.response,
            timeout_ms = self.config.gateway.request_timeout.as_millis(),
            "Worker and response listener started"
        );
        Ok(())
    }

    /// Bind the configured HTTP address.
    pub async fn bind(&self) -> Result<TcpListener, RuntimeError> {
        Ok(self.gateway.bind().await?)
    }

    /// Serve HTTP on `listener` until shutdown.
    pub fn spawn_http(&mut self, listener: TcpListener) {
        let gateway = Arc::clone(&self.gateway);
        let signal = stopped(self.shutdown_rx.clone());

        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = gateway.serve(listener, signal).await {
                error!(error = %e, "HTTP server failed");
            }
        }));
    }

    /// Stop everything and wait (bounded) for tasks to finish.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        self.bus.close();

        let tasks = std::mem::take(&mut self.tasks);
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, futures::future::join_all(tasks)).await;
        if drained.is_err() {
            warn!(grace_ms = SHUTDOWN_GRACE.as_millis(), "Tasks still running after grace period");
        }

        let abandoned = self.pending().pending_count();
        if abandoned > 0 {
            warn!(pending = abandoned, "Shutting down with calls still pending");
        }
        info!("Shutdown complete");
    }

    /// Synchronous entry point into the bus.
    pub fn bridge(&self) -> Arc<CorrelationBridge> {
        self.gateway.bridge()
    }

    pub fn pending(&self) -> Arc<PendingRequestStore> {
        self.gateway.pending()
    }

    /// HTTP router, for serving elsewhere or for tests.
    pub fn router(&self) -> Router {
        self.gateway.router()
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

/// Resolves once the shutdown flag is raised or its sender is gone.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let config = RuntimeConfig {
            bus_capacity: 0,
            ..RuntimeConfig::default()
        };

        assert!(matches!(
            CalcRuntime::new(config),
            Err(RuntimeError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut runtime = CalcRuntime::new(RuntimeConfig::default()).unwrap();

        runtime.start().unwrap();
        assert!(matches!(runtime.start(), Err(RuntimeError::AlreadyStarted)));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_subscribes_both_consumers() {
        let mut runtime = CalcRuntime::new(RuntimeConfig::default()).unwrap();

        runtime.start().unwrap();

        let bus = runtime.bus();
        assert_eq!(bus.subscriptions_for(&ChannelFilter::channel("calc-requests")), 1);
        assert_eq!(bus.subscriptions_for(&ChannelFilter::channel("calc-responses")), 1);
        runtime.shutdown().await;
    }
}

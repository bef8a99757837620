//! Gateway service - router assembly and HTTP server lifecycle.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::pending::PendingRequestStore;
use crate::ipc::handler::{CorrelationBridge, ResponseListener};
use crate::middleware::TracingLayer;
use crate::rest::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use shared_bus::EventPublisher;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<CorrelationBridge>,
}

/// Gateway service
pub struct CalcGatewayService {
    config: GatewayConfig,
    bridge: Arc<CorrelationBridge>,
}

impl CalcGatewayService {
    /// Create a new gateway publishing through `publisher`.
    pub fn new(
        config: GatewayConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let pending_store = Arc::new(PendingRequestStore::new());
        let bridge = Arc::new(CorrelationBridge::new(pending_store, publisher, &config));

        Ok(Self { config, bridge })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn bridge(&self) -> Arc<CorrelationBridge> {
        Arc::clone(&self.bridge)
    }

    pub fn pending(&self) -> Arc<PendingRequestStore> {
        Arc::clone(self.bridge.pending())
    }

    /// Listener feeding this gateway's pending table.
    pub fn response_listener(&self) -> ResponseListener {
        ResponseListener::new(self.pending())
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let state = AppState {
            bridge: self.bridge(),
        };

        Router::new()
            .route("/calculate", post(handlers::calculate))
            .route("/health", get(handlers::health))
            .route("/pending", get(handlers::pending_stats))
            .route("/metrics", get(handlers::metrics))
            .layer(RequestBodyLimitLayer::new(self.config.http.max_body_bytes))
            .layer(CorsLayer::permissive())
            .layer(TracingLayer::new())
            .with_state(state)
    }

    /// Bind the configured HTTP address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        TcpListener::bind(self.config.http_addr())
            .await
            .map_err(GatewayError::Bind)
    }

    /// Serve HTTP on `listener` until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?addr, "Starting HTTP server");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GatewayError::Server)?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::ConfigError;
    use shared_bus::InMemoryEventBus;

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GatewayConfig::default();
        config.channels.response = config.channels.request.clone();

        let result = CalcGatewayService::new(config, Arc::new(InMemoryEventBus::new()));

        assert!(matches!(
            result,
            Err(GatewayError::Config(ConfigError::InvalidChannel(_)))
        ));
    }

    #[test]
    fn test_listener_shares_pending_table() {
        let service =
            CalcGatewayService::new(GatewayConfig::default(), Arc::new(InMemoryEventBus::new()))
                .unwrap();
        let (id, _rx) = service.pending().register("sum");

        let listener = service.response_listener();
        let delivered = listener.handle_response(shared_types::ComputationResponse::success(
            id,
            shared_types::BigDecimal::from(1),
        ));

        assert!(delivered);
        assert_eq!(service.bridge().pending().pending_count(), 0);
    }
}

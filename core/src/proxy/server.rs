//! Gateway Server - Axum HTTP server

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::proxy::gateway::dispatch;
use crate::proxy::relay::SseRelay;
use crate::proxy::upstream::AzureClient;
use crate::proxy::RouteTable;

/// Application state shared across requests. Everything in it is read-only.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub client: Arc<AzureClient>,
    pub relay: SseRelay,
    pub max_body_size: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = AzureClient::new(
            config.backend_base_url(),
            config.azure.api_version.clone(),
            config.azure.request_timeout,
        )?;

        Ok(Self {
            routes: Arc::new(config.route_table()),
            client: Arc::new(client),
            relay: SseRelay::new(
                Duration::from_millis(config.streaming.pacing_ms),
                config.streaming.channel_capacity,
            ),
            max_body_size: config.server.max_body_size,
        })
    }
}

/// Build the gateway router. Every path goes through `dispatch`, which
/// handles its own 404s.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gateway server instance
pub struct GatewayServer {
    host: String,
    port: u16,
    state: AppState,
}

impl GatewayServer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            host: config.server.host.clone(),
            port: config.server.port,
            state: AppState::from_config(config)?,
        })
    }

    /// Run the gateway (blocking until shutdown)
    pub async fn run(self) -> anyhow::Result<()> {
        let app = build_router(self.state);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Gateway listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

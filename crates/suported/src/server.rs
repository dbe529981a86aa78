//! HTTP server for suported

use crate::routes;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use suporte_common::config::SuporteConfig;
use suporte_common::ServiceDesk;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub desk: ServiceDesk,
    /// Bearer key the voice assistant must present
    pub assistant_key: Option<String>,
}

impl AppState {
    pub fn new(desk: ServiceDesk, assistant_key: Option<String>) -> Self {
        Self {
            desk,
            assistant_key,
        }
    }

    pub fn from_config(config: &SuporteConfig) -> Result<Self> {
        let desk = ServiceDesk::from_config(config)?;
        Ok(Self::new(desk, config.assistant.api_key.clone()))
    }
}

/// Build the router with every route and the standard layers
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let state = Arc::new(state);

    Router::new()
        .merge(routes::ticket_routes())
        .merge(routes::assistant_routes())
        .merge(routes::knowbase_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(config: &SuporteConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    if state.assistant_key.is_none() {
        info!("  No assistant key configured, webhook disabled");
    }
    let app = router(state, config.server.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("  Listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

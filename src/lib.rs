pub mod config;
pub mod error;
pub mod gate;
pub mod i18n;
pub mod pages;
pub mod state;
pub mod upload;

use crate::config::{EdgeConfig, LogFormat, LoggingConfig};
use crate::error::{EdgeError, Result};
use crate::gate::gate_middleware;
use crate::pages::page_handler;
use crate::state::AppState;
use crate::upload::upload_handler;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_LOG_FILTER: &str = "studio_edge=debug,tower_http=debug";

/// Build the router: API routes, page fallback, and the auth gate in
/// front of all of them
pub fn build_app(state: AppState) -> Router {
    let gate = state.gate.clone();

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/assets/upload", post(upload_handler))
        .fallback(page_handler)
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, gate_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Initialize the edge server and serve until shutdown
pub async fn init_edge(config: EdgeConfig) -> Result<()> {
    // Validate configuration
    config.validate()?;

    info!("Starting studio edge");

    let state = AppState::from_config(&config)?;
    let app = build_app(state);

    // Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Edge ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| EdgeError::Internal(format!("Server error: {}", e)))?;

    info!("Edge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Initialize tracing/logging
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .filter
            .as_deref()
            .unwrap_or(DEFAULT_LOG_FILTER)
            .into()
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

mod core;
mod error_handler;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::{ApiConfig, AppState, HealthFuture, HealthProbe, ServiceHealth};
pub use crate::error_handler::{AppError, AppResult};

use crate::routes::{chat::chat_route::chat, health::health_route::health};

/// Builds the HTTP router over an already-initialized state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(state)
}

/// Loads configuration, builds provider clients and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let cfg = ApiConfig::from_env()?;
    let state = Arc::new(AppState::from_env(&cfg)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %cfg.address, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server simply keeps running.
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

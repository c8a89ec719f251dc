//! GET /health — provider and index probes.

use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use crate::core::app_state::AppState;

/// 200 when every probe is ok, 503 otherwise; the body always lists all probes.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Vec<HealthStatus>>) {
    let statuses = state.health.check_all().await;

    let failing: Vec<&str> = statuses
        .iter()
        .filter(|s| !s.ok)
        .map(|s| s.provider.as_str())
        .collect();

    if failing.is_empty() {
        (StatusCode::OK, Json(statuses))
    } else {
        warn!(?failing, "health check degraded");
        (StatusCode::SERVICE_UNAVAILABLE, Json(statuses))
    }
}

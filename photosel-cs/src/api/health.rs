//! Health check endpoint

use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub active_sessions: usize,
    pub last_error: Option<String>,
}

/// GET /health - Service health status
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds();
    let active_sessions = state
        .sessions
        .read()
        .await
        .values()
        .filter(|s| !s.is_terminal())
        .count();
    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "photosel-cs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        active_sessions,
        last_error,
    })
}

use axum::{extract::State, http::header, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use reelbot_core::{PoolStatus, SanitizedConfig};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub bot_initialized: bool,
    /// Absent when the pool was never started.
    pub pool: Option<PoolStatus>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pool = state.pool_status();
    let ready = state.bot_initialized() && pool.as_ref().is_some_and(|p| p.accepting);

    Json(HealthResponse {
        status: if ready { "ok" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        bot_initialized: state.bot_initialized(),
        pool,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

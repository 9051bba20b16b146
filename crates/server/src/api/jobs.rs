use axum::{extract::State, http::StatusCode, Json};
use reelbot_core::pool::ActiveJob;
use serde::Serialize;
use std::sync::Arc;

use super::process::ErrorResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<ActiveJob>,
    pub total: usize,
}

/// GET /api/v1/jobs - accepted jobs that have not finished yet.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JobListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let pool = state.pool().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Worker pool not initialized".to_string(),
            }),
        )
    })?;

    let jobs = pool.active_jobs();
    Ok(Json(JobListResponse {
        total: jobs.len(),
        jobs,
    }))
}

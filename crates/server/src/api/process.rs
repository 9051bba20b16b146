//! Process endpoint: validate a URL and hand a job to the worker pool.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use reelbot_core::job::{validate_source_url, InvalidUrl};
use reelbot_core::{Job, JobId, JobOrigin, RejectReason, SubmitOutcome};

use crate::metrics::PROCESS_REJECTIONS;
use crate::state::AppState;

/// Message returned with every accepted job.
pub const ACCEPTED_MESSAGE: &str = "Processing started asynchronously";

/// Query string for `GET /process`.
#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    pub url: Option<String>,
}

/// JSON body for `POST /process`.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub message: String,
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Why a process request produced no job.
#[derive(Debug)]
pub enum ProcessError {
    InvalidUrl(InvalidUrl),
    InvalidRequest(String),
    PoolUnavailable,
    Rejected(RejectReason),
}

impl ProcessError {
    fn reason(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidRequest(_) => "invalid_request",
            Self::PoolUnavailable => "pool_unavailable",
            Self::Rejected(reason) => reason.as_str(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PoolUnavailable | Self::Rejected(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        PROCESS_REJECTIONS.with_label_values(&[self.reason()]).inc();

        let error = match &self {
            Self::InvalidUrl(e) => format!("Invalid URL: {}", e),
            Self::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            Self::PoolUnavailable => "Worker pool not initialized".to_string(),
            Self::Rejected(reason) => capitalize(&reason.to_string()),
        };

        (self.status(), Json(ErrorResponse { error })).into_response()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// GET /process?url=...
pub async fn process_get(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProcessQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<ProcessResponse>), ProcessError> {
    let Query(query) = query.map_err(|e| ProcessError::InvalidRequest(e.body_text()))?;
    submit(&state, query.url.as_deref(), "GET")
}

/// POST /process with `{"url": "..."}`.
pub async fn process_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcessResponse>), ProcessError> {
    let Json(request) = payload.map_err(|e| ProcessError::InvalidRequest(e.body_text()))?;
    submit(&state, request.url.as_deref(), "POST")
}

fn submit(
    state: &AppState,
    url: Option<&str>,
    method: &str,
) -> Result<(StatusCode, Json<ProcessResponse>), ProcessError> {
    let url = validate_source_url(url.unwrap_or_default()).map_err(ProcessError::InvalidUrl)?;
    let pool = state.pool().ok_or(ProcessError::PoolUnavailable)?;

    let job = Job::new(
        url.clone(),
        JobOrigin::Api {
            method: method.to_string(),
        },
    );

    match pool.submit(job) {
        SubmitOutcome::Accepted(job_id) => {
            info!(job_id = %job_id, method, url = %url, "Accepted API job");
            Ok((
                StatusCode::ACCEPTED,
                Json(ProcessResponse {
                    message: ACCEPTED_MESSAGE.to_string(),
                    job_id,
                }),
            ))
        }
        SubmitOutcome::Rejected(reason) => {
            warn!(method, url = %url, reason = reason.as_str(), "Rejected API job");
            Err(ProcessError::Rejected(reason))
        }
    }
}

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware, process};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Jobs
        .route(
            "/process",
            get(process::process_get).post(process::process_post),
        )
        .route("/jobs", get(jobs::list_jobs));

    Router::new()
        .nest("/api/v1", api_routes)
        // Unversioned aliases
        .route("/health", get(handlers::health))
        .route(
            "/process",
            get(process::process_get).post(process::process_post),
        )
        // Legacy path kept for existing callers
        .route(
            "/process_instagram",
            get(process::process_get).post(process::process_post),
        )
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

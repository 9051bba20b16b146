//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ReelBot server:
//! - HTTP request metrics (latency, counts)
//! - Ingress admission decisions
//! - Job pipeline metrics from `reelbot_core::metrics` (registered here)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::state::AppState;

/// Label used for requests that did not match any route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelbot_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelbot_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelbot_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Process requests refused before a job was created.
pub static PROCESS_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelbot_process_rejections_total",
            "HTTP process requests rejected at ingress",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Service state (collected dynamically)
// =============================================================================

/// Whether the pool accepts new jobs (1) or not (0).
pub static POOL_ACCEPTING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelbot_pool_accepting",
        "Whether the worker pool accepts new jobs (1) or not (0)",
    )
    .unwrap()
});

/// Whether the delivery bot was initialized at startup.
pub static BOT_INITIALIZED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelbot_bot_initialized",
        "Whether the Telegram bot answered at startup (1) or not (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(PROCESS_REJECTIONS.clone()))
        .unwrap();

    // Service state
    registry.register(Box::new(POOL_ACCEPTING.clone())).unwrap();
    registry.register(Box::new(BOT_INITIALIZED.clone())).unwrap();

    // Jobs
    for collector in reelbot_core::metrics::all_metrics() {
        registry.register(collector).unwrap();
    }
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Job gauges are maintained by the pool itself; only values that live in
/// [`AppState`] are refreshed here.
pub fn collect_dynamic_metrics(state: &AppState) {
    let accepting = state.pool().is_some_and(|pool| pool.is_accepting());
    POOL_ACCEPTING.set(i64::from(accepting));
    BOT_INITIALIZED.set(i64::from(state.bot_initialized()));
}

//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a real worker pool whose collaborators are mocks, so requests
//! run the whole pipeline without yt-dlp, ffmpeg or Telegram.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reelbot_core::{
    load_config_from_str,
    testing::{MockFetcher, MockSink, MockTransformer},
    Config, PoolConfig, WorkerPool,
};
use reelbot_server::state::AppState;

/// Re-export fixtures for test convenience
pub use reelbot_core::testing::fixtures;

/// Bot token used by every fixture; must never appear in responses.
pub const TEST_TOKEN: &str = "123:fixture-secret";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_process() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/process", json!({ "url": "https://example.com/v" })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Worker pool behind the router, if one was started
    pub pool: Option<Arc<WorkerPool>>,
    /// Mock fetcher - control downloads
    pub fetcher: Arc<MockFetcher>,
    /// Mock transformer - control processing
    pub transformer: Arc<MockTransformer>,
    /// Mock sink - inspect deliveries
    pub sink: Arc<MockSink>,
    /// Temporary directory for job artifacts
    pub temp_dir: TempDir,
}

/// Response from test server.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with a running pool of two workers and a queue of four.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = test_app_config();

        let fetcher = Arc::new(MockFetcher::new());
        let transformer = Arc::new(MockTransformer::new());
        let sink = Arc::new(MockSink::new());

        let pool = test_config.pool_limits.map(|(max_workers, queue_depth)| {
            let runner = fixtures::runner(
                temp_dir.path(),
                Arc::clone(&fetcher),
                Arc::clone(&transformer),
                Arc::clone(&sink),
            );
            let pool_config = PoolConfig::default()
                .with_limits(max_workers, queue_depth)
                .with_temp_dir(temp_dir.path());
            Arc::new(WorkerPool::start(pool_config, runner))
        });

        let state = Arc::new(AppState::new(
            config,
            pool.clone(),
            test_config.bot_initialized,
        ));

        let router = reelbot_server::api::create_router(state);

        Self {
            router,
            pool,
            fetcher,
            transformer,
            sink,
            temp_dir,
        }
    }

    /// Pool behind the router. Panics for pool-less fixtures.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        self.pool.as_ref().expect("fixture has no pool")
    }

    /// Wait until the pool has finished `count` jobs.
    pub async fn wait_for_finished(&self, count: u64) {
        let pool = self.pool();
        for _ in 0..500 {
            let status = pool.status();
            if status.total_completed + status.total_failed >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("pool did not finish {} job(s) in time", count);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    /// Send a POST request with custom content type (for testing wrong content types).
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        self.request_raw("POST", path, body, content_type).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a request with raw string body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// `(max_workers, queue_depth)`, or `None` to run without a pool
    pub pool_limits: Option<(usize, usize)>,
    /// Reported by the health endpoint
    pub bot_initialized: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            pool_limits: Some((2, 4)),
            bot_initialized: true,
        }
    }
}

impl TestConfig {
    pub fn with_limits(max_workers: usize, queue_depth: usize) -> Self {
        Self {
            pool_limits: Some((max_workers, queue_depth)),
            ..Default::default()
        }
    }

    pub fn without_pool() -> Self {
        Self {
            pool_limits: None,
            bot_initialized: false,
        }
    }
}

fn test_app_config() -> Config {
    load_config_from_str(&format!(
        r#"
[telegram]
bot_token = "{}"
chat_id = "{}"
"#,
        TEST_TOKEN,
        fixtures::RECIPIENT
    ))
    .expect("Failed to parse test config")
}

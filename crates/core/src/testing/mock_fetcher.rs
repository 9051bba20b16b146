//! Mock fetcher for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchReport, Fetcher};

use super::gauge::{ConcurrencyGauge, Gate};

/// What the mock does when asked to fetch.
#[derive(Debug, Clone)]
pub enum FetchBehavior {
    /// Write these bytes to the destination.
    Write(Vec<u8>),
    /// Create an empty destination file and report success.
    WriteEmpty,
    /// Report success without creating anything.
    WriteNothing,
    /// Fail with the given stderr.
    Fail { stderr: String },
    /// Panic inside the stage.
    Panic,
}

impl Default for FetchBehavior {
    fn default() -> Self {
        Self::Write(b"fake mp4 payload, ten seconds".to_vec())
    }
}

/// Mock implementation of the Fetcher trait.
///
/// Records requested URLs, can be held at a [`Gate`] and reports how many
/// fetches ran at once through a [`ConcurrencyGauge`].
///
/// # Example
///
/// ```rust,ignore
/// use reelbot_core::testing::{FetchBehavior, MockFetcher};
///
/// let fetcher = MockFetcher::new();
/// fetcher.set_behavior(FetchBehavior::Fail { stderr: "ERROR: 404".into() }).await;
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    behavior: Arc<RwLock<FetchBehavior>>,
    urls: Arc<RwLock<Vec<String>>>,
    delay: Arc<RwLock<Duration>>,
    gate: Gate,
    gauge: Arc<ConcurrencyGauge>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher that succeeds.
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(RwLock::new(FetchBehavior::default())),
            urls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            gate: Gate::opened(),
            gauge: ConcurrencyGauge::new(),
        }
    }

    /// Share a gauge with other collaborators.
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = gauge;
        self
    }

    /// Configure what the next fetches do.
    pub async fn set_behavior(&self, behavior: FetchBehavior) {
        *self.behavior.write().await = behavior;
    }

    /// Set the simulated fetch duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Hold new fetches until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.close();
    }

    pub fn release(&self) {
        self.gate.open();
    }

    pub fn gauge(&self) -> &Arc<ConcurrencyGauge> {
        &self.gauge
    }

    /// URLs requested so far.
    pub async fn recorded_urls(&self) -> Vec<String> {
        self.urls.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchReport, FetchError> {
        let _guard = self.gauge.enter();
        self.urls.write().await.push(url.to_string());

        self.gate.pass().await;
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let behavior = self.behavior.read().await.clone();
        match behavior {
            FetchBehavior::Write(bytes) => tokio::fs::write(dest, bytes).await?,
            FetchBehavior::WriteEmpty => tokio::fs::write(dest, b"").await?,
            FetchBehavior::WriteNothing => {}
            FetchBehavior::Fail { stderr } => {
                return Err(FetchError::process_failed(
                    "yt-dlp exited with code 1",
                    Some(stderr),
                ));
            }
            FetchBehavior::Panic => panic!("mock fetcher panic"),
        }

        Ok(FetchReport {
            path: dest.to_path_buf(),
            duration_ms: delay.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

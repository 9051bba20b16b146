//! Testing utilities and mock implementations of the collaborator traits.
//!
//! The mocks let the pipeline and pool be exercised end to end without
//! `yt-dlp`, `ffmpeg` or a Telegram bot.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelbot_core::testing::{fixtures, MockFetcher, MockSink, MockTransformer};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! let transformer = Arc::new(MockTransformer::new());
//! let sink = Arc::new(MockSink::new());
//! let runner = fixtures::runner(temp.path(), fetcher.clone(), transformer.clone(), sink.clone());
//! ```

mod gauge;
mod mock_fetcher;
mod mock_sink;
mod mock_transformer;

pub use gauge::{ConcurrencyGauge, Gate, GaugeGuard};
pub use mock_fetcher::{FetchBehavior, MockFetcher};
pub use mock_sink::{MockSink, SentMessage};
pub use mock_transformer::{MockTransformer, RecordedTransform, TransformBehavior};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;

    use crate::job::{Job, JobOrigin};
    use crate::notifier::Recipient;
    use crate::pipeline::{PipelineConfig, PipelineRunner};

    use super::{MockFetcher, MockSink, MockTransformer};

    /// Recipient used by [`runner`].
    pub const RECIPIENT: &str = "4242";

    /// A job submitted over the API.
    pub fn api_job(url: &str) -> Job {
        Job::new(
            url,
            JobOrigin::Api {
                method: "POST".to_string(),
            },
        )
    }

    /// A job submitted by a bot user.
    pub fn bot_job(url: &str, user_id: i64) -> Job {
        Job::new(url, JobOrigin::Bot { user_id })
    }

    /// A runner over the given mocks writing artifacts to `temp_dir`.
    pub fn runner(
        temp_dir: &Path,
        fetcher: Arc<MockFetcher>,
        transformer: Arc<MockTransformer>,
        sink: Arc<MockSink>,
    ) -> PipelineRunner {
        PipelineRunner::new(
            PipelineConfig::new(temp_dir),
            fetcher,
            transformer,
            sink,
            Recipient::from(RECIPIENT),
        )
    }

    /// Files left in `dir`.
    pub fn leftover_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::FetchError;

/// What a successful fetch produced.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    /// Where the artifact was written.
    pub path: PathBuf,
    /// Wall-clock time spent fetching.
    pub duration_ms: u64,
}

/// Retrieves the media behind a URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Downloads `url` into `dest`.
    ///
    /// A successful return does not promise a non-empty file; the caller
    /// verifies the artifact.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchReport, FetchError>;

    /// Checks that the fetcher is usable.
    async fn validate(&self) -> Result<(), FetchError>;
}

//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    /// Format selector passed to `-f`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Container used when video and audio are merged.
    #[serde(default = "default_merge_format")]
    pub merge_output_format: String,

    /// Browser to borrow cookies from, if any.
    #[serde(default)]
    pub cookies_from_browser: Option<String>,

    /// Timeout for a single fetch in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_format() -> String {
    "bestvideo+bestaudio/best".to_string()
}

fn default_merge_format() -> String {
    "mp4".to_string()
}

fn default_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            format: default_format(),
            merge_output_format: default_merge_format(),
            cookies_from_browser: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl FetcherConfig {
    /// Sets the yt-dlp binary path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.yt_dlp_path = path;
        self
    }

    /// Sets the browser to read cookies from.
    pub fn with_cookies_from_browser(mut self, browser: impl Into<String>) -> Self {
        self.cookies_from_browser = Some(browser.into());
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

//! Fetcher module for retrieving remote media.
//!
//! The [`Fetcher`] trait is the seam between the pipeline and whatever tool
//! knows how to pull a media item from a page URL. [`YtDlpFetcher`] drives
//! the `yt-dlp` binary as a child process.

mod config;
mod error;
mod traits;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::{FetchReport, Fetcher};
pub use ytdlp::YtDlpFetcher;

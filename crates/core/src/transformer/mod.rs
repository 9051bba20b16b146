//! Transformer module for the filter/encode step.
//!
//! This module provides the `Transformer` trait and an FFmpeg implementation
//! that turns a fetched clip into a vertical 1080x1920 video:
//!
//! - blurred, cropped copy of the source fills the background
//! - the source, scaled to fit, sits centered on top
//! - playback is slightly sped up and pitch-shifted
//! - a short tail is trimmed off
//!
//! # Example
//!
//! ```ignore
//! use reelbot_core::transformer::{FfmpegTransformer, Transformer, TransformerConfig};
//!
//! let transformer = FfmpegTransformer::new(TransformerConfig::default());
//! transformer.validate().await?;
//!
//! let report = transformer
//!     .transform(Path::new("/tmp/in.mp4"), Path::new("/tmp/out.mp4"))
//!     .await?;
//! println!("Encoded {:.1}s of video", report.output_duration_secs);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::{TransformProfile, TransformerConfig};
pub use error::TransformError;
pub use ffmpeg::{trim_target, FfmpegTransformer};
pub use traits::{TransformReport, Transformer};

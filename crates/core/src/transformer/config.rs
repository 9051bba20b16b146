//! Configuration for the transformer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based transformer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Timeout for a single transform in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for the ffprobe duration probe in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Composition and encoding parameters.
    #[serde(default)]
    pub profile: TransformProfile,
}

/// Fixed composition applied to every clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformProfile {
    /// Seconds cut from the end of the clip.
    pub trim_secs: f64,
    /// Pixels cropped from the source height (half top, half bottom).
    pub crop_offset: u32,
    /// Playback speed factor.
    pub speed: f64,
    /// Pitch factor applied on top of the speed change.
    pub pitch_factor: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Foreground size relative to the fitted size.
    pub foreground_scale: f64,
    pub blur_radius: u32,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub frame_rate: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub audio_sample_rate: u32,
}

impl Default for TransformProfile {
    fn default() -> Self {
        Self {
            trim_secs: 0.1,
            crop_offset: 300,
            speed: 1.05,
            pitch_factor: 1.03,
            canvas_width: 1080,
            canvas_height: 1920,
            foreground_scale: 0.90,
            blur_radius: 10,
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            frame_rate: "29.97".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            audio_sample_rate: 44100,
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_probe_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            log_level: default_log_level(),
            profile: TransformProfile::default(),
        }
    }
}

impl TransformerConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the ffprobe timeout in seconds.
    pub fn with_probe_timeout(mut self, timeout_secs: u64) -> Self {
        self.probe_timeout_secs = timeout_secs;
        self
    }

    /// Replaces the composition profile.
    pub fn with_profile(mut self, profile: TransformProfile) -> Self {
        self.profile = profile;
        self
    }
}

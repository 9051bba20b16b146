//! FFmpeg-based transformer implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::{TransformProfile, TransformerConfig};
use super::error::TransformError;
use super::traits::{TransformReport, Transformer};

/// Stderr lines kept from a failing ffmpeg run.
const STDERR_TAIL_LINES: usize = 64;

/// Duration the encoder should produce for a clip of `duration_secs`.
///
/// Removes `trim_secs` from the end. A clip that is not longer than the trim
/// amount keeps its full duration instead of collapsing to nothing.
pub fn trim_target(duration_secs: f64, trim_secs: f64) -> f64 {
    let duration = duration_secs.max(0.0);
    if duration <= trim_secs {
        duration
    } else {
        duration - trim_secs
    }
}

/// FFmpeg-based transformer implementation.
pub struct FfmpegTransformer {
    config: TransformerConfig,
}

impl FfmpegTransformer {
    /// Creates a new FFmpeg transformer with the given configuration.
    pub fn new(config: TransformerConfig) -> Self {
        Self { config }
    }

    /// Creates a transformer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TransformerConfig::default())
    }

    /// Crop that removes `crop_offset` rows split evenly between top and
    /// bottom, skipped for sources shorter than the offset.
    fn crop_expr(offset: u32) -> String {
        format!(
            "crop=in_w:if(gte(in_h\\,{o})\\,in_h-{o}\\,in_h):0:if(gte(in_h\\,{o})\\,{o}/2\\,0)",
            o = offset
        )
    }

    /// Builds the `-filter_complex` graph for a profile.
    fn build_filter_graph(profile: &TransformProfile) -> String {
        let crop = Self::crop_expr(profile.crop_offset);
        let (w, h) = (profile.canvas_width, profile.canvas_height);

        let background = format!(
            "[0:v]{crop},scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},\
             boxblur=luma_radius={r}:luma_power=1[bg]",
            r = profile.blur_radius
        );
        let foreground = format!(
            "[0:v]{crop},scale=w='if(gte(iw/ih,{w}/{h}),{w},-1)':h='if(gte(iw/ih,{w}/{h}),-1,{h})',\
             scale=iw*{s}:ih*{s}[main]",
            s = profile.foreground_scale
        );
        let overlay = "[bg][main]overlay=(main_w-overlay_w)/2:(main_h-overlay_h)/2[with_main]";
        let video = format!(
            "[with_main]setpts=PTS/{speed},format=yuv420p[v]",
            speed = profile.speed
        );
        let audio = format!(
            "[0:a]atempo={speed},asetrate={rate}*{pitch},aresample={rate}[a]",
            speed = profile.speed,
            rate = profile.audio_sample_rate,
            pitch = profile.pitch_factor
        );

        [background, foreground, overlay.to_string(), video, audio].join(";")
    }

    /// Builds ffmpeg arguments for one transform.
    fn build_args(&self, input: &Path, output: &Path, duration_secs: f64) -> Vec<String> {
        let profile = &self.config.profile;

        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-filter_complex".to_string(),
            Self::build_filter_graph(profile),
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            "[a]".to_string(),
            "-ss".to_string(),
            "0".to_string(),
            "-t".to_string(),
            format!("{:.3}", duration_secs),
            "-c:v".to_string(),
            profile.video_codec.clone(),
            "-preset".to_string(),
            profile.preset.clone(),
            "-crf".to_string(),
            profile.crf.to_string(),
            "-r".to_string(),
            profile.frame_rate.clone(),
            "-c:a".to_string(),
            profile.audio_codec.clone(),
            "-b:a".to_string(),
            profile.audio_bitrate.clone(),
            "-map_metadata".to_string(),
            "-1".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Parses `ffprobe -of csv=p=0` duration output.
    fn parse_duration(output: &str) -> Result<f64, TransformError> {
        let raw = output.trim();
        raw.parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| {
                TransformError::probe_failed(format!("unexpected duration output: {:?}", raw))
            })
    }

    /// Reads the container duration of `path` in seconds.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64, TransformError> {
        if !path.exists() {
            return Err(TransformError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let probe = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let probe_timeout_secs = self.config.probe_timeout_secs;
        let output = timeout(Duration::from_secs(probe_timeout_secs), probe)
            .await
            .map_err(|_| TransformError::Timeout {
                timeout_secs: probe_timeout_secs,
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TransformError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TransformError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TransformError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Self::parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl Transformer for FfmpegTransformer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transform(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<TransformReport, TransformError> {
        let start = Instant::now();

        let source_duration = self.probe_duration(input).await?;
        let target = trim_target(source_duration, self.config.profile.trim_secs);
        if source_duration <= self.config.profile.trim_secs {
            warn!(
                input = %input.display(),
                duration_secs = source_duration,
                trim_secs = self.config.profile.trim_secs,
                "Clip too short to trim, using full duration"
            );
        }

        let args = self.build_args(input, output, target);
        debug!(input = %input.display(), output = %output.display(), "Spawning ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TransformError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TransformError::Io(e)
                }
            })?;

        let stderr = child.stderr.take();
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let tail = match stderr {
                Some(pipe) => read_tail(pipe, STDERR_TAIL_LINES).await?,
                None => VecDeque::new(),
            };

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    let stderr = tail.into_iter().collect::<Vec<_>>().join("\n");
                    return Err(TransformError::process_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        (!stderr.trim().is_empty()).then_some(stderr),
                    ));
                }
            }
            Ok(Err(e)) => return Err(TransformError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(TransformError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(output = %output.display(), duration_ms, "FFmpeg processing finished");

        Ok(TransformReport {
            output_path: output.to_path_buf(),
            source_duration_secs: source_duration,
            output_duration_secs: target,
            duration_ms,
        })
    }

    async fn validate(&self) -> Result<(), TransformError> {
        for (path, missing) in [
            (
                &self.config.ffmpeg_path,
                TransformError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                },
            ),
            (
                &self.config.ffprobe_path,
                TransformError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                },
            ),
        ] {
            if let Err(e) = Command::new(path).arg("-version").output().await {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(missing);
                }
                return Err(TransformError::Io(e));
            }
        }

        Ok(())
    }
}

/// Keeps the last `max_lines` lines of `pipe`, decoding each one lossily.
///
/// ffmpeg prints file names and stream tags as raw bytes.
async fn read_tail<R: AsyncRead + Unpin>(
    pipe: R,
    max_lines: usize,
) -> std::io::Result<VecDeque<String>> {
    let mut reader = BufReader::new(pipe);
    let mut tail = VecDeque::with_capacity(max_lines);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if tail.len() == max_lines {
            tail.pop_front();
        }
        let text = String::from_utf8_lossy(&line);
        tail.push_back(text.trim_end_matches(['\r', '\n']).to_string());
    }

    Ok(tail)
}

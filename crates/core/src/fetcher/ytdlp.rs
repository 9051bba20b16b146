//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::{FetchReport, Fetcher};

/// Fetcher that shells out to yt-dlp.
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    /// Builds yt-dlp arguments for a single-item download.
    fn build_args(&self, url: &str, dest: &Path) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            self.config.format.clone(),
            "--merge-output-format".to_string(),
            self.config.merge_output_format.clone(),
        ];

        if let Some(ref browser) = self.config.cookies_from_browser {
            args.extend(["--cookies-from-browser".to_string(), browser.clone()]);
        }

        args.extend([
            "-o".to_string(),
            dest.to_string_lossy().to_string(),
            // Stop option parsing so a URL can never be read as a flag.
            "--".to_string(),
            url.to_string(),
        ]);

        args
    }

    fn map_spawn_error(&self, e: std::io::Error) -> FetchError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FetchError::ToolNotFound {
                path: self.config.yt_dlp_path.clone(),
            }
        } else {
            FetchError::Io(e)
        }
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchReport, FetchError> {
        let start = Instant::now();

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(url, dest);
        debug!(url = %url, dest = %dest.display(), "Spawning yt-dlp");

        let mut child = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        let mut stderr = child.stderr.take();
        let result = timeout(Duration::from_secs(self.config.timeout_secs), async {
            // yt-dlp echoes titles and site messages verbatim; keep raw bytes.
            let mut raw = Vec::new();
            if let Some(ref mut pipe) = stderr {
                pipe.read_to_end(&mut raw).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, String::from_utf8_lossy(&raw).into_owned()))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(FetchError::process_failed(
                        format!("yt-dlp exited with code: {:?}", status.code()),
                        (!error_output.trim().is_empty()).then_some(error_output),
                    ));
                }
            }
            Ok(Err(e)) => return Err(FetchError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(FetchError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(url = %url, duration_ms, "yt-dlp download finished");

        Ok(FetchReport {
            path: dest.to_path_buf(),
            duration_ms,
        })
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.config.yt_dlp_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            return Err(FetchError::process_failed(
                "yt-dlp --version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "yt-dlp available"
        );
        Ok(())
    }
}

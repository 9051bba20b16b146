//! Configuration for the worker pool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Jobs executed concurrently.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Jobs allowed to wait for a worker before submissions are rejected.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// How long shutdown waits for queued and running jobs.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Directory for intermediate artifacts.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_max_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 2).min(4)
}

fn default_queue_depth() -> usize {
    32
}

fn default_shutdown_timeout() -> u64 {
    300
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("reelbot")
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            queue_depth: default_queue_depth(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl PoolConfig {
    /// Sets worker count and queue depth.
    pub fn with_limits(mut self, max_workers: usize, queue_depth: usize) -> Self {
        self.max_workers = max_workers;
        self.queue_depth = queue_depth;
        self
    }

    /// Sets the artifact directory.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Sets the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout_secs: u64) -> Self {
        self.shutdown_timeout_secs = timeout_secs;
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert!(config.max_workers >= 1 && config.max_workers <= 4);
        assert_eq!(config.queue_depth, 32);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(300));
        assert!(config.temp_dir.ends_with("reelbot"));
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::default()
            .with_limits(2, 1)
            .with_temp_dir("/tmp/x")
            .with_shutdown_timeout(5);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.queue_depth, 1);
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/x"));
        assert_eq!(config.shutdown_timeout_secs, 5);
    }
}

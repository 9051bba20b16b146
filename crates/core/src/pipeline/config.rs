//! Configuration for the pipeline runner.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::notifier::DeliveryTimeouts;

/// Settings the runner needs from the wider configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for intermediate artifacts.
    pub temp_dir: PathBuf,
    /// Budgets for the file upload.
    pub delivery_timeouts: DeliveryTimeouts,
}

impl PipelineConfig {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            delivery_timeouts: DeliveryTimeouts::default(),
        }
    }

    pub fn with_delivery_timeouts(mut self, timeouts: DeliveryTimeouts) -> Self {
        self.delivery_timeouts = timeouts;
        self
    }

    /// Derives the pipeline settings from the root configuration.
    pub fn from_config(config: &Config) -> Self {
        let telegram = &config.telegram;
        Self {
            temp_dir: config.pool.temp_dir.clone(),
            delivery_timeouts: DeliveryTimeouts {
                connect: Duration::from_secs(telegram.connect_timeout_secs),
                read: Duration::from_secs(telegram.read_timeout_secs),
                write: Duration::from_secs(telegram.write_timeout_secs),
            },
        }
    }
}

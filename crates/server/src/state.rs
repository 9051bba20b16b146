use reelbot_core::{Config, PoolStatus, SanitizedConfig, WorkerPool};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    pool: Option<Arc<WorkerPool>>,
    bot_initialized: bool,
}

impl AppState {
    pub fn new(config: Config, pool: Option<Arc<WorkerPool>>, bot_initialized: bool) -> Self {
        Self {
            config,
            pool,
            bot_initialized,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// The worker pool, if it has been started.
    pub fn pool(&self) -> Option<&Arc<WorkerPool>> {
        self.pool.as_ref()
    }

    pub fn pool_status(&self) -> Option<PoolStatus> {
        self.pool.as_ref().map(|pool| pool.status())
    }

    /// Whether the delivery bot answered `getMe` at startup.
    pub fn bot_initialized(&self) -> bool {
        self.bot_initialized
    }
}

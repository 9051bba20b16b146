pub mod bot;
pub mod config;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod pool;
pub mod testing;
pub mod transformer;

pub use bot::{BotIngress, BotPoller, BotTransport, IncomingMessage};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use fetcher::{FetchError, Fetcher, YtDlpFetcher};
pub use job::{ErrorKind, FailureReason, Job, JobId, JobOrigin, JobReport, JobState};
pub use notifier::{
    DeliveryTimeouts, NotificationSink, NotifyError, Recipient, TelegramClient, TelegramSink,
};
pub use pipeline::{PipelineConfig, PipelineRunner};
pub use pool::{PoolConfig, PoolError, PoolStatus, RejectReason, SubmitOutcome, WorkerPool};
pub use transformer::{FfmpegTransformer, TransformError, Transformer};

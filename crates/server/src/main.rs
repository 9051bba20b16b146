use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelbot_core::{
    load_config, validate_config, BotIngress, BotPoller, FfmpegTransformer, Fetcher,
    NotificationSink, PipelineConfig, PipelineRunner, Recipient, TelegramSink, Transformer,
    WorkerPool, YtDlpFetcher,
};
use reelbot_server::api::create_router;
use reelbot_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = VERSION, "Starting ReelBot");

    // Determine config path
    let config_path = std::env::var("REELBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        max_workers = config.pool.max_workers,
        queue_depth = config.pool.queue_depth,
        temp_dir = %config.pool.temp_dir.display(),
        "Configuration loaded successfully"
    );

    // External tools are only checked; a missing binary fails its jobs, not startup
    let fetcher = Arc::new(YtDlpFetcher::new(config.fetcher.clone()));
    if let Err(e) = fetcher.validate().await {
        warn!(fetcher = fetcher.name(), error = %e, "Fetcher is not available");
    }

    let transformer = Arc::new(FfmpegTransformer::new(config.transformer.clone()));
    if let Err(e) = transformer.validate().await {
        warn!(transformer = transformer.name(), error = %e, "Transformer is not available");
    }

    // Delivery must work before anything is accepted
    let sink = Arc::new(
        TelegramSink::from_config(&config.telegram).context("Failed to create Telegram client")?,
    );
    sink.validate()
        .await
        .context("Telegram bot validation failed")?;
    info!(sink = sink.name(), "Telegram bot initialized");

    let runner = PipelineRunner::new(
        PipelineConfig::from_config(&config),
        fetcher,
        transformer,
        sink.clone(),
        Recipient::new(config.telegram.chat_id.clone()),
    );

    let pool = Arc::new(WorkerPool::start(config.pool.clone(), runner));

    // Bot ingress
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let poller_handle = if config.telegram.enable_polling {
        let poller = BotPoller::new(
            Arc::new(sink.client().clone()),
            BotIngress::new(pool.clone()),
            config.telegram.poll_timeout_secs,
        );
        let shutdown_rx = shutdown_tx.subscribe();
        info!("Starting bot poller");
        Some(tokio::spawn(poller.run(shutdown_rx)))
    } else {
        info!("Bot polling disabled");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Some(pool.clone()), true));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop bot ingress before draining the pool
    if let Some(handle) = poller_handle {
        info!("Stopping bot poller...");
        let _ = shutdown_tx.send(());
        if let Err(e) = handle.await {
            warn!(error = %e, "Bot poller task ended abnormally");
        }
        info!("Bot poller stopped");
    }

    info!("Draining worker pool...");
    pool.shutdown().await.context("Worker pool shutdown failed")?;
    info!("Server shut down cleanly");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tuberecode_core::{
    create_authorizer, load_config, load_config_from_env, validate_config, Authorizer, Config,
    Encoder, FfmpegEncoder, Fetcher, LogFormat, MessageDispatcher, Pipeline, PipelineConfig,
    YtdlFetcher,
};

use tuberecode_bot::api::create_router;
use tuberecode_bot::poller::Poller;
use tuberecode_bot::state::AppState;
use tuberecode_bot::telegram::TelegramClient;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often shutdown checks whether running jobs have finished.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Loads the config file if present; otherwise configuration comes from the environment alone.
fn load(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        load_config_from_env().context("Failed to load config from environment")
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("TUBERECODE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Logging needs the configured format, so config loads first.
    let config = load(&config_path);
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or_default(),
    );
    let config = config?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("tuberecode v{} starting", VERSION);
    info!(
        users = config.access.authorized_users.len(),
        parallel_encoders = config.encoder.parallel_encoders,
        strategy = %config.encoder.strategy,
        "Configuration loaded"
    );

    let authorizer: Arc<dyn Authorizer> = Arc::from(
        create_authorizer(&config.access).context("Failed to create authorizer")?,
    );
    info!("Using authorizer: {}", authorizer.method_name());

    let fetcher = YtdlFetcher::new(config.fetcher.clone());
    if let Err(e) = fetcher.validate().await {
        warn!(error = %e, "Fetch tool check failed; downloads will fail until it is installed");
    }
    let encoder = FfmpegEncoder::new(config.encoder.clone());
    if let Err(e) = encoder.validate().await {
        warn!(error = %e, "ffmpeg check failed; encodes will fail until it is installed");
    }

    let pipeline = Arc::new(Pipeline::new(
        PipelineConfig::from(&config),
        fetcher,
        encoder,
    ));

    let client = Arc::new(
        TelegramClient::new(&config.telegram).context("Failed to create Telegram client")?,
    );
    let me = client
        .get_me()
        .await
        .context("Failed to reach the Telegram Bot API")?;
    info!(
        bot = me.username.as_deref().unwrap_or(&me.first_name),
        "Connected to Telegram"
    );

    let dispatcher = Arc::new(MessageDispatcher::new(
        client.clone(),
        authorizer,
        pipeline.clone(),
        config.encoder.strategy,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = Poller::new(
        Arc::clone(&client),
        dispatcher,
        config.telegram.poll_timeout_secs,
    );
    let poller_handle = tokio::spawn(poller.run(shutdown_rx.clone()));

    // Optional status server
    let server_handle = if config.http.enabled {
        let state = Arc::new(AppState::new(config.clone(), pipeline.clone()));
        let app = create_router(state);

        let addr = SocketAddr::new(config.http.host, config.http.port);
        info!("Starting status server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        let mut server_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.wait_for(|stop| *stop).await;
                })
                .await
        }))
    } else {
        None
    };

    shutdown_signal().await;
    info!("Shutting down...");

    // Stop taking jobs; queued ones fail, running encodes finish.
    pipeline.shutdown();
    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_handle.await {
        warn!(error = %e, "Poller task failed");
    }

    tokio::select! {
        _ = drain(&pipeline) => info!("All jobs finished"),
        _ = shutdown_signal() => warn!("Second signal received, abandoning running jobs"),
    }

    if let Some(handle) = server_handle {
        handle
            .await
            .context("Status server task failed")?
            .context("Status server error")?;
    }

    info!("Stopped");
    Ok(())
}

/// Waits until no job is live.
async fn drain<F: Fetcher + 'static, E: Encoder + 'static>(pipeline: &Pipeline<F, E>) {
    loop {
        let active = pipeline.active_jobs().await;
        if active == 0 {
            return;
        }
        info!(active, "Waiting for running jobs");
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}

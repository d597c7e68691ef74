//! dongjeop-api - Accessibility review service
//!
//! Serves the labeled restaurant-photo dataset with accessibility scores and
//! runs vision-model analysis over collected photo batches.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dongjeop_api::vision::{OpenAiVisionClient, VisionAnalyzer};
use dongjeop_api::{build_router, cors_layer, AppState};
use dongjeop_common::config::{load_toml_config, CliOverrides, ServiceConfig};
use dongjeop_common::RecordStore;

/// Command-line arguments for dongjeop-api
#[derive(Parser, Debug)]
#[command(name = "dongjeop-api")]
#[command(about = "Accessibility review service for restaurant interior photos")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "DONGJEOP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DONGJEOP_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DONGJEOP_PORT")]
    port: Option<u16>,

    /// Data directory holding gt/ and spider/
    #[arg(short, long, env = "DONGJEOP_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log level comes from the config file, so it is read before tracing starts;
    // the outcome is logged once the subscriber is installed
    let (toml_config, config_source) = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "dongjeop_api={level},dongjeop_common={level},tower_http=info",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting dongjeop-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();

    let cli = CliOverrides {
        host: args.host,
        port: args.port,
        data_dir: args.data_dir,
    }
    .with_legacy_env();
    let config = ServiceConfig::resolve(&cli, toml_config);

    info!("Dataset: {}", config.paths.dataset.display());
    info!("Labeled images: {}", config.paths.images.display());
    info!("Collection root: {}", config.paths.collection.display());

    let store = Arc::new(RecordStore::new(&config.paths.dataset));
    let records = store.load(false);
    info!("✓ Dataset ready ({} records)", records.len());

    let mut state = AppState::new(Arc::clone(&store), config.paths.clone())
        .with_request_interval(config.vision.request_interval);

    if config.vision.api_key.is_some() {
        match OpenAiVisionClient::from_settings(&config.vision) {
            Ok(client) => {
                info!("✓ Vision analysis enabled (model {})", client.model());
                let analyzer: Arc<dyn VisionAnalyzer> = Arc::new(client);
                state = state.with_analyzer(analyzer);
            }
            Err(e) => warn!("Vision analysis disabled: {}", e),
        }
    }

    let app = build_router(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    let ip = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid host address: {}", config.host))?;
    let addr = SocketAddr::new(ip, config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("dongjeop-api listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

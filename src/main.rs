//! Spyglass Binary Entry Point
//!
//! This binary runs the spyglass metrics bridge. Core functionality is
//! provided by the `spyglass` library crate.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use spyglass::{
    collector::UpstreamCollector,
    config::AppConfig,
    server::{AppState, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Spyglass - Upstream Metrics Bridge
#[derive(Parser, Debug)]
#[command(name = "spyglass", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SPYGLASS_CONFIG")]
    config: Option<String>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "SPYGLASS_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "SPYGLASS_SERVER_PORT")]
    server_port: Option<u16>,

    /// Upstream base URL (overrides config file)
    #[arg(long, env = "SPYGLASS_UPSTREAM_URL")]
    upstream_url: Option<String>,

    /// Metric namespace prefix (overrides config file)
    #[arg(long, env = "SPYGLASS_NAMESPACE")]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spyglass=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Spyglass - Upstream Metrics Bridge");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file, falling back to built-in defaults
    let mut config = match cli.config {
        Some(ref path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(url) = cli.upstream_url {
        config.upstream.base_url = url;
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    config.validate()?;

    tracing::info!(
        "Exporter: {}:{}, upstream: {}, namespace: {}",
        config.server.bind,
        config.server.port,
        config.upstream.base_url,
        config.namespace,
    );

    // Build the collector and web server state
    let collector = UpstreamCollector::new(config.namespace.as_str(), config.upstream.clone())?;
    let state = AppState {
        collector: Arc::new(collector),
    };
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Metrics server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Serve scrape requests until terminated
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

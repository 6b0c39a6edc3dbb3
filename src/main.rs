//! LRU Snapshot Cache server
//!
//! Serves a bounded JSON cache over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_snapshot_cache::api::{create_router, AppState};
use lru_snapshot_cache::config::ServerConfig;

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (starts the expiry sweeper when a TTL is set)
/// 4. Optionally restore the snapshot file
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Stop the sweeper and optionally write a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_snapshot_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LRU Snapshot Cache server");

    let config = ServerConfig::from_env();
    info!(
        "Configuration loaded: capacity={}, ttl={:?}s, snapshot={}, sweep_interval={}ms, port={}",
        config.capacity,
        config.ttl_secs,
        config.snapshot_path.display(),
        config.sweep_interval_ms,
        config.server_port
    );

    let state = AppState::from_config(config.cache_config()).context("invalid cache configuration")?;

    if config.load_snapshot_on_start {
        // A missing or corrupt snapshot is not fatal; start empty instead
        match state.cache.load_snapshot().await {
            Ok(count) => info!("Restored {} entries from snapshot", count),
            Err(e) => warn!("Starting with an empty cache: {}", e),
        }
    }

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.cache.stop_sweeper().await;

    if config.snapshot_on_shutdown {
        let count = state
            .cache
            .write_snapshot()
            .await
            .context("failed to write shutdown snapshot")?;
        info!("Wrote {} entries to snapshot on shutdown", count);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

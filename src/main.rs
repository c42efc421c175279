//! Bork - A dog registry API
//!
//! Serves owner-scoped dog records over REST and GraphQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bork::cache::{CacheConfig, ReadThroughCache};
use bork::clock::SystemClock;
use bork::sources::{MemoryStore, SqliteStore};
use bork::{create_router, AppState, Config};

/// Main entry point for the Bork API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the SQLite store and wrap it in the read-through cache
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bork=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bork API Server");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: db_path={}, port={}, dog_cache_ttl={}s, environment={}",
        config.db_path, config.server_port, config.cache_ttl, config.environment
    );

    let read_store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path))?;
    let store = ReadThroughCache::new(
        CacheConfig {
            ttl: config.cache_ttl_duration(),
            cache_store: MemoryStore::new(),
            read_store,
        },
        Arc::new(SystemClock),
    );
    info!("Dog store initialized");

    let state = AppState::from_config(Arc::new(store), &config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
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

//! # Shikkha API Server
//!
//! ```text
//! ApiConfig::load() ──► Database::new() (+ migrations) ──► create_router()
//!                                                              │
//!                                                              ▼
//!                                  axum::serve ... until Ctrl+C / SIGTERM
//! ```

use anyhow::Context;
use shikkha_api::{create_router, ApiConfig, AppState};
use shikkha_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,shikkha_api=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Shikkha API server...");

    let config = ApiConfig::load().context("loading configuration")?;
    let addr = config.bind_addr()?;
    info!(
        %addr,
        environment = ?config.environment,
        db_url = %config.database_url.chars().take(30).collect::<String>(),
        "Configuration loaded"
    );
    if config.is_development() {
        warn!("Running in development mode");
    }

    let db = Database::new(DbConfig::new(config.database_url.clone()).max_connections(config.db_max_connections))
        .await
        .context("connecting to PostgreSQL")?;
    info!("Connected to PostgreSQL");

    let state = AppState::new(db.clone(), config);
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}

//! # Stockbook API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  client ───► HTTP (3000) ───► routes ───► PostingEngine ───► SQLite    │
//! │                                  │                                      │
//! │                                  └──► notifier (after commit)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use stockbook_api::{create_app, ApiConfig, AppState, LogNotifier};
use stockbook_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it carries the fallback log level
    let config = ApiConfig::load().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("Starting Stockbook API server...");
    info!(
        addr = %config.addr(),
        database = %config.database_path,
        max_attempts = config.posting_max_attempts,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("STOCKBOOK_JWT_SECRET is unset; tokens are verified with the development secret");
    }

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;
    info!("Database ready, migrations applied");

    let addr = config.addr();
    let state = Arc::new(AppState::new(&config, db.clone(), Arc::new(LogNotifier)));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
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
            Ok(mut stream) => {
                stream.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

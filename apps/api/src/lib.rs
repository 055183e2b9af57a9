//! # Stockbook API
//!
//! HTTP server for transaction posting, stock and balance adjustment, and
//! ledger reads.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Stockbook API                                 │
//! │                                                                         │
//! │  GET    /health                          (no auth)                      │
//! │                                                                         │
//! │  ── bearer token → BusinessContext ──────────────────────────────────── │
//! │  POST   /api/transactions                post sale / purchase           │
//! │  GET    /api/transactions                ledger, filtered + paginated   │
//! │  GET    /api/transactions/summary        sales vs. purchases            │
//! │  GET    /api/transactions/{id}           one record with summaries      │
//! │  PATCH  /api/transactions/{id}/status    status machine                 │
//! │  GET    /api/products/low-stock          stock <= min level             │
//! │  PATCH  /api/products/{id}/stock         set / add / subtract           │
//! │  PATCH  /api/contacts/{id}/balance       set / add / subtract           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (all optional, see [`config::ApiConfig`]):
//! - `STOCKBOOK_HOST`, `STOCKBOOK_PORT` - bind address (default `0.0.0.0:3000`)
//! - `STOCKBOOK_DATABASE_PATH` - SQLite file (default `./stockbook.db`)
//! - `STOCKBOOK_JWT_SECRET` - secret for bearer token verification
//! - `STOCKBOOK_POSTING_MAX_ATTEMPTS`, `STOCKBOOK_POSTING_BACKOFF_MS` - retry budget
//! - `RUST_LOG` - tracing filter (falls back to `STOCKBOOK_LOG_LEVEL`)

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod notify;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;
use stockbook_db::{Database, PostingEngine};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::ApiError;
pub use notify::{LogNotifier, TransactionNotifier};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub engine: PostingEngine,
    pub jwt: JwtManager,
    pub notifier: Arc<dyn TransactionNotifier>,
}

impl AppState {
    /// Wires the engine and token verifier from `config`.
    pub fn new(config: &ApiConfig, db: Database, notifier: Arc<dyn TransactionNotifier>) -> Self {
        AppState {
            engine: db.posting_engine(config.retry_policy()),
            jwt: JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs),
            db,
            notifier,
        }
    }
}

/// Creates the application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/transactions",
            get(routes::transactions::list).post(routes::transactions::create),
        )
        .route("/api/transactions/summary", get(routes::transactions::summary))
        .route("/api/transactions/{id}", get(routes::transactions::get))
        .route(
            "/api/transactions/{id}/status",
            patch(routes::transactions::update_status),
        )
        .route("/api/products/low-stock", get(routes::products::low_stock))
        .route("/api/products/{id}/stock", patch(routes::products::adjust_stock))
        .route("/api/contacts/{id}/balance", patch(routes::contacts::adjust_balance))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

//! # stockbook-db: Database Layer and Posting Engine
//!
//! This crate owns every read and write against the Stockbook database,
//! using SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/transactions)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ PostingEngine │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (engine/)    │───►│ ProductRepo   │    │  (embedded)  │  │   │
//! │  │   │ tx + CAS +    │    │ ContactRepo   │    │              │  │   │
//! │  │   │ bounded retry │    │ TransactionRe │    │ 001_init.sql │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           └────────────┬───────┘                               │   │
//! │  │                  Database (pool.rs)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and posting error types
//! - [`repository`] - Products, contacts, transaction ledger
//! - [`engine`] - Posting, stock/balance adjustment, status updates
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_db::{Database, DbConfig, RetryPolicy};
//!
//! let db = Database::new(DbConfig::new("stockbook.db")).await?;
//! let engine = db.posting_engine(RetryPolicy::default());
//! let details = engine.post(&business_id, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{PostingEngine, RetryPolicy};
pub use error::{DbError, DbResult, PostingError, PostingResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::contact::ContactRepository;
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;

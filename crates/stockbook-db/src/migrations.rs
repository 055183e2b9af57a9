//! # Schema Migrations
//!
//! The Stockbook schema, embedded from `migrations/sqlite` at compile time
//! and applied by [`Database::new`](crate::Database::new) unless disabled.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products           stock >= 0, version (CAS token), sku unique per    │
//! │                     business, soft delete via is_active                │
//! │  contacts           customer | vendor, current_balance_cents (signed), │
//! │                     version (CAS token), phone unique per business     │
//! │  transactions       ledger header: type, counterparty + name snapshot, │
//! │                     total_amount_cents, status, payment_method         │
//! │  transaction_lines  (transaction_id, position) → product + name        │
//! │                     snapshot, line_total = quantity × unit_price       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CHECK constraints are a backstop. The posting engine and the core
//! planner never produce a row that would trip them.
//!
//! Applied files are checksummed in `_sqlx_migrations`; schema changes go
//! in a new `NNN_description.sql`, never into an applied file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations. A no-op when the schema is current.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(embedded = MIGRATOR.migrations.len(), "Applying schema migrations");

    MIGRATOR.run(pool).await?;

    info!("Schema is current");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((embedded, applied as usize))
}

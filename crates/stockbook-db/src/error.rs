//! # Database Error Types
//!
//! Error types for database operations and for the posting engine.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                  busy/locked/lost CAS become Conflict          │
//! │       ▼                                                                 │
//! │  PostingError ← Rejected(CoreError) | ConcurrentModification | Storage │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in apps/api) ← status code + {success: false, message}      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockbook_core::CoreError;
use thiserror::Error;

/// SQLite result codes that mean "someone else holds the write lock".
///
/// SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_BUSY_RECOVERY (261),
/// SQLITE_LOCKED_SHAREDCACHE (262), SQLITE_BUSY_SNAPSHOT (517).
const CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate SKU or phone within one business
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A concurrent writer got there first.
    ///
    /// ## When This Occurs
    /// - A version compare-and-swap matched zero rows
    /// - SQLite reported the database busy or locked
    ///
    /// Always transient: the whole unit of work may be retried.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a lost compare-and-swap.
    pub fn version_conflict(entity: &str, id: &str) -> Self {
        DbError::Conflict(format!("{} {} changed while being updated", entity, id))
    }

    /// True when retrying the unit of work may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → busy/locked → Conflict
///                               otherwise analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let contended = db_err
                    .code()
                    .map(|code| CONTENTION_CODES.contains(&code.as_ref()))
                    .unwrap_or(false);

                if contended || msg.contains("database is locked") {
                    DbError::Conflict(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Posting Error
// =============================================================================

/// The single terminal error a caller of the posting engine sees.
#[derive(Debug, Error)]
pub enum PostingError {
    /// A business rule rejected the request. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Every attempt lost a race with a concurrent writer.
    #[error("The records changed concurrently; gave up after {attempts} attempts")]
    ConcurrentModification { attempts: u32 },

    /// Infrastructure failure. Nothing was written.
    #[error("Storage failure: {0}")]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for PostingError {
    fn from(err: sqlx::Error) -> Self {
        PostingError::Storage(DbError::from(err))
    }
}

impl PostingError {
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, PostingError::Storage(e) if e.is_transient())
    }
}

/// Result type for posting engine operations.
pub type PostingResult<T> = Result<T, PostingError>;

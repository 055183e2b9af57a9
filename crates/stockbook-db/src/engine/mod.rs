//! # Posting Engine
//!
//! The only writer of stock counters, contact balances and ledger rows.
//!
//! ## One Post = One Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PostingEngine::post                                 │
//! │                                                                         │
//! │  PostingRequest::validate()            (no I/O, never retried)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─ attempt 1..=max_attempts ───────────────────────────────────────┐  │
//! │  │  BEGIN IMMEDIATE                                                 │  │
//! │  │    read contact, products (with versions)                        │  │
//! │  │    plan in stockbook-core                                        │  │
//! │  │    CAS stock per product, INSERT ledger row, CAS balance         │  │
//! │  │  COMMIT                                                          │  │
//! │  │                                                                  │  │
//! │  │  lost CAS / SQLITE_BUSY → ROLLBACK, sleep backoff × attempt ──┐  │  │
//! │  └───────────────────────────────────────────────────────────────┼──┘  │
//! │       │                                              ▲           │     │
//! │       │                                              └───────────┘     │
//! │       ▼                                                                 │
//! │  Ok(details) | Rejected | ConcurrentModification | Storage             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No in-process lock guards any counter. The storage transaction gives
//! all-or-nothing and the version columns detect lost updates; the retry
//! loop re-reads fresh state. Writers on one database file are serialized
//! by SQLite's write lock, so posts on unrelated records wait their turn
//! for at most `busy_timeout` rather than failing.
//!
//! The unit of work runs on the transaction's connection only. Touching the
//! pool from inside an attempt would deadlock a single-connection pool.

mod adjust;
mod posting;

use std::future::Future;
use std::time::Duration;

use sqlx::SqlitePool;
use tracing::warn;

use crate::error::{PostingError, PostingResult};

// =============================================================================
// Retry Policy
// =============================================================================

/// Bounded retry budget for contended units of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `backoff × n` before attempt `n + 1`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Orchestrates posting and the narrow adjustment operations.
///
/// Cheap to clone: it holds the pool handle and the retry policy.
#[derive(Debug, Clone)]
pub struct PostingEngine {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl PostingEngine {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        PostingEngine { pool, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Runs `attempt` until it succeeds, fails terminally, or the retry
    /// budget is spent.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> PostingResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PostingResult<T>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if err.is_transient() => {
                    if tries >= self.retry.max_attempts {
                        warn!(operation, attempts = tries, error = %err, "Retry budget exhausted");
                        return Err(PostingError::ConcurrentModification { attempts: tries });
                    }
                    warn!(operation, attempt = tries, error = %err, "Concurrent modification, retrying");
                    tokio::time::sleep(self.retry.delay(tries)).await;
                    tries += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_policy() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay(3), Duration::from_millis(30));
        assert_eq!(RetryPolicy::default().max_attempts, 3);
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_transient_conflict() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = db.posting_engine(RetryPolicy::new(3, Duration::from_millis(1)));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = engine
            .with_retry("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PostingError::Storage(DbError::Conflict("busy".into())))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_budget() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = db.posting_engine(RetryPolicy::new(3, Duration::from_millis(1)));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: PostingResult<()> = engine
            .with_retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PostingError::Storage(DbError::Conflict("busy".into())))
            })
            .await;

        assert!(matches!(
            result,
            Err(PostingError::ConcurrentModification { attempts: 3 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_rejections() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = db.posting_engine(RetryPolicy::default());
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: PostingResult<()> = engine
            .with_retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PostingError::Rejected(
                    stockbook_core::CoreError::ProductNotFound("p".into()),
                ))
            })
            .await;

        assert!(matches!(result, Err(PostingError::Rejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

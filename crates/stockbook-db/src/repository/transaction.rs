//! # Transaction Repository
//!
//! Database operations for the transaction ledger.
//!
//! ## Ledger Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions                        transaction_lines                  │
//! │  ┌──────────────────────────┐        ┌──────────────────────────────┐  │
//! │  │ id                       │◄───────│ transaction_id  position     │  │
//! │  │ business_id              │   1:N  │ product_id      product_name │  │
//! │  │ transaction_type         │        │ quantity        unit_price   │  │
//! │  │ counterparty_id / _name  │        │ line_total                   │  │
//! │  │ total_amount_cents       │        └──────────────────────────────┘  │
//! │  │ status  payment_method   │                                          │
//! │  │ date                     │  total_amount_cents = Σ line_total_cents  │
//! │  └──────────────────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are only ever inserted by the posting engine. The one later write
//! is the status column.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::{
    ContactSummary, LedgerQuery, LedgerSummary, Pagination, ProductSummary, Transaction,
    TransactionDetails, TransactionLine, TransactionStatus, TransactionType,
};

const TRANSACTION_COLUMNS: &str = "id, business_id, transaction_type, counterparty_id, \
     counterparty_name, total_amount_cents, status, payment_method, notes, invoice_number, \
     date, created_at, updated_at";

const LINE_COLUMNS: &str = "transaction_id, position, product_id, product_name, quantity, \
     unit_price_cents, line_total_cents";

/// Repository for ledger reads and the status write.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction with its lines, scoped to the business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, business_id, id).await
    }

    /// Gets a transaction with its counterparty and product summaries.
    pub async fn get_details(
        &self,
        business_id: &str,
        id: &str,
    ) -> DbResult<Option<TransactionDetails>> {
        let mut conn = self.pool.acquire().await?;
        match fetch(&mut conn, business_id, id).await? {
            Some(transaction) => Ok(Some(load_details(&mut conn, transaction).await?)),
            None => Ok(None),
        }
    }

    /// Runs the ledger range query.
    ///
    /// ## Ordering
    /// Newest posting date first; ties broken by creation time, then id,
    /// so pages are stable.
    pub async fn list(
        &self,
        business_id: &str,
        query: &LedgerQuery,
    ) -> DbResult<(Vec<Transaction>, Pagination)> {
        debug!(business_id = %business_id, ?query, "Listing transactions");

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions");
        push_filters(&mut count_qb, business_id, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
        push_filters(&mut qb, business_id, query);
        qb.push(" ORDER BY date DESC, created_at DESC, id DESC LIMIT ");
        qb.push_bind(i64::from(query.limit));
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());

        let mut transactions: Vec<Transaction> = qb
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        let mut conn = self.pool.acquire().await?;
        attach_lines(&mut conn, &mut transactions).await?;

        debug!(count = transactions.len(), total, "Transactions listed");
        Ok((transactions, Pagination::new(query, total)))
    }

    /// Totals per transaction type over an optional date range.
    ///
    /// Every status is included.
    pub async fn summary(
        &self,
        business_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<LedgerSummary> {
        debug!(business_id = %business_id, ?start, ?end, "Summarizing transactions");

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT transaction_type, COALESCE(SUM(total_amount_cents), 0), COUNT(*) \
             FROM transactions WHERE business_id = ",
        );
        qb.push_bind(business_id.to_string());
        if let Some(start) = start {
            qb.push(" AND date >= ").push_bind(start);
        }
        if let Some(end) = end {
            qb.push(" AND date <= ").push_bind(end);
        }
        qb.push(" GROUP BY transaction_type");

        let groups: Vec<(TransactionType, i64, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(LedgerSummary::from_groups(groups))
    }

    /// Counts every ledger row of a business.
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE business_id = ?1")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, business_id: &str, query: &LedgerQuery) {
    qb.push(" WHERE business_id = ").push_bind(business_id.to_string());

    if let Some(transaction_type) = query.transaction_type {
        qb.push(" AND transaction_type = ").push_bind(transaction_type);
    }
    if let Some(start) = query.start {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = query.end {
        qb.push(" AND date <= ").push_bind(end);
    }
    if let Some(counterparty_id) = &query.counterparty_id {
        qb.push(" AND counterparty_id = ").push_bind(counterparty_id.clone());
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

// =============================================================================
// Connection-Level Operations
// =============================================================================

/// Reads a transaction header and its lines.
pub(crate) async fn fetch(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Transaction>> {
    debug!(business_id = %business_id, id = %id, "Fetching transaction");

    let sql = format!(
        "SELECT {} FROM transactions WHERE id = ?1 AND business_id = ?2",
        TRANSACTION_COLUMNS
    );
    let transaction = sqlx::query_as::<_, Transaction>(&sql)
        .bind(id)
        .bind(business_id)
        .fetch_optional(&mut *conn)
        .await?;

    match transaction {
        Some(mut transaction) => {
            let sql = format!(
                "SELECT {} FROM transaction_lines WHERE transaction_id = ?1 ORDER BY position",
                LINE_COLUMNS
            );
            transaction.lines = sqlx::query_as::<_, TransactionLine>(&sql)
                .bind(&transaction.id)
                .fetch_all(&mut *conn)
                .await?;
            Ok(Some(transaction))
        }
        None => Ok(None),
    }
}

/// Inserts a ledger row and all of its lines.
pub(crate) async fn insert(conn: &mut SqliteConnection, transaction: &Transaction) -> DbResult<()> {
    debug!(
        id = %transaction.id,
        transaction_type = %transaction.transaction_type,
        lines = transaction.lines.len(),
        "Inserting transaction"
    );

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, business_id, transaction_type, counterparty_id, counterparty_name,
            total_amount_cents, status, payment_method, notes, invoice_number,
            date, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.business_id)
    .bind(transaction.transaction_type)
    .bind(&transaction.counterparty_id)
    .bind(&transaction.counterparty_name)
    .bind(transaction.total_amount_cents)
    .bind(transaction.status)
    .bind(transaction.payment_method)
    .bind(&transaction.notes)
    .bind(&transaction.invoice_number)
    .bind(transaction.date)
    .bind(transaction.created_at)
    .bind(transaction.updated_at)
    .execute(&mut *conn)
    .await?;

    for line in &transaction.lines {
        sqlx::query(
            r#"
            INSERT INTO transaction_lines (
                transaction_id, position, product_id, product_name,
                quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&line.transaction_id)
        .bind(line.position)
        .bind(&line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Moves `status` from `expected` to `next`, guarded on the current value.
pub(crate) async fn compare_and_set_status(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
    expected: TransactionStatus,
    next: TransactionStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = ?1, updated_at = ?2
        WHERE id = ?3 AND business_id = ?4 AND status = ?5
        "#,
    )
    .bind(next)
    .bind(now)
    .bind(id)
    .bind(business_id)
    .bind(expected)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::Conflict(format!(
            "transaction {} status changed while being updated",
            id
        )));
    }

    Ok(())
}

/// Builds the counterparty and product summaries for a transaction.
pub(crate) async fn load_details(
    conn: &mut SqliteConnection,
    transaction: Transaction,
) -> DbResult<TransactionDetails> {
    let counterparty = sqlx::query_as::<_, ContactSummary>(
        "SELECT id, name, phone, email FROM contacts WHERE id = ?1 AND business_id = ?2",
    )
    .bind(&transaction.counterparty_id)
    .bind(&transaction.business_id)
    .fetch_optional(&mut *conn)
    .await?;

    let mut products: Vec<ProductSummary> = Vec::new();
    if !transaction.lines.is_empty() {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, sku, category FROM products WHERE business_id = ",
        );
        qb.push_bind(transaction.business_id.clone());
        qb.push(" AND id IN (");
        let mut ids = qb.separated(", ");
        for line in &transaction.lines {
            ids.push_bind(line.product_id.clone());
        }
        ids.push_unseparated(")");

        let found: Vec<ProductSummary> = qb.build_query_as().fetch_all(&mut *conn).await?;

        // Line order, one entry per product.
        for line in &transaction.lines {
            if products.iter().any(|p| p.id == line.product_id) {
                continue;
            }
            if let Some(summary) = found.iter().find(|p| p.id == line.product_id) {
                products.push(summary.clone());
            }
        }
    }

    Ok(TransactionDetails {
        transaction,
        counterparty,
        products,
    })
}

async fn attach_lines(
    conn: &mut SqliteConnection,
    transactions: &mut [Transaction],
) -> DbResult<()> {
    if transactions.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM transaction_lines WHERE transaction_id IN (",
        LINE_COLUMNS
    ));
    let mut ids = qb.separated(", ");
    for transaction in transactions.iter() {
        ids.push_bind(transaction.id.clone());
    }
    ids.push_unseparated(") ORDER BY transaction_id, position");

    let lines: Vec<TransactionLine> = qb.build_query_as().fetch_all(&mut *conn).await?;

    for transaction in transactions.iter_mut() {
        transaction.lines = lines
            .iter()
            .filter(|line| line.transaction_id == transaction.id)
            .cloned()
            .collect();
    }

    Ok(())
}

/// Helper to generate a new transaction ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

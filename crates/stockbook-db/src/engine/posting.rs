//! Posting a sale or purchase.

use chrono::Utc;
use tracing::{debug, info};

use stockbook_core::{
    CoreError, PostingPlanner, PostingRequest, ProductSummary, TransactionDetails,
    ValidatedPosting,
};

use super::PostingEngine;
use crate::error::PostingResult;
use crate::repository::{contact, product, transaction};

impl PostingEngine {
    /// Validates and posts a transaction as one atomic unit.
    ///
    /// ## Returns
    /// * `Ok(TransactionDetails)` - committed record with counterparty and
    ///   product summaries
    /// * `Err(PostingError::Rejected)` - a business rule failed; nothing written
    /// * `Err(PostingError::ConcurrentModification)` - retry budget spent
    /// * `Err(PostingError::Storage)` - infrastructure failure; nothing written
    pub async fn post(
        &self,
        business_id: &str,
        request: PostingRequest,
    ) -> PostingResult<TransactionDetails> {
        let validated = request.validate()?;
        let posting = &validated;

        let details = self
            .with_retry("post_transaction", move || self.try_post(business_id, posting))
            .await?;

        info!(
            business_id = %business_id,
            transaction_id = %details.transaction.id,
            transaction_type = %details.transaction.transaction_type,
            total = %details.transaction.total(),
            lines = details.transaction.lines.len(),
            "Transaction posted"
        );

        Ok(details)
    }

    /// One attempt. Dropping `tx` on any early return rolls everything back.
    async fn try_post(
        &self,
        business_id: &str,
        posting: &ValidatedPosting,
    ) -> PostingResult<TransactionDetails> {
        // IMMEDIATE takes the write lock up front, so overlapping posts queue
        // on busy_timeout instead of failing their read-to-write upgrade.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let expected = posting.transaction_type.expected_contact_type();
        let counterparty = contact::fetch_active(&mut *tx, business_id, &posting.counterparty_id)
            .await?
            .ok_or_else(|| CoreError::CounterpartyNotFound {
                contact_type: expected,
                id: posting.counterparty_id.clone(),
            })?;

        let mut planner = PostingPlanner::new(posting, &counterparty)?;
        let mut products: Vec<ProductSummary> = Vec::new();

        // Line order: the first failing line is the one reported.
        for line in &posting.lines {
            let found = product::fetch_active(&mut *tx, business_id, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            planner.add_line(line, &found)?;
            if !products.iter().any(|p| p.id == found.id) {
                products.push(ProductSummary::from(&found));
            }
        }

        let plan = planner.finish()?;
        let now = Utc::now();

        for change in &plan.stock_changes {
            product::compare_and_set_stock(
                &mut *tx,
                business_id,
                &change.product_id,
                change.expected_version,
                change.new_stock,
                now,
            )
            .await?;
        }

        let record = plan.to_transaction(transaction::generate_transaction_id(), business_id, now);
        transaction::insert(&mut *tx, &record).await?;

        if let Some(change) = &plan.balance_change {
            contact::compare_and_set_balance(
                &mut *tx,
                business_id,
                &change.contact_id,
                change.expected_version,
                change.new.cents(),
                now,
            )
            .await?;
            debug!(
                contact_id = %change.contact_id,
                previous = %change.previous,
                new = %change.new,
                "Credit sale raised balance"
            );
        }

        tx.commit().await?;

        Ok(TransactionDetails {
            transaction: record,
            counterparty: Some(counterparty.summary()),
            products,
        })
    }
}

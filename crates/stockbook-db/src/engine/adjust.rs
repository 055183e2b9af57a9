//! Stock, balance and status changes made outside of posting.
//!
//! Each one is a read followed by a compare-and-swap, retried under the
//! same policy as posting.

use chrono::Utc;
use tracing::info;

use stockbook_core::validation::validate_id;
use stockbook_core::{
    BalanceAdjustment, BalanceOperation, CoreError, Money, StockAdjustment, StockOperation,
    Transaction, TransactionStatus,
};

use super::PostingEngine;
use crate::error::{PostingError, PostingResult};
use crate::repository::{contact, product, transaction};

impl PostingEngine {
    /// Sets, adds to, or subtracts from a product's stock.
    ///
    /// Subtraction floors at zero rather than failing.
    pub async fn adjust_stock(
        &self,
        business_id: &str,
        product_id: &str,
        quantity: i64,
        operation: StockOperation,
    ) -> PostingResult<StockAdjustment> {
        validate_id("productId", product_id).map_err(CoreError::from)?;

        let adjustment = self
            .with_retry("adjust_stock", move || async move {
                let mut conn = self.pool.acquire().await?;
                let current = product::fetch_active(&mut conn, business_id, product_id)
                    .await?
                    .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

                let new_stock = operation.apply(current.stock, quantity)?;
                product::compare_and_set_stock(
                    &mut conn,
                    business_id,
                    product_id,
                    current.version,
                    new_stock,
                    Utc::now(),
                )
                .await?;

                Ok::<_, PostingError>(StockAdjustment {
                    previous_stock: current.stock,
                    new_stock,
                    operation,
                })
            })
            .await?;

        info!(
            business_id = %business_id,
            product_id = %product_id,
            ?operation,
            previous = adjustment.previous_stock,
            new = adjustment.new_stock,
            "Stock adjusted"
        );

        Ok(adjustment)
    }

    /// Sets, adds to, or subtracts from a contact's balance. No floor.
    pub async fn adjust_balance(
        &self,
        business_id: &str,
        contact_id: &str,
        amount: Money,
        operation: BalanceOperation,
    ) -> PostingResult<BalanceAdjustment> {
        validate_id("contactId", contact_id).map_err(CoreError::from)?;

        let adjustment = self
            .with_retry("adjust_balance", move || async move {
                let mut conn = self.pool.acquire().await?;
                let current = contact::fetch_active(&mut conn, business_id, contact_id)
                    .await?
                    .ok_or_else(|| CoreError::ContactNotFound(contact_id.to_string()))?;

                let new_balance = operation.apply(current.balance(), amount)?;
                contact::compare_and_set_balance(
                    &mut conn,
                    business_id,
                    contact_id,
                    current.version,
                    new_balance.cents(),
                    Utc::now(),
                )
                .await?;

                Ok::<_, PostingError>(BalanceAdjustment {
                    previous_balance: current.balance(),
                    new_balance,
                    operation,
                })
            })
            .await?;

        info!(
            business_id = %business_id,
            contact_id = %contact_id,
            ?operation,
            previous = %adjustment.previous_balance,
            new = %adjustment.new_balance,
            "Balance adjusted"
        );

        Ok(adjustment)
    }

    /// Moves a transaction to `next` if the status machine allows it.
    ///
    /// Metadata only: stock and balances are not touched. A transition to
    /// the current status returns the record unchanged.
    pub async fn update_status(
        &self,
        business_id: &str,
        transaction_id: &str,
        next: TransactionStatus,
    ) -> PostingResult<Transaction> {
        validate_id("id", transaction_id).map_err(CoreError::from)?;

        let updated = self
            .with_retry("update_status", move || async move {
                let mut conn = self.pool.acquire().await?;
                let mut current = transaction::fetch(&mut conn, business_id, transaction_id)
                    .await?
                    .ok_or_else(|| CoreError::TransactionNotFound(transaction_id.to_string()))?;

                let from = current.status;
                let to = from.transition_to(next)?;
                if from == to {
                    return Ok(current);
                }

                let now = Utc::now();
                transaction::compare_and_set_status(
                    &mut conn,
                    business_id,
                    transaction_id,
                    from,
                    to,
                    now,
                )
                .await?;

                current.status = to;
                current.updated_at = now;
                Ok::<_, PostingError>(current)
            })
            .await?;

        info!(
            business_id = %business_id,
            transaction_id = %transaction_id,
            status = %updated.status,
            "Transaction status updated"
        );

        Ok(updated)
    }
}

//! Post-commit notifications.
//!
//! Runs after a transaction is committed, on its own task. A notifier can
//! never change the outcome of the request that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use stockbook_core::TransactionDetails;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Receives every committed transaction.
#[async_trait]
pub trait TransactionNotifier: Send + Sync {
    async fn transaction_posted(
        &self,
        business_id: &str,
        details: &TransactionDetails,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: writes a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl TransactionNotifier for LogNotifier {
    async fn transaction_posted(
        &self,
        business_id: &str,
        details: &TransactionDetails,
    ) -> Result<(), NotifyError> {
        let transaction = &details.transaction;
        info!(
            business_id = %business_id,
            transaction_id = %transaction.id,
            transaction_type = %transaction.transaction_type,
            counterparty = %transaction.counterparty_name,
            total = %transaction.total(),
            items = transaction.item_count(),
            "Transaction notification"
        );
        Ok(())
    }
}

/// Hands a committed transaction to the notifier in the background.
pub fn spawn_notification(
    notifier: Arc<dyn TransactionNotifier>,
    business_id: String,
    details: TransactionDetails,
) {
    tokio::spawn(async move {
        if let Err(e) = notifier.transaction_posted(&business_id, &details).await {
            warn!(
                business_id = %business_id,
                transaction_id = %details.transaction.id,
                error = %e,
                "Transaction notification failed"
            );
        }
    });
}

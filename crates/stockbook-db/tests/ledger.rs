//! Adjustments, status updates and ledger queries.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{line, Fixture};
use stockbook_core::{
    BalanceOperation, CoreError, LedgerQuery, Money, PaymentMethod, StockOperation,
    TransactionStatus, TransactionType,
};
use stockbook_db::PostingError;
use uuid::Uuid;

// =============================================================================
// Stock Adjustment
// =============================================================================

#[tokio::test]
async fn test_adjust_stock_operations() {
    let fx = Fixture::new().await;
    let product = fx.add_product("Rice", 10, 2).await;

    let added = fx
        .engine
        .adjust_stock(&fx.business_id, &product.id, 5, StockOperation::Add)
        .await
        .unwrap();
    assert_eq!((added.previous_stock, added.new_stock), (10, 15));

    let set = fx
        .engine
        .adjust_stock(&fx.business_id, &product.id, 4, StockOperation::Set)
        .await
        .unwrap();
    assert_eq!((set.previous_stock, set.new_stock), (15, 4));

    let floored = fx
        .engine
        .adjust_stock(&fx.business_id, &product.id, 9, StockOperation::Subtract)
        .await
        .unwrap();
    assert_eq!((floored.previous_stock, floored.new_stock), (4, 0));

    let after = fx.product(&product.id).await;
    assert_eq!(after.stock, 0);
    assert_eq!(after.version, product.version + 3);
}

#[tokio::test]
async fn test_adjust_stock_rejects_negative_quantity() {
    let fx = Fixture::new().await;
    let product = fx.add_product("Rice", 10, 2).await;

    let result = fx
        .engine
        .adjust_stock(&fx.business_id, &product.id, -1, StockOperation::Add)
        .await;
    assert!(matches!(result, Err(PostingError::Rejected(CoreError::Validation(_)))));
    assert_eq!(fx.stock_of(&product.id).await, 10);
}

#[tokio::test]
async fn test_adjust_stock_of_unknown_product() {
    let fx = Fixture::new().await;

    let result = fx
        .engine
        .adjust_stock(&fx.business_id, &Uuid::new_v4().to_string(), 1, StockOperation::Add)
        .await;
    assert!(matches!(result, Err(PostingError::Rejected(CoreError::ProductNotFound(_)))));
}

// =============================================================================
// Balance Adjustment
// =============================================================================

#[tokio::test]
async fn test_adjust_balance_may_go_negative() {
    let fx = Fixture::new().await;

    let added = fx
        .engine
        .adjust_balance(&fx.business_id, &fx.customer.id, Money::from_cents(2500), BalanceOperation::Add)
        .await
        .unwrap();
    assert_eq!(added.new_balance.cents(), 2500);

    let paid = fx
        .engine
        .adjust_balance(
            &fx.business_id,
            &fx.customer.id,
            Money::from_cents(4000),
            BalanceOperation::Subtract,
        )
        .await
        .unwrap();
    assert_eq!(paid.previous_balance.cents(), 2500);
    assert_eq!(paid.new_balance.cents(), -1500);
    assert_eq!(fx.balance_of(&fx.customer.id).await, -1500);

    let reset = fx
        .engine
        .adjust_balance(&fx.business_id, &fx.customer.id, Money::zero(), BalanceOperation::Set)
        .await
        .unwrap();
    assert!(reset.new_balance.is_zero());
}

#[tokio::test]
async fn test_adjust_balance_of_unknown_contact() {
    let fx = Fixture::new().await;

    let result = fx
        .engine
        .adjust_balance(
            &fx.business_id,
            &Uuid::new_v4().to_string(),
            Money::from_cents(100),
            BalanceOperation::Add,
        )
        .await;
    assert!(matches!(result, Err(PostingError::Rejected(CoreError::ContactNotFound(_)))));
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn test_cancel_keeps_stock_and_blocks_reopen() {
    let fx = Fixture::new().await;
    let product = fx.add_product("Rice", 10, 0).await;
    let details = fx
        .engine
        .post(&fx.business_id, fx.sale(vec![line(&product, 4, 100)], PaymentMethod::Credit))
        .await
        .unwrap();
    let id = details.transaction.id;

    let same = fx
        .engine
        .update_status(&fx.business_id, &id, TransactionStatus::Completed)
        .await
        .unwrap();
    assert_eq!(same.status, TransactionStatus::Completed);

    let cancelled = fx
        .engine
        .update_status(&fx.business_id, &id, TransactionStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);

    // Metadata only.
    assert_eq!(fx.stock_of(&product.id).await, 6);
    assert_eq!(fx.balance_of(&fx.customer.id).await, 400);

    let result = fx
        .engine
        .update_status(&fx.business_id, &id, TransactionStatus::Completed)
        .await;
    assert!(matches!(
        result,
        Err(PostingError::Rejected(CoreError::InvalidStatusTransition {
            from: TransactionStatus::Cancelled,
            to: TransactionStatus::Completed,
        }))
    ));

    let stored = fx.db.transactions().get_by_id(&fx.business_id, &id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Cancelled);
}

#[tokio::test]
async fn test_update_status_of_unknown_transaction() {
    let fx = Fixture::new().await;

    let result = fx
        .engine
        .update_status(&fx.business_id, &Uuid::new_v4().to_string(), TransactionStatus::Cancelled)
        .await;
    assert!(matches!(result, Err(PostingError::Rejected(CoreError::TransactionNotFound(_)))));
}

// =============================================================================
// Ledger Queries
// =============================================================================

async fn seeded_ledger() -> Fixture {
    let fx = Fixture::new().await;
    let product = fx.add_product("Rice", 100, 0).await;

    for quantity in 1..=3 {
        fx.engine
            .post(&fx.business_id, fx.sale(vec![line(&product, quantity, 1000)], PaymentMethod::Cash))
            .await
            .unwrap();
    }
    fx.engine
        .post(&fx.business_id, fx.purchase(vec![line(&product, 10, 250)], PaymentMethod::Cash))
        .await
        .unwrap();

    fx
}

#[tokio::test]
async fn test_list_filters_and_pages() {
    let fx = seeded_ledger().await;
    let transactions = fx.db.transactions();

    let (all, pagination) = transactions.list(&fx.business_id, &LedgerQuery::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(pagination.total, 4);
    assert_eq!(pagination.pages, 1);
    assert!(all.iter().all(|t| !t.lines.is_empty()));

    let sales_only = LedgerQuery {
        transaction_type: Some(TransactionType::Sale),
        ..LedgerQuery::default()
    };
    let (sales, _) = transactions.list(&fx.business_id, &sales_only).await.unwrap();
    assert_eq!(sales.len(), 3);
    assert!(sales.iter().all(|t| t.customer_id() == Some(fx.customer.id.as_str())));

    let by_vendor = LedgerQuery {
        counterparty_id: Some(fx.vendor.id.clone()),
        ..LedgerQuery::default()
    };
    let (purchases, _) = transactions.list(&fx.business_id, &by_vendor).await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].total_amount_cents, 2500);

    let second_page = LedgerQuery {
        page: 2,
        limit: 3,
        ..LedgerQuery::default()
    };
    let (page, pagination) = transactions.list(&fx.business_id, &second_page).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!((pagination.current, pagination.pages, pagination.total), (2, 2, 4));
}

#[tokio::test]
async fn test_list_date_range_and_tenant_scope() {
    let fx = seeded_ledger().await;
    let transactions = fx.db.transactions();

    let future = LedgerQuery {
        start: Some(Utc::now() + ChronoDuration::days(1)),
        ..LedgerQuery::default()
    };
    let (none, pagination) = transactions.list(&fx.business_id, &future).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(pagination.total, 0);

    let around_now = LedgerQuery {
        start: Some(Utc::now() - ChronoDuration::hours(1)),
        end: Some(Utc::now() + ChronoDuration::hours(1)),
        ..LedgerQuery::default()
    };
    let (found, _) = transactions.list(&fx.business_id, &around_now).await.unwrap();
    assert_eq!(found.len(), 4);

    let other_business = Uuid::new_v4().to_string();
    let (foreign, _) = transactions.list(&other_business, &LedgerQuery::default()).await.unwrap();
    assert!(foreign.is_empty());
}

#[tokio::test]
async fn test_summary_totals_per_type() {
    let fx = seeded_ledger().await;

    let summary = fx.db.transactions().summary(&fx.business_id, None, None).await.unwrap();

    assert_eq!(summary.sales.total_amount.cents(), 6000);
    assert_eq!(summary.sales.transaction_count, 3);
    assert_eq!(summary.sales.average_amount.cents(), 2000);
    assert_eq!(summary.purchases.total_amount.cents(), 2500);
    assert_eq!(summary.purchases.transaction_count, 1);
    assert_eq!(summary.profit_loss.cents(), 3500);

    let empty = fx
        .db
        .transactions()
        .summary(&fx.business_id, Some(Utc::now() + ChronoDuration::days(1)), None)
        .await
        .unwrap();
    assert_eq!(empty.sales.transaction_count, 0);
    assert!(empty.profit_loss.is_zero());
}

#[tokio::test]
async fn test_details_include_counterparty_and_products() {
    let fx = seeded_ledger().await;
    let (all, _) = fx.db.transactions().list(&fx.business_id, &LedgerQuery::default()).await.unwrap();

    let details = fx
        .db
        .transactions()
        .get_details(&fx.business_id, &all[0].id)
        .await
        .unwrap()
        .unwrap();

    assert!(details.counterparty.is_some());
    assert_eq!(details.products.len(), 1);
    assert_eq!(details.products[0].name, "Rice");

    let missing = fx
        .db
        .transactions()
        .get_details(&Uuid::new_v4().to_string(), &all[0].id)
        .await
        .unwrap();
    assert!(missing.is_none());
}

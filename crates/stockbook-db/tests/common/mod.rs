//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::time::Duration;

use chrono::Utc;
use stockbook_core::{
    Contact, ContactType, LineRequest, PaymentMethod, PostingRequest, Product, TransactionType,
};
use stockbook_db::repository::contact::generate_contact_id;
use stockbook_db::repository::product::generate_product_id;
use stockbook_db::{Database, DbConfig, PostingEngine, RetryPolicy};
use tempfile::TempDir;
use uuid::Uuid;

pub struct Fixture {
    pub db: Database,
    pub engine: PostingEngine,
    pub business_id: String,
    pub customer: Contact,
    pub vendor: Contact,
}

impl Fixture {
    /// In-memory database with one customer and one vendor.
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::with_database(db, RetryPolicy::new(3, Duration::from_millis(1))).await
    }

    /// File-backed database with several connections and the shipped retry
    /// policy, for tests where writers really overlap.
    pub async fn file_backed(dir: &TempDir, file: &str) -> Self {
        let db = Database::new(DbConfig::new(dir.path().join(file)).max_connections(8))
            .await
            .unwrap();
        Self::with_database(db, RetryPolicy::default()).await
    }

    pub async fn with_database(db: Database, retry: RetryPolicy) -> Self {
        let business_id = Uuid::new_v4().to_string();
        let customer = contact(&business_id, "Ayesha Khan", "0300-1", ContactType::Customer);
        let vendor = contact(&business_id, "Metro Wholesale", "0300-2", ContactType::Vendor);
        db.contacts().insert(&customer).await.unwrap();
        db.contacts().insert(&vendor).await.unwrap();

        Fixture {
            engine: db.posting_engine(retry),
            db,
            business_id,
            customer,
            vendor,
        }
    }

    pub async fn add_product(&self, name: &str, stock: i64, min_stock_level: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            business_id: self.business_id.clone(),
            name: name.to_string(),
            description: None,
            sku: None,
            category: "Grocery".to_string(),
            price_cents: 500,
            stock,
            min_stock_level,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.db.products().insert(&product).await.unwrap();
        product
    }

    pub async fn product(&self, id: &str) -> Product {
        self.db
            .products()
            .get_by_id(&self.business_id, id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn stock_of(&self, id: &str) -> i64 {
        self.product(id).await.stock
    }

    pub async fn balance_of(&self, id: &str) -> i64 {
        self.db
            .contacts()
            .get_by_id(&self.business_id, id)
            .await
            .unwrap()
            .unwrap()
            .current_balance_cents
    }

    pub async fn ledger_count(&self) -> i64 {
        self.db.transactions().count(&self.business_id).await.unwrap()
    }

    pub fn sale(&self, lines: Vec<LineRequest>, payment_method: PaymentMethod) -> PostingRequest {
        PostingRequest {
            transaction_type: TransactionType::Sale,
            customer_id: Some(self.customer.id.clone()),
            vendor_id: None,
            lines,
            payment_method: Some(payment_method),
            notes: None,
        }
    }

    pub fn purchase(&self, lines: Vec<LineRequest>, payment_method: PaymentMethod) -> PostingRequest {
        PostingRequest {
            transaction_type: TransactionType::Purchase,
            customer_id: None,
            vendor_id: Some(self.vendor.id.clone()),
            lines,
            payment_method: Some(payment_method),
            notes: None,
        }
    }
}

pub fn contact(business_id: &str, name: &str, phone: &str, contact_type: ContactType) -> Contact {
    let now = Utc::now();
    Contact {
        id: generate_contact_id(),
        business_id: business_id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        contact_type,
        credit_limit_cents: 0,
        current_balance_cents: 0,
        is_active: true,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn line(product: &Product, quantity: i64, price_cents: i64) -> LineRequest {
    LineRequest {
        product_id: product.id.clone(),
        quantity,
        price_cents,
    }
}

//! # Product Repository
//!
//! Database operations for products (the Catalog store).
//!
//! ## Stock Writes Are Compare-And-Swap
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  read:   SELECT stock, version ... → stock=10, version=4           │
//! │  plan:   10 - 3 = 7   (pure, in stockbook-core)                    │
//! │  write:  UPDATE products SET stock = 7, version = version + 1      │
//! │          WHERE id = ? AND business_id = ? AND version = 4          │
//! │                                                                     │
//! │  rows_affected = 1 → we won                                        │
//! │  rows_affected = 0 → someone else wrote first → Conflict → retry   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The connection-level functions at the bottom of this file run on any
//! `SqliteConnection`, which is how the posting engine calls them inside
//! its storage transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::Product;

const PRODUCT_COLUMNS: &str = "id, business_id, name, description, sku, category, price_cents, \
     stock, min_stock_level, is_active, version, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.find_active(&business_id, &product_id).await?;
/// let low = repo.list_low_stock(&business_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Product>> {
        debug!(business_id = %business_id, id = %id, "Fetching product");

        let sql = format!(
            "SELECT {} FROM products WHERE id = ?1 AND business_id = ?2",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Resolves a product by id + business + active flag.
    pub async fn find_active(&self, business_id: &str, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut conn, business_id, id).await
    }

    /// Lists active products at or below their minimum stock level.
    ///
    /// Ordered by stock ascending so the emptiest shelves come first.
    pub async fn list_low_stock(&self, business_id: &str) -> DbResult<Vec<Product>> {
        debug!(business_id = %business_id, "Listing low-stock products");

        let sql = format!(
            "SELECT {} FROM products \
             WHERE business_id = ?1 AND is_active = 1 AND stock <= min_stock_level \
             ORDER BY stock ASC, name ASC",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Low-stock products found");
        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - SKU already exists for this business
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(name = %product.name, business_id = %product.business_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, name, description, sku, category,
                price_cents, stock, min_stock_level,
                is_active, version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.business_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.version)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical transaction lines keep referencing it.
    pub async fn deactivate(&self, business_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?3, version = version + 1
            WHERE id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(business_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products of a business.
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE business_id = ?1 AND is_active = 1",
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-Level Operations
// =============================================================================

/// Reads an active product in the caller's connection or transaction.
pub(crate) async fn fetch_active(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    debug!(business_id = %business_id, id = %id, "Resolving active product");

    let sql = format!(
        "SELECT {} FROM products WHERE id = ?1 AND business_id = ?2 AND is_active = 1",
        PRODUCT_COLUMNS
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(business_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Writes `new_stock` only if the row still carries `expected_version`.
///
/// ## Returns
/// * `Ok(())` - Written; version is now `expected_version + 1`
/// * `Err(DbError::Conflict)` - Version moved (or product deactivated) since the read
pub(crate) async fn compare_and_set_stock(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
    expected_version: i64,
    new_stock: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, expected_version, new_stock, "Compare-and-set stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = ?1, version = version + 1, updated_at = ?2
        WHERE id = ?3 AND business_id = ?4 AND version = ?5 AND is_active = 1
        "#,
    )
    .bind(new_stock)
    .bind(now)
    .bind(id)
    .bind(business_id)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("product", id));
    }

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(business_id: &str, stock: i64, min: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            business_id: business_id.to_string(),
            name: "Basmati Rice 5kg".to_string(),
            description: None,
            sku: None,
            category: "Grocery".to_string(),
            price_cents: 1850,
            stock,
            min_stock_level: min,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_active_is_business_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = product("biz-a", 5, 1);
        db.products().insert(&p).await.unwrap();

        assert!(db.products().find_active("biz-a", &p.id).await.unwrap().is_some());
        assert!(db.products().find_active("biz-b", &p.id).await.unwrap().is_none());

        db.products().deactivate("biz-a", &p.id).await.unwrap();
        assert!(db.products().find_active("biz-a", &p.id).await.unwrap().is_none());
        assert!(db.products().get_by_id("biz-a", &p.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_compare_and_set_stock_detects_stale_version() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = product("biz-a", 5, 1);
        db.products().insert(&p).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        compare_and_set_stock(&mut conn, "biz-a", &p.id, 0, 4, Utc::now())
            .await
            .unwrap();
        let stale = compare_and_set_stock(&mut conn, "biz-a", &p.id, 0, 3, Utc::now()).await;
        assert!(matches!(stale, Err(DbError::Conflict(_))));
        drop(conn);

        let stored = db.products().get_by_id("biz-a", &p.id).await.unwrap().unwrap();
        assert_eq!((stored.stock, stored.version), (4, 1));
    }

    #[tokio::test]
    async fn test_list_low_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let low = product("biz-a", 2, 2);
        let fine = product("biz-a", 9, 2);
        let other = product("biz-b", 0, 2);
        for p in [&low, &fine, &other] {
            db.products().insert(p).await.unwrap();
        }

        let listed = db.products().list_low_stock("biz-a").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, low.id);
        assert_eq!(db.products().count("biz-a").await.unwrap(), 2);
    }
}

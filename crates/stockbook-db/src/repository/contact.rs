//! # Contact Repository
//!
//! Database operations for customers and vendors (the Contact Directory).
//!
//! Like products, the running balance is only ever written through a
//! version compare-and-swap; see [`compare_and_set_balance`].

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::{Contact, ContactType};

const CONTACT_COLUMNS: &str = "id, business_id, name, phone, email, contact_type, \
     credit_limit_cents, current_balance_cents, is_active, version, created_at, updated_at";

/// Repository for contact database operations.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    /// Creates a new ContactRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ContactRepository { pool }
    }

    /// Gets a contact by its ID, active or not.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Contact>> {
        debug!(business_id = %business_id, id = %id, "Fetching contact");

        let sql = format!(
            "SELECT {} FROM contacts WHERE id = ?1 AND business_id = ?2",
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(contact)
    }

    /// Resolves an active contact of the expected type.
    ///
    /// A contact of the other type is reported as absent here; the posting
    /// engine uses [`fetch_active`] instead so it can tell the two apart.
    pub async fn find_active_of_type(
        &self,
        business_id: &str,
        id: &str,
        expected: ContactType,
    ) -> DbResult<Option<Contact>> {
        let mut conn = self.pool.acquire().await?;
        let contact = fetch_active(&mut conn, business_id, id).await?;
        Ok(contact.filter(|c| c.contact_type == expected))
    }

    /// Inserts a new contact.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - phone already used within this business
    pub async fn insert(&self, contact: &Contact) -> DbResult<()> {
        debug!(name = %contact.name, contact_type = %contact.contact_type, "Inserting contact");

        sqlx::query(
            r#"
            INSERT INTO contacts (
                id, business_id, name, phone, email, contact_type,
                credit_limit_cents, current_balance_cents,
                is_active, version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&contact.id)
        .bind(&contact.business_id)
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(contact.contact_type)
        .bind(contact.credit_limit_cents)
        .bind(contact.current_balance_cents)
        .bind(contact.is_active)
        .bind(contact.version)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-deletes a contact.
    pub async fn deactivate(&self, business_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating contact");

        let result = sqlx::query(
            r#"
            UPDATE contacts
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
            return Err(DbError::not_found("Contact", id));
        }

        Ok(())
    }

    /// Counts active contacts of a business.
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contacts WHERE business_id = ?1 AND is_active = 1",
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

/// Reads an active contact (any type) in the caller's connection or transaction.
pub(crate) async fn fetch_active(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Contact>> {
    debug!(business_id = %business_id, id = %id, "Resolving active contact");

    let sql = format!(
        "SELECT {} FROM contacts WHERE id = ?1 AND business_id = ?2 AND is_active = 1",
        CONTACT_COLUMNS
    );
    let contact = sqlx::query_as::<_, Contact>(&sql)
        .bind(id)
        .bind(business_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(contact)
}

/// Writes `new_balance_cents` only if the row still carries `expected_version`.
pub(crate) async fn compare_and_set_balance(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
    expected_version: i64,
    new_balance_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, expected_version, new_balance_cents, "Compare-and-set balance");

    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET current_balance_cents = ?1, version = version + 1, updated_at = ?2
        WHERE id = ?3 AND business_id = ?4 AND version = ?5 AND is_active = 1
        "#,
    )
    .bind(new_balance_cents)
    .bind(now)
    .bind(id)
    .bind(business_id)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("contact", id));
    }

    Ok(())
}

/// Helper to generate a new contact ID.
pub fn generate_contact_id() -> String {
    Uuid::new_v4().to_string()
}

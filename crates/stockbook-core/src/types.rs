//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │    Contact      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  business_id    │   │  type           │   │  business_id    │       │
//! │  │  price_cents    │◄──│  lines[]        │──►│  contact_type   │       │
//! │  │  stock          │   │  total_cents    │   │  balance_cents  │       │
//! │  │  version (CAS)  │   │  status         │   │  version (CAS)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionType │   │ TransactionStat │   │ PaymentMethod   │       │
//! │  │  Sale ─► cust.  │   │  Pending        │   │  Cash  Card     │       │
//! │  │  Purchase ─► v. │   │  Completed      │   │  BankTransfer   │       │
//! │  └─────────────────┘   │  Cancelled      │   │  Credit  Other  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenancy
//! Every record carries `business_id`. A lookup that ignores it is a bug:
//! records of another business are indistinguishable from absent ones.
//!
//! ## Versions
//! `Product::version` and `Contact::version` are bumped on every numeric
//! mutation and are the compare-and-swap token for concurrent writers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Transaction Type
// =============================================================================

/// Whether stock leaves (sale) or enters (purchase) the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
}

impl TransactionType {
    /// The only contact type this transaction type may reference.
    pub const fn expected_contact_type(&self) -> ContactType {
        match self {
            TransactionType::Sale => ContactType::Customer,
            TransactionType::Purchase => ContactType::Vendor,
        }
    }

    /// Returns the lowercase wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Purchase => "purchase",
        }
    }

    /// Success message for a newly recorded transaction of this type.
    pub const fn recorded_message(&self) -> &'static str {
        match self {
            TransactionType::Sale => "Sale recorded successfully",
            TransactionType::Purchase => "Purchase recorded successfully",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Contact Type
// =============================================================================

/// A contact is either a customer or a vendor, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Customer,
    Vendor,
}

impl ContactType {
    /// Returns the lowercase wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContactType::Customer => "customer",
            ContactType::Vendor => "vendor",
        }
    }

    /// Capitalized name for user-facing messages ("Customer not found").
    pub const fn title(&self) -> &'static str {
        match self {
            ContactType::Customer => "Customer",
            ContactType::Vendor => "Vendor",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle status of a transaction.
///
/// ## State Machine
/// ```text
///   ┌─────────┐   complete   ┌───────────┐
///   │ Pending │─────────────►│ Completed │ (initial)
///   └────┬────┘              └─────┬─────┘
///        │ cancel                  │ cancel
///        ▼                         ▼
///   ┌─────────────────────────────────────┐
///   │             Cancelled               │ (terminal)
///   └─────────────────────────────────────┘
/// ```
/// Status is metadata only: cancelling does not reverse stock or balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Completed
    }
}

impl TransactionStatus {
    /// Returns the lowercase wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    /// Whether moving from `self` to `next` is permitted.
    ///
    /// Identity transitions are always allowed (no-op).
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (*self, next),
            (Pending, Pending)
                | (Completed, Completed)
                | (Cancelled, Cancelled)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Completed, Cancelled)
        )
    }

    /// Validates a transition, returning the new status.
    pub fn transition_to(&self, next: TransactionStatus) -> CoreResult<TransactionStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    /// Sale on account: raises the customer's balance by the total.
    Credit,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business this product belongs to.
    pub business_id: String,

    /// Display name, snapshotted onto transaction lines.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit, unique per business when present.
    pub sku: Option<String>,

    pub category: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// `stock <= min_stock_level` flags the product as low stock.
    pub min_stock_level: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Compare-and-swap token, bumped on every stock change.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock_level
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Checks if `quantity` units can leave stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Contact
// =============================================================================

/// A customer or vendor with a running balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,

    pub business_id: String,

    pub name: String,

    /// Unique per business.
    pub phone: String,

    pub email: Option<String>,

    /// Customer or vendor. Immutable.
    #[serde(rename = "type")]
    pub contact_type: ContactType,

    pub credit_limit_cents: i64,

    /// Signed balance; positive means the contact owes the business.
    pub current_balance_cents: i64,

    pub is_active: bool,

    /// Compare-and-swap token, bumped on every balance change.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.current_balance_cents)
    }

    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents)
    }

    /// Display summary embedded in transaction responses.
    pub fn summary(&self) -> ContactSummary {
        ContactSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale or purchase.
///
/// Exactly one counterparty: `counterparty_id` refers to a customer when
/// `transaction_type` is `Sale` and to a vendor when it is `Purchase`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,

    pub business_id: String,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub counterparty_id: String,

    /// Counterparty name at posting time.
    pub counterparty_name: String,

    /// Always the sum of `lines[].line_total_cents`.
    pub total_amount_cents: i64,

    pub status: TransactionStatus,

    pub payment_method: PaymentMethod,

    pub notes: Option<String>,

    pub invoice_number: Option<String>,

    /// Posting date.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Ordered line items (stored in their own table).
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub lines: Vec<TransactionLine>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// The customer id, for sales.
    pub fn customer_id(&self) -> Option<&str> {
        match self.transaction_type {
            TransactionType::Sale => Some(&self.counterparty_id),
            TransactionType::Purchase => None,
        }
    }

    /// The vendor id, for purchases.
    pub fn vendor_id(&self) -> Option<&str> {
        match self.transaction_type {
            TransactionType::Purchase => Some(&self.counterparty_id),
            TransactionType::Sale => None,
        }
    }

    /// Number of line items.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Compact view used by listings.
    pub fn overview(&self) -> TransactionOverview {
        TransactionOverview {
            contact_name: self.counterparty_name.clone(),
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
        }
    }
}

/// A line item within a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub transaction_id: String,

    /// 0-based ordering within the transaction.
    pub position: i64,

    pub product_id: String,

    /// Product name at posting time.
    pub product_name: String,

    pub quantity: i64,

    pub unit_price_cents: i64,

    /// `quantity × unit_price_cents`, computed at posting time.
    pub line_total_cents: i64,
}

impl TransactionLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Display Summaries
// =============================================================================

/// Counterparty fields shown alongside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ContactSummary {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Product fields shown alongside a transaction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        ProductSummary {
            id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            category: product.category.clone(),
        }
    }
}

/// A transaction together with its counterparty and product summaries.
///
/// `counterparty` is `None` when the contact has since been removed;
/// `products` follows line order and skips products that no longer exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub counterparty: Option<ContactSummary>,
    pub products: Vec<ProductSummary>,
}

impl TransactionDetails {
    /// Looks up the summary for a line's product.
    pub fn product(&self, product_id: &str) -> Option<&ProductSummary> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

/// Per-transaction roll-up for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOverview {
    pub contact_name: String,
    pub item_count: usize,
    pub total_quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

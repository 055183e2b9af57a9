//! # Posting Module
//!
//! Pure half of the transaction-posting engine: request validation and the
//! posting plan. The database half (stockbook-db) reads records, feeds them
//! through [`PostingPlanner`] and writes the resulting [`PostingPlan`]
//! inside one storage transaction.
//!
//! ## Posting Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Posting a Transaction                            │
//! │                                                                         │
//! │  PostingRequest ──validate()──► ValidatedPosting                       │
//! │                                     │                                   │
//! │           contact (db read) ──► PostingPlanner::new   (TypeMismatch)   │
//! │                                     │                                   │
//! │  for each line, in order:                                               │
//! │           product (db read) ──► add_line             (InsufficientStock)│
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                                PostingPlan                              │
//! │                  ┌──────────────────┼──────────────────┐                │
//! │                  ▼                  ▼                  ▼                │
//! │          stock_changes[]      lines + total     balance_change?        │
//! │          (CAS per product)    (ledger row)      (credit sales only)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches storage, so a rejected plan has nothing to undo.
//! Totals are always recomputed from lines; a client-supplied total never
//! reaches this module.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    Contact, ContactType, PaymentMethod, Product, Transaction, TransactionLine,
    TransactionStatus, TransactionType,
};
use crate::validation::{
    validate_id, validate_line_count, validate_notes, validate_price_cents, validate_quantity,
};

// =============================================================================
// Request
// =============================================================================

/// One requested line: a product, how many, at what unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
    pub price_cents: i64,
}

/// A caller's request to record a sale or purchase.
#[derive(Debug, Clone)]
pub struct PostingRequest {
    pub transaction_type: TransactionType,
    pub customer_id: Option<String>,
    pub vendor_id: Option<String>,
    pub lines: Vec<LineRequest>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// A request that passed every check that needs no stored data.
#[derive(Debug, Clone)]
pub struct ValidatedPosting {
    pub transaction_type: TransactionType,
    pub counterparty_id: String,
    pub lines: Vec<LineRequest>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl PostingRequest {
    /// Validates the request shape.
    ///
    /// ## Counterparty Rules
    /// | type     | customerId | vendorId | result                    |
    /// |----------|------------|----------|---------------------------|
    /// | sale     | set        | -        | ok                        |
    /// | sale     | -          | set      | TypeMismatch              |
    /// | purchase | -          | set      | ok                        |
    /// | purchase | set        | -        | TypeMismatch              |
    /// | any      | set        | set      | Validation (conflicting)  |
    /// | any      | -          | -        | Validation (required)     |
    pub fn validate(self) -> CoreResult<ValidatedPosting> {
        let counterparty_id = self.resolve_counterparty_id()?;
        validate_id(counterparty_field(self.transaction_type), &counterparty_id)?;

        validate_line_count(self.lines.len())?;
        for line in &self.lines {
            validate_id("productId", &line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_price_cents(line.price_cents)?;
        }

        let notes = match self.notes {
            Some(notes) if notes.trim().is_empty() => None,
            Some(notes) => {
                validate_notes(&notes)?;
                Some(notes)
            }
            None => None,
        };

        Ok(ValidatedPosting {
            transaction_type: self.transaction_type,
            counterparty_id,
            lines: self.lines,
            payment_method: self.payment_method.unwrap_or_default(),
            notes,
        })
    }

    fn resolve_counterparty_id(&self) -> CoreResult<String> {
        let customer = non_blank(&self.customer_id);
        let vendor = non_blank(&self.vendor_id);

        match (self.transaction_type, customer, vendor) {
            (_, Some(_), Some(_)) => Err(ValidationError::Conflicting {
                first: "customerId".to_string(),
                second: "vendorId".to_string(),
            }
            .into()),
            (TransactionType::Sale, Some(id), None) | (TransactionType::Purchase, None, Some(id)) => {
                Ok(id.to_string())
            }
            (TransactionType::Sale, None, Some(_)) => Err(CoreError::TypeMismatch {
                transaction_type: TransactionType::Sale,
                expected: ContactType::Customer,
                found: ContactType::Vendor,
            }),
            (TransactionType::Purchase, Some(_), None) => Err(CoreError::TypeMismatch {
                transaction_type: TransactionType::Purchase,
                expected: ContactType::Vendor,
                found: ContactType::Customer,
            }),
            (transaction_type, None, None) => Err(ValidationError::Required {
                field: counterparty_field(transaction_type).to_string(),
            }
            .into()),
        }
    }
}

fn counterparty_field(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Sale => "customerId",
        TransactionType::Purchase => "vendorId",
    }
}

// =============================================================================
// Plan
// =============================================================================

/// A priced line with its name snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// The stock write for one product, guarded by the version that was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: String,
    pub expected_version: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
}

/// The balance write for the counterparty, guarded by its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub contact_id: String,
    pub expected_version: i64,
    pub previous: Money,
    pub new: Money,
}

/// Everything a post will write, computed before anything is written.
#[derive(Debug, Clone)]
pub struct PostingPlan {
    pub transaction_type: TransactionType,
    pub counterparty_id: String,
    pub counterparty_name: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub lines: Vec<PlannedLine>,
    /// One entry per distinct product, in first-seen line order.
    pub stock_changes: Vec<StockChange>,
    pub total: Money,
    pub balance_change: Option<BalanceChange>,
}

impl PostingPlan {
    /// Builds the ledger record for this plan.
    pub fn to_transaction(
        &self,
        id: String,
        business_id: &str,
        now: DateTime<Utc>,
    ) -> Transaction {
        let lines = self
            .lines
            .iter()
            .enumerate()
            .map(|(position, line)| TransactionLine {
                transaction_id: id.clone(),
                position: position as i64,
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                line_total_cents: line.line_total.cents(),
            })
            .collect();

        Transaction {
            id,
            business_id: business_id.to_string(),
            transaction_type: self.transaction_type,
            counterparty_id: self.counterparty_id.clone(),
            counterparty_name: self.counterparty_name.clone(),
            total_amount_cents: self.total.cents(),
            status: TransactionStatus::default(),
            payment_method: self.payment_method,
            notes: self.notes.clone(),
            invoice_number: None,
            date: now,
            created_at: now,
            updated_at: now,
            lines,
        }
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Accumulates lines into a [`PostingPlan`].
///
/// Stock is tracked per product across lines, so two lines for the same
/// product are checked against the running remainder, not the stored value
/// twice.
///
/// ## Usage
/// ```rust,ignore
/// let mut planner = PostingPlanner::new(&validated, &contact)?;
/// for line in &validated.lines {
///     let product = find_active_product(&line.product_id).await?;
///     planner.add_line(line, &product)?;
/// }
/// let plan = planner.finish()?;
/// ```
#[derive(Debug)]
pub struct PostingPlanner<'a> {
    posting: &'a ValidatedPosting,
    contact_id: String,
    contact_name: String,
    contact_version: i64,
    contact_balance: Money,
    lines: Vec<PlannedLine>,
    stock_changes: Vec<StockChange>,
    total: Money,
}

impl<'a> PostingPlanner<'a> {
    /// Starts a plan against a resolved counterparty.
    ///
    /// Fails with `TypeMismatch` when the contact is of the wrong kind.
    pub fn new(posting: &'a ValidatedPosting, contact: &Contact) -> CoreResult<Self> {
        let expected = posting.transaction_type.expected_contact_type();
        if contact.contact_type != expected {
            return Err(CoreError::TypeMismatch {
                transaction_type: posting.transaction_type,
                expected,
                found: contact.contact_type,
            });
        }

        Ok(PostingPlanner {
            posting,
            contact_id: contact.id.clone(),
            contact_name: contact.name.clone(),
            contact_version: contact.version,
            contact_balance: contact.balance(),
            lines: Vec::with_capacity(posting.lines.len()),
            stock_changes: Vec::new(),
            total: Money::zero(),
        })
    }

    /// Prices one line and applies its stock delta to the running stock.
    pub fn add_line(&mut self, line: &LineRequest, product: &Product) -> CoreResult<()> {
        let index = self
            .stock_changes
            .iter()
            .position(|change| change.product_id == product.id);
        let available = match index {
            Some(i) => self.stock_changes[i].new_stock,
            None => product.stock,
        };

        let new_stock = match self.posting.transaction_type {
            TransactionType::Sale => {
                if available < line.quantity {
                    return Err(CoreError::InsufficientStock {
                        product_name: product.name.clone(),
                        available,
                        requested: line.quantity,
                    });
                }
                available - line.quantity
            }
            TransactionType::Purchase => available
                .checked_add(line.quantity)
                .ok_or_else(|| out_of_range("stock"))?,
        };

        let unit_price = Money::from_cents(line.price_cents);
        let line_total = unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| out_of_range("price"))?;
        self.total = self
            .total
            .checked_add(line_total)
            .ok_or_else(|| out_of_range("totalAmount"))?;

        match index {
            Some(i) => self.stock_changes[i].new_stock = new_stock,
            None => self.stock_changes.push(StockChange {
                product_id: product.id.clone(),
                expected_version: product.version,
                previous_stock: product.stock,
                new_stock,
            }),
        }

        self.lines.push(PlannedLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price,
            line_total,
        });

        Ok(())
    }

    /// Completes the plan.
    ///
    /// A credit sale adds the grand total to the customer's balance; every
    /// other combination leaves the balance untouched.
    pub fn finish(self) -> CoreResult<PostingPlan> {
        let balance_change = match (self.posting.transaction_type, self.posting.payment_method) {
            (TransactionType::Sale, PaymentMethod::Credit) => {
                let new = self
                    .contact_balance
                    .checked_add(self.total)
                    .ok_or_else(|| out_of_range("currentBalance"))?;
                Some(BalanceChange {
                    contact_id: self.contact_id.clone(),
                    expected_version: self.contact_version,
                    previous: self.contact_balance,
                    new,
                })
            }
            _ => None,
        };

        Ok(PostingPlan {
            transaction_type: self.posting.transaction_type,
            counterparty_id: self.contact_id,
            counterparty_name: self.contact_name,
            payment_method: self.posting.payment_method,
            notes: self.posting.notes.clone(),
            lines: self.lines,
            stock_changes: self.stock_changes,
            total: self.total,
            balance_change,
        })
    }
}

fn out_of_range(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Wire types: request bodies in, views out.
//!
//! Amounts arrive as JSON numbers in major units and are parsed exactly
//! into cents from their textual form. Views render cents back as major
//! units for display only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use stockbook_core::report::parse_date_param;
use stockbook_core::{
    BalanceAdjustment, BalanceOperation, Contact, ContactSummary, ContactType, LedgerQuery,
    LedgerSummary, LineRequest, Money, PaymentMethod, PostingRequest, Product, ProductSummary,
    StockAdjustment, StockOperation, Transaction, TransactionDetails, TransactionOverview,
    TransactionStatus, TransactionType, TypeSummary, ValidationError,
};

// =============================================================================
// Number Parsing
// =============================================================================

/// Parses a JSON number into money, rejecting more than two decimals.
pub fn parse_amount(field: &str, value: &Number) -> Result<Money, ValidationError> {
    Money::parse_decimal(&value.to_string()).map_err(|err| match err {
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason,
        },
        other => other,
    })
}

fn parse_whole(field: &str, value: &Number) -> Result<i64, ValidationError> {
    value.as_i64().ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a whole number".to_string(),
    })
}

fn amount(money: Money) -> f64 {
    money.to_major_f64()
}

// =============================================================================
// Requests
// =============================================================================

/// `POST /api/transactions` body. Client totals are not read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionBody {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub customer_id: Option<String>,
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub products: Vec<LineBody>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBody {
    pub product_id: String,
    pub quantity: Number,
    pub price: Number,
}

impl CreateTransactionBody {
    pub fn into_request(self) -> Result<PostingRequest, ValidationError> {
        let lines = self
            .products
            .into_iter()
            .map(|line| {
                Ok(LineRequest {
                    quantity: parse_whole("quantity", &line.quantity)?,
                    price_cents: parse_amount("price", &line.price)?.cents(),
                    product_id: line.product_id,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(PostingRequest {
            transaction_type: self.transaction_type,
            customer_id: self.customer_id,
            vendor_id: self.vendor_id,
            lines,
            payment_method: self.payment_method,
            notes: self.notes,
        })
    }
}

/// `PATCH /api/transactions/{id}/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: TransactionStatus,
}

/// `PATCH /api/products/{id}/stock` body.
#[derive(Debug, Deserialize)]
pub struct StockBody {
    pub quantity: Number,
    #[serde(default)]
    pub operation: StockOperation,
}

impl StockBody {
    pub fn quantity(&self) -> Result<i64, ValidationError> {
        parse_whole("quantity", &self.quantity)
    }
}

/// `PATCH /api/contacts/{id}/balance` body.
#[derive(Debug, Deserialize)]
pub struct BalanceBody {
    pub amount: Number,
    #[serde(default)]
    pub operation: BalanceOperation,
}

impl BalanceBody {
    pub fn amount(&self) -> Result<Money, ValidationError> {
        parse_amount("amount", &self.amount)
    }
}

/// `GET /api/transactions` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub contact_id: Option<String>,
    pub status: Option<TransactionStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn into_query(self) -> Result<LedgerQuery, ValidationError> {
        let defaults = LedgerQuery::default();
        let query = LedgerQuery {
            transaction_type: self.transaction_type,
            start: parse_optional_date("startDate", self.start_date.as_deref())?,
            end: parse_optional_date("endDate", self.end_date.as_deref())?,
            counterparty_id: self.contact_id.filter(|id| !id.trim().is_empty()),
            status: self.status,
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        };
        query.validate()?;
        Ok(query)
    }
}

/// `GET /api/transactions/summary` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SummaryParams {
    pub fn range(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ValidationError> {
        Ok((
            parse_optional_date("startDate", self.start_date.as_deref())?,
            parse_optional_date("endDate", self.end_date.as_deref())?,
        ))
    }
}

fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_date_param(field, value).map(Some),
        None => Ok(None),
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub customer_id: Option<String>,
    pub vendor_id: Option<String>,
    /// Populated on single-record reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<ContactSummary>,
    pub products: Vec<LineView>,
    pub total_amount: f64,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub invoice_number: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary: TransactionOverview,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
}

impl TransactionView {
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self::build(transaction, None, &[])
    }

    pub fn from_details(details: &TransactionDetails) -> Self {
        Self::build(
            &details.transaction,
            details.counterparty.clone(),
            &details.products,
        )
    }

    fn build(
        transaction: &Transaction,
        counterparty: Option<ContactSummary>,
        products: &[ProductSummary],
    ) -> Self {
        let lines = transaction
            .lines
            .iter()
            .map(|line| LineView {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                product: products.iter().find(|p| p.id == line.product_id).cloned(),
                quantity: line.quantity,
                price: amount(line.unit_price()),
                total: amount(line.line_total()),
            })
            .collect();

        TransactionView {
            id: transaction.id.clone(),
            transaction_type: transaction.transaction_type,
            customer_id: transaction.customer_id().map(str::to_string),
            vendor_id: transaction.vendor_id().map(str::to_string),
            counterparty,
            products: lines,
            total_amount: amount(transaction.total()),
            status: transaction.status,
            payment_method: transaction.payment_method,
            notes: transaction.notes.clone(),
            invoice_number: transaction.invoice_number.clone(),
            date: transaction.date,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
            summary: transaction.overview(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub min_stock_level: i64,
    pub is_low_stock: bool,
    pub is_out_of_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        ProductView {
            id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            category: product.category.clone(),
            price: amount(product.price()),
            stock: product.stock,
            min_stock_level: product.min_stock_level,
            is_low_stock: product.is_low_stock(),
            is_out_of_stock: product.is_out_of_stock(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub credit_limit: f64,
    pub current_balance: f64,
}

impl From<&Contact> for ContactView {
    fn from(contact: &Contact) -> Self {
        ContactView {
            id: contact.id.clone(),
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            contact_type: contact.contact_type,
            credit_limit: amount(contact.credit_limit()),
            current_balance: amount(contact.balance()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentView {
    pub product: Option<ProductView>,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub operation: StockOperation,
}

impl StockAdjustmentView {
    pub fn new(adjustment: StockAdjustment, product: Option<&Product>) -> Self {
        StockAdjustmentView {
            product: product.map(ProductView::from),
            previous_stock: adjustment.previous_stock,
            new_stock: adjustment.new_stock,
            operation: adjustment.operation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAdjustmentView {
    pub contact: Option<ContactView>,
    pub previous_balance: f64,
    pub new_balance: f64,
    pub operation: BalanceOperation,
}

impl BalanceAdjustmentView {
    pub fn new(adjustment: BalanceAdjustment, contact: Option<&Contact>) -> Self {
        BalanceAdjustmentView {
            contact: contact.map(ContactView::from),
            previous_balance: amount(adjustment.previous_balance),
            new_balance: amount(adjustment.new_balance),
            operation: adjustment.operation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSummaryView {
    pub total_amount: f64,
    pub transaction_count: i64,
    pub average_amount: f64,
}

impl From<TypeSummary> for TypeSummaryView {
    fn from(summary: TypeSummary) -> Self {
        TypeSummaryView {
            total_amount: amount(summary.total_amount),
            transaction_count: summary.transaction_count,
            average_amount: amount(summary.average_amount),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub sales: TypeSummaryView,
    pub purchases: TypeSummaryView,
    pub profit_loss: f64,
}

impl From<LedgerSummary> for SummaryView {
    fn from(summary: LedgerSummary) -> Self {
        SummaryView {
            sales: summary.sales.into(),
            purchases: summary.purchases.into(),
            profit_loss: amount(summary.profit_loss),
        }
    }
}

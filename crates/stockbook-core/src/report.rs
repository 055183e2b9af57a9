//! # Reporting Module
//!
//! Read-side helpers for the transaction ledger: range-query filters,
//! pagination math, and the sales/purchases summary. Never mutates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{TransactionStatus, TransactionType};

/// Default page size for ledger listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Ledger Query
// =============================================================================

/// Filters for the ledger range query. Every filter is optional; the
/// business scope is always applied by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerQuery {
    pub transaction_type: Option<TransactionType>,
    /// Inclusive lower bound on the posting date.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the posting date.
    pub end: Option<DateTime<Utc>>,
    /// Matches the customer of a sale or the vendor of a purchase.
    pub counterparty_id: Option<String>,
    pub status: Option<TransactionStatus>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for LedgerQuery {
    fn default() -> Self {
        LedgerQuery {
            transaction_type: None,
            start: None,
            end: None,
            counterparty_id: None,
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LedgerQuery {
    /// Checks paging bounds and date-range ordering.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
                requirement: "at least 1".to_string(),
            });
        }
        if self.limit < 1 || self.limit > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_SIZE as i64,
            });
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ValidationError::InvalidFormat {
                    field: "endDate".to_string(),
                    reason: "must not be before startDate".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Rows to skip for the requested page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }
}

/// Parses a date filter: RFC 3339 timestamps, or a bare `YYYY-MM-DD`
/// which means midnight UTC of that day.
pub fn parse_date_param(field: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a date (YYYY-MM-DD) or RFC 3339 timestamp".to_string(),
        })
}

// =============================================================================
// Pagination
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: i64,
    pub limit: u32,
}

impl Pagination {
    pub fn new(query: &LedgerQuery, total: i64) -> Self {
        let limit = i64::from(query.limit.max(1));
        let pages = (total.max(0) + limit - 1) / limit;
        Pagination {
            current: query.page,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
            total,
            limit: query.limit,
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Aggregate over one transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSummary {
    pub total_amount: Money,
    pub transaction_count: i64,
    /// Rounded to the nearest cent, halves away from zero.
    pub average_amount: Money,
}

impl TypeSummary {
    pub fn new(total_amount: Money, transaction_count: i64) -> Self {
        let average_amount = if transaction_count > 0 {
            let total = i128::from(total_amount.cents());
            let count = i128::from(transaction_count);
            let rounded = (2 * total + total.signum() * count) / (2 * count);
            Money::from_cents(rounded as i64)
        } else {
            Money::zero()
        };

        TypeSummary {
            total_amount,
            transaction_count,
            average_amount,
        }
    }
}

/// Sales vs. purchases over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub sales: TypeSummary,
    pub purchases: TypeSummary,
    /// `sales.total_amount - purchases.total_amount`
    pub profit_loss: Money,
}

impl LedgerSummary {
    /// Builds the summary from grouped `(type, total_cents, count)` rows.
    /// A type with no rows reports zeros.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (TransactionType, i64, i64)>,
    {
        let mut summary = LedgerSummary::default();
        for (transaction_type, total_cents, count) in groups {
            let entry = TypeSummary::new(Money::from_cents(total_cents), count);
            match transaction_type {
                TransactionType::Sale => summary.sales = entry,
                TransactionType::Purchase => summary.purchases = entry,
            }
        }
        summary.profit_loss = summary.sales.total_amount - summary.purchases.total_amount;
        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

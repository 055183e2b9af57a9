//! # Adjustment Module
//!
//! Narrow numeric corrections made outside of posting.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │              Stock vs. Balance adjustment policy                 │
//! │                                                                  │
//! │   operation   stock (i64, >= 0)          balance (Money, signed) │
//! │   ─────────   ───────────────────────    ─────────────────────── │
//! │   set         stock = q                  balance = a             │
//! │   add         stock + q                  balance + a             │
//! │   subtract    max(0, stock - q)          balance - a  (no floor) │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The zero floor on stock subtraction exists only here. Posting a sale
//! that exceeds stock is rejected with `InsufficientStock`, never clamped.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_adjust_quantity;

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    #[default]
    Set,
    Add,
    Subtract,
}

impl StockOperation {
    /// Applies the operation to `current`, flooring subtraction at zero.
    pub fn apply(&self, current: i64, quantity: i64) -> CoreResult<i64> {
        validate_adjust_quantity(quantity)?;

        let next = match self {
            StockOperation::Set => Some(quantity),
            StockOperation::Add => current.checked_add(quantity),
            StockOperation::Subtract => Some(current.saturating_sub(quantity).max(0)),
        };

        next.ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into()
        })
    }
}

/// Outcome of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub previous_stock: i64,
    pub new_stock: i64,
    pub operation: StockOperation,
}

// =============================================================================
// Balance
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BalanceOperation {
    #[default]
    Set,
    Add,
    Subtract,
}

impl BalanceOperation {
    /// Applies the operation to `current`. The result may be negative.
    pub fn apply(&self, current: Money, amount: Money) -> CoreResult<Money> {
        let next = match self {
            BalanceOperation::Set => Some(amount),
            BalanceOperation::Add => current.checked_add(amount),
            BalanceOperation::Subtract => current
                .cents()
                .checked_sub(amount.cents())
                .map(Money::from_cents),
        };

        next.ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: i64::MIN,
                max: i64::MAX,
            }
            .into()
        })
    }
}

/// Outcome of a balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAdjustment {
    pub previous_balance: Money,
    pub new_balance: Money,
    pub operation: BalanceOperation,
}

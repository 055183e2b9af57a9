//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! This crate holds every business rule of the inventory ledger as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockbook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    POST /api/transactions, PATCH .../stock, PATCH .../balance   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               stockbook-db (posting engine, SQLite)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ stockbook-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  money   │ │ posting  │ │ validation       │  │   │
//! │  │   │ Product  │ │  Money   │ │ Planner  │ │ adjustment       │  │   │
//! │  │   │ Contact  │ │          │ │ Plan     │ │ report           │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Contact, Transaction, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//! - [`posting`] - Posting request validation and the posting plan
//! - [`adjustment`] - Stock and balance adjustment policies
//! - [`report`] - Ledger query filters and summary aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockbook_core::money::Money;
//!
//! let price = Money::parse_decimal("12.50").unwrap();
//! let line_total = price.checked_multiply_quantity(4).unwrap();
//! assert_eq!(line_total.cents(), 5000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adjustment;
pub mod error;
pub mod money;
pub mod posting;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use adjustment::{BalanceAdjustment, BalanceOperation, StockAdjustment, StockOperation};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use posting::{
    BalanceChange, LineRequest, PlannedLine, PostingPlan, PostingPlanner, PostingRequest,
    StockChange, ValidatedPosting,
};
pub use report::{LedgerQuery, LedgerSummary, Pagination, TypeSummary};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted in a single transaction.
///
/// Keeps a post bounded: every line is one product read and one stock write
/// inside the atomic unit.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 1_000_000;

/// Maximum length of transaction notes, in characters.
pub const MAX_NOTES_LENGTH: usize = 500;

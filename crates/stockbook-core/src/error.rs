//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockbook-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── PostingError     - Rejected / contended / storage failure         │
//! │                                                                         │
//! │  HTTP errors (in apps/api)                                             │
//! │  └── ApiError         - What the client sees {success, message}        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PostingError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, ID, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every variant is a full abort: nothing is recovered locally

use thiserror::Error;

use crate::types::{ContactType, TransactionStatus, TransactionType};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections.
///
/// Each variant is terminal for the request that produced it. The HTTP layer
/// maps variants to status codes; this crate never does.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product belongs to another business
    /// - Product was deactivated (soft delete)
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The referenced customer or vendor cannot be resolved.
    ///
    /// ## When This Occurs
    /// - Contact ID doesn't exist, belongs to another business, or is inactive
    #[error("{} not found", contact_type.title())]
    CounterpartyNotFound { contact_type: ContactType, id: String },

    /// The counterparty's type does not match the transaction type.
    ///
    /// ## When This Occurs
    /// - A sale that names a vendor (by `vendorId` or by pointing
    ///   `customerId` at a vendor record)
    /// - A purchase that names a customer
    #[error("A {transaction_type} requires a {expected}, got a {found}")]
    TypeMismatch {
        transaction_type: TransactionType,
        expected: ContactType,
        found: ContactType,
    },

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// POST sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Rice", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400 "Insufficient stock for product Rice. Available: 3, Requested: 5"
    /// ```
    #[error("Insufficient stock for product {product_name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Transaction not found (or not visible to this business).
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Contact not found outside of posting (balance adjustment).
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    /// Status change not permitted by the status state machine.
    #[error("Cannot change transaction status from {from} to {to}")]
    InvalidStatusTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "could not resolve a record" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::CounterpartyNotFound { .. }
                | CoreError::TransactionNotFound(_)
                | CoreError::ContactNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Raised before any record is read, so they never mutate anything.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} cannot exceed {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive (or non-negative, as the message says).
    #[error("{field} must be {requirement}")]
    MustBePositive { field: String, requirement: String },

    /// Invalid format (e.g., invalid UUID, invalid date, malformed amount).
    #[error("{field} {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not one of the allowed options.
    #[error("{field} must be one of: {allowed}")]
    NotAllowed { field: String, allowed: String },

    /// A list that needs at least one entry was empty.
    #[error("At least one {field} is required")]
    EmptyList { field: String },

    /// Two fields were supplied together that exclude each other.
    #[error("{first} and {second} cannot both be provided")]
    Conflicting { first: String, second: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_names_everything() {
        let err = CoreError::InsufficientStock {
            product_name: "Rice 5kg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product Rice 5kg. Available: 3, Requested: 5"
        );
    }

    #[test]
    fn test_counterparty_not_found_message() {
        let err = CoreError::CounterpartyNotFound {
            contact_type: ContactType::Vendor,
            id: "v-1".to_string(),
        };
        assert_eq!(err.to_string(), "Vendor not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = CoreError::TypeMismatch {
            transaction_type: TransactionType::Sale,
            expected: ContactType::Customer,
            found: ContactType::Vendor,
        };
        assert_eq!(err.to_string(), "A sale requires a customer, got a vendor");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_validation_error_passes_message_through() {
        let err: CoreError = ValidationError::EmptyList {
            field: "product".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "At least one product is required");
    }
}

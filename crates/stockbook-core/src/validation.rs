//! # Validation Module
//!
//! Input validation utilities for Stockbook.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/api)                                      │
//! │  ├── JSON shape (deserialization)                                      │
//! │  └── Exact decimal parsing of prices and amounts                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called from PostingRequest::validate)           │
//! │  ├── Identifiers, quantities, prices, notes, list sizes                │
//! │  └── Runs before any record is read                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity >= 1)                         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockbook_core::validation::{validate_quantity, validate_notes};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_notes(&"x".repeat(501)).is_err());
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS, MAX_NOTES_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a record identifier (UUID).
///
/// Malformed ids are a validation failure rather than a "not found", so a
/// typo never looks like a missing record.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - At least 1
/// - At most MAX_ITEM_QUANTITY
///
/// ## Example
/// ```rust
/// use stockbook_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-1).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
            requirement: "at least 1".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents (zero is allowed).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
            requirement: "non-negative".to_string(),
        });
    }
    Ok(())
}

/// Validates the quantity given to a stock adjustment (zero is allowed).
pub fn validate_adjust_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
            requirement: "non-negative".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Text & Collection Validators
// =============================================================================

/// Validates free-form transaction notes.
///
/// Length is counted in characters, not bytes.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }
    Ok(())
}

/// Validates the number of line items in a request.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::EmptyList {
            field: "product".to_string(),
        });
    }

    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "products".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("productId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(matches!(
            validate_id("productId", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_id("productId", "not-a-uuid"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1299).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_adjust_quantity_allows_zero() {
        assert!(validate_adjust_quantity(0).is_ok());
        assert!(validate_adjust_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_notes_counts_chars() {
        assert!(validate_notes(&"é".repeat(MAX_NOTES_LENGTH)).is_ok());
        assert!(validate_notes(&"a".repeat(MAX_NOTES_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        let err = validate_line_count(0).unwrap_err();
        assert_eq!(err.to_string(), "At least one product is required");
        assert!(validate_line_count(MAX_LINE_ITEMS).is_ok());
        assert!(validate_line_count(MAX_LINE_ITEMS + 1).is_err());
    }
}

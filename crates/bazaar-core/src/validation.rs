//! # Validation Module
//!
//! Input validation utilities for the pricing engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront (TypeScript)                                      │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (Rust)                                           │
//! │  └── Business rule validation before any logic runs                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (value > 0, quantity > 0)                       │
//! │  ├── UNIQUE constraints (code, order/invoice numbers)                  │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::CouponType;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Coupon Validators
// =============================================================================

/// Validates a coupon code and returns its canonical (trimmed, uppercased)
/// form.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Only letters, numbers, hyphens, and underscores
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_coupon_code;
///
/// assert_eq!(validate_coupon_code(" summer10 ").unwrap(), "SUMMER10");
/// assert!(validate_coupon_code("").is_err());
/// assert!(validate_coupon_code("HAS SPACE").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_uppercase())
}

/// Validates a coupon's value against its type.
///
/// ## Rules
/// - Percentage: 1 to 10000 basis points (0.01% to 100%)
/// - Fixed: at least 1 cent
pub fn validate_coupon_value(coupon_type: CouponType, value: i64) -> ValidationResult<()> {
    match coupon_type {
        CouponType::Percentage => {
            if !(1..=10_000).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 1,
                    max: 10_000,
                });
            }
        }
        CouponType::Fixed => {
            if value < 1 {
                return Err(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a coupon's date window.
///
/// `end_date`, when present, must be strictly after `start_date`.
pub fn validate_date_window(
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let Some(end) = end_date {
        if end <= start_date {
            return Err(ValidationError::InvalidDateWindow);
        }
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
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

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_coupon_code() {
        assert_eq!(validate_coupon_code("SUMMER10").unwrap(), "SUMMER10");
        assert_eq!(validate_coupon_code("  ten_off  ").unwrap(), "TEN_OFF");
        assert_eq!(validate_coupon_code("BOGO-2026").unwrap(), "BOGO-2026");

        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("   ").is_err());
        assert!(validate_coupon_code("HAS SPACE").is_err());
        assert!(validate_coupon_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_coupon_value() {
        assert!(validate_coupon_value(CouponType::Percentage, 1).is_ok());
        assert!(validate_coupon_value(CouponType::Percentage, 10_000).is_ok());
        assert!(validate_coupon_value(CouponType::Percentage, 0).is_err());
        assert!(validate_coupon_value(CouponType::Percentage, 10_001).is_err());

        assert!(validate_coupon_value(CouponType::Fixed, 1).is_ok());
        assert!(validate_coupon_value(CouponType::Fixed, 5_000_000).is_ok());
        assert!(validate_coupon_value(CouponType::Fixed, 0).is_err());
        assert!(validate_coupon_value(CouponType::Fixed, -100).is_err());
    }

    #[test]
    fn test_validate_date_window() {
        let now = Utc::now();
        assert!(validate_date_window(now, None).is_ok());
        assert!(validate_date_window(now, Some(now + Duration::days(7))).is_ok());
        assert!(validate_date_window(now, Some(now)).is_err());
        assert!(validate_date_window(now, Some(now - Duration::days(1))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(825).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}

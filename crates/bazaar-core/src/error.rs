//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Coupon / pricing / cart rule violations        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - What the checkout boundary surfaces            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → API caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (coupon code, limits, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each coupon rejection maps to a distinct, user-displayable reason

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Coupon Rejection Reason
// =============================================================================

/// Why a coupon that exists cannot be applied right now.
///
/// Carried inside [`CoreError::CouponNotApplicable`] so the storefront can
/// show the customer the precise reason instead of a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    /// Merchant disabled the coupon (soft retirement).
    #[error("coupon is no longer active")]
    Inactive,

    /// `now` is before the coupon's start date.
    #[error("coupon is not active yet")]
    NotYetStarted,

    /// `now` is after the coupon's end date.
    #[error("coupon has expired")]
    Expired,

    /// `used_count` has reached `usage_limit`.
    #[error("coupon redemption limit has been reached")]
    Exhausted,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The four coupon variants are recoverable at the cart/checkout boundary
/// and must reach the caller intact; `PricingInvariantViolation` is a bug
/// indicator and aborts the operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Coupon code does not resolve to any record.
    ///
    /// ## When This Occurs
    /// - Customer typed a code that was never issued
    /// - Coupon was hard-deleted by the merchant
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Coupon exists but fails the validity check.
    ///
    /// ## User Workflow
    /// ```text
    /// Apply "SUMMER10"
    ///      │
    ///      ▼
    /// is_valid() → false (expired)
    ///      │
    ///      ▼
    /// CouponNotApplicable { code: "SUMMER10", reason: Expired }
    ///      │
    ///      ▼
    /// UI shows: "coupon has expired"
    /// ```
    #[error("Coupon {code} cannot be applied: {reason}")]
    CouponNotApplicable {
        code: String,
        reason: CouponRejection,
    },

    /// Cart subtotal is below the coupon's minimum purchase requirement.
    #[error(
        "Coupon {code} requires a minimum purchase of {min_purchase_cents} cents, cart subtotal is {subtotal_cents} cents"
    )]
    CouponBelowMinimumPurchase {
        code: String,
        min_purchase_cents: i64,
        subtotal_cents: i64,
    },

    /// Customer has already redeemed this coupon the maximum number of times.
    #[error("Coupon {code} has already been used {limit} time(s) by this customer")]
    CouponPerCustomerLimitExceeded { code: String, limit: i64 },

    /// The additive identity `total == subtotal - discount + tax + shipping`
    /// failed after computation.
    ///
    /// ## When This Occurs
    /// Never, unless there is a bug in the pricing pipeline. Not recoverable
    /// at the checkout boundary; log and abort.
    #[error(
        "Pricing invariant violated: expected total {expected_cents} cents, computed {actual_cents} cents"
    )]
    PricingInvariantViolation {
        expected_cents: i64,
        actual_cents: i64,
    },

    /// Cart has exceeded maximum allowed unique lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Product is not in the cart.
    #[error("Product {0} not in cart")]
    ItemNotInCart(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date window where the end precedes the start.
    #[error("end_date must be after start_date")]
    InvalidDateWindow,

    /// Duplicate value (e.g., duplicate coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! # bazaar-core: Pure Business Logic for the Bazaar Marketplace
//!
//! This crate is the **heart** of the Bazaar pricing engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bazaar Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront / Merchant Dashboard (Next.js)          │   │
//! │  │    Cart UI ──► Coupon box ──► Checkout ──► Order history        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON (ts-rs generated types)           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  coupon   │  │  pricing  │  │   │
//! │  │   │  Coupon   │  │   Money   │  │ is_valid  │  │ pipeline  │  │   │
//! │  │   │  Order    │  │  TaxRate  │  │ discount  │  │ breakdown │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │   cart    │  │ validation│                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO WALL CLOCK • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Database Layer)                   │   │
//! │  │     SQLite repositories, checkout transaction, numbering        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, Order, Invoice, statuses)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`coupon`] - Coupon validity and discount computation
//! - [`cart`] - Cart aggregation with the quantity-merge invariant
//! - [`pricing`] - The subtotal → discount → tax → shipping → total pipeline
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Injected Clock**: Time-dependent functions take `now` explicitly
//! 4. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::cart::Cart;
//! use bazaar_core::money::Money;
//! use bazaar_core::pricing::price_cart;
//! use bazaar_core::types::TaxRate;
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let mut cart = Cart::new();
//! cart.add_item("prod-1", "Espresso Machine", 24_999, 1, now).unwrap();
//!
//! let breakdown = price_cart(&cart, now, TaxRate::from_bps(825), Money::from_cents(599)).unwrap();
//! assert_eq!(
//!     breakdown.total_cents,
//!     breakdown.subtotal_cents - breakdown.discount_cents
//!         + breakdown.tax_cents + breakdown.shipping_cost_cents
//! );
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bazaar_core::Money` instead of
// `use bazaar_core::money::Money`

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, CouponRejection, ValidationError};
pub use money::Money;
pub use pricing::PricingBreakdown;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum unique lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps checkout snapshots a sane size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

//! # bazaar-db: Database Layer for the Bazaar Pricing Engine
//!
//! This crate provides database access for the Bazaar marketplace pricing
//! core. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  Request handler (apply coupon / checkout / invoice)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazaar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │   │  Repositories  │   │   Checkout    │  │   │
//! │  │   │   (pool.rs)   │   │ coupon/order/  │   │ (checkout.rs) │  │   │
//! │  │   │               │   │ invoice        │   │               │  │   │
//! │  │   │ SqlitePool    │◄──│ atomic redeem  │◄──│ freeze txn    │  │   │
//! │  │   │ WAL mode      │   │ numbering      │   │ preview       │  │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL, foreign keys ON, integer-cents columns)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`numbering`] - Order/invoice number allocation
//! - [`repository`] - Repository implementations (coupon, order, invoice)
//! - [`checkout`] - The cart → order freeze transaction and preview
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/bazaar.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let coupon = db.coupons().find_by_code("SUMMER10").await?;
//!
//! // Freeze a cart
//! let order = db.checkout()
//!     .place_order(&cart, "cust-1", tax_rate, shipping, Utc::now())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod numbering;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutError, CheckoutService};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::coupon::CouponRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::order::OrderRepository;

//! # Domain Types
//!
//! Core domain types used throughout the Bazaar pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Coupon      │   │      Order      │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (business)│   │  order_number   │   │  invoice_number │       │
//! │  │  type + value   │   │  status machine │   │  order_id (FK)  │       │
//! │  │  usage caps     │   │  frozen totals  │   │  frozen totals  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   OrderStatus   │   │  CouponType     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending → ...  │   │  Percentage     │       │
//! │  │  825 = 8.25%    │   │  → Delivered    │   │  Fixed          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every financial entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (coupon code, order_number, invoice_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25% (e.g., Texas sales tax)
///
/// The rate is an external configuration input; this crate never decides
/// which jurisdiction applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` is a percentage of the subtotal, in basis points
    /// (1000 = 10% off).
    Percentage,
    /// `value` is a flat amount in cents.
    Fixed,
}

/// An immutable value snapshot of a merchant's coupon.
///
/// ## Snapshot Semantics
/// The validity and discount functions in [`crate::coupon`] operate on this
/// snapshot plus an explicit `now`; they never touch storage or the wall
/// clock. The database row is the source of truth for `used_count` - the
/// checkout path re-reads it and redeems with an atomic conditional
/// increment, so a stale snapshot can never over-redeem.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Merchant that issued the coupon.
    pub merchant_id: String,

    /// Customer-facing code - business identifier, unique storewide.
    pub code: String,

    /// Interpretation of `value`.
    pub coupon_type: CouponType,

    /// Basis points for percentage coupons, cents for fixed coupons.
    /// Always >= 1.
    pub value: i64,

    /// Minimum cart subtotal required to apply the coupon.
    pub min_purchase_cents: Option<i64>,

    /// Upper bound on the computed discount.
    pub max_discount_cents: Option<i64>,

    /// Total number of redemptions allowed across all customers.
    pub usage_limit: Option<i64>,

    /// Redemptions so far. Only ever increments.
    pub used_count: i64,

    /// Redemptions allowed per customer.
    pub per_customer_limit: Option<i64>,

    /// Start of the validity window.
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    /// End of the validity window; open-ended when absent.
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,

    /// Soft retirement flag.
    pub is_active: bool,

    /// When the coupon was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the coupon was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Returns the minimum purchase requirement as Money, if set.
    #[inline]
    pub fn min_purchase(&self) -> Option<Money> {
        self.min_purchase_cents.map(Money::from_cents)
    }

    /// Returns the discount cap as Money, if set.
    #[inline]
    pub fn max_discount(&self) -> Option<Money> {
        self.max_discount_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The fulfillment status of an order.
///
/// ## State Machine
/// ```text
/// Pending ──► Confirmed ──► Processing ──► Shipped ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
/// Cancellation is only reachable before processing begins. Delivered and
/// Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, awaiting merchant confirmation.
    Pending,
    /// Merchant accepted the order.
    Confirmed,
    /// Items being picked/packed.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled before processing began.
    Cancelled,
}

impl OrderStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::types::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
    /// assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
    /// assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    /// assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
    /// ```
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Cancelled)
                | (Processing, Shipped)
                | (Shipped, Delivered)
        )
    }

    /// Stable lowercase name, matching the database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Payment / Shipping Status
// =============================================================================

/// Payment state tracked alongside the order (settled by an external
/// payment collaborator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Shipment state reported by the shipping collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    Pending,
    Shipped,
    Delivered,
}

impl Default for ShippingStatus {
    fn default() -> Self {
        ShippingStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A frozen snapshot of a checked-out cart.
///
/// ## Freeze Semantics
/// The five money fields are written once at checkout and never change;
/// later coupon edits or price changes have no effect. Only the status
/// columns and their transition timestamps are mutable.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-legible business number, e.g. `ORD-20260806-000042`.
    pub order_number: String,
    pub customer_id: String,
    /// Code of the coupon redeemed for this order, if any.
    pub coupon_code: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Re-checks the additive identity on the frozen fields.
    ///
    /// `total == subtotal - discount + tax + shipping` must hold for every
    /// persisted order; a false return indicates a bug upstream.
    pub fn verify_totals(&self) -> bool {
        self.total_cents
            == self.subtotal_cents - self.discount_cents + self.tax_cents
                + self.shipping_cost_cents
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of add-to-cart (frozen).
    pub unit_price_cents: i64,
    /// Quantity ordered.
    pub quantity: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A financial document derived from an order.
///
/// Mirrors the order's frozen totals under its own unique business number.
/// One invoice per order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Human-legible business number, e.g. `INV-20260806-000042`.
    pub invoice_number: String,
    pub order_id: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Re-checks the additive identity on the invoice fields.
    pub fn verify_totals(&self) -> bool {
        self.total_cents
            == self.subtotal_cents - self.discount_cents + self.tax_cents
                + self.shipping_cost_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
    }

    #[test]
    fn test_order_status_happy_path() {
        use OrderStatus::*;
        let path = [Pending, Confirmed, Processing, Shipped, Delivered];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{:?} -> {:?} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_order_status_cancellation_window() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_order_status_no_backwards_or_skips() {
        use OrderStatus::*;
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(Shipped));
        // Self-transitions are not transitions
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_coupon_json_shape() {
        // The storefront consumes these shapes; enum casing is part of the
        // wire contract.
        let now = Utc::now();
        let coupon = Coupon {
            id: "c1".to_string(),
            merchant_id: "m1".to_string(),
            code: "SUMMER10".to_string(),
            coupon_type: CouponType::Percentage,
            value: 1000,
            min_purchase_cents: None,
            max_discount_cents: Some(5_000),
            usage_limit: Some(100),
            used_count: 0,
            per_customer_limit: None,
            start_date: now,
            end_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&coupon).unwrap();
        assert_eq!(json["coupon_type"], "percentage");
        assert_eq!(json["code"], "SUMMER10");

        let back: Coupon = serde_json::from_value(json).unwrap();
        assert_eq!(back.coupon_type, CouponType::Percentage);
        assert_eq!(back.max_discount_cents, Some(5_000));
    }

    #[test]
    fn test_order_verify_totals() {
        let now = Utc::now();
        let mut order = Order {
            id: "o1".to_string(),
            order_number: "ORD-20260806-000001".to_string(),
            customer_id: "c1".to_string(),
            coupon_code: None,
            subtotal_cents: 25000,
            discount_cents: 2500,
            tax_cents: 2250,
            shipping_cost_cents: 500,
            total_cents: 25250,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::Pending,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        };
        assert!(order.verify_totals());

        order.total_cents += 1;
        assert!(!order.verify_totals());
    }
}

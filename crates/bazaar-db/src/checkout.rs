//! # Checkout Service
//!
//! The one place a cart becomes an order.
//!
//! ## The Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      place_order Flow                                   │
//! │                                                                         │
//! │  1. Reject empty carts (no checkout eligibility)                       │
//! │  2. Resolve the cart's coupon code against the LIVE row                │
//! │     ├── missing            → CouponNotFound                            │
//! │     ├── invalid            → CouponNotApplicable { reason }            │
//! │     ├── below min purchase → CouponBelowMinimumPurchase                │
//! │     └── per-customer cap   → CouponPerCustomerLimitExceeded            │
//! │  3. Run the pricing pipeline (identity self-checked)                   │
//! │  4. BEGIN                                                              │
//! │     ├── allocate ORD-YYYYMMDD-NNNNNN (atomic per-day counter)          │
//! │     ├── insert order snapshot + line items                             │
//! │     ├── conditional used_count increment ── 0 rows? ──► ROLLBACK       │
//! │     ├── record redemption row (per-customer history)                   │
//! │     └── COMMIT                                                         │
//! │                                                                         │
//! │  All-or-nothing: a redemption that loses the race aborts the whole     │
//! │  order, so concurrent checkouts can never over-redeem past             │
//! │  usage_limit, and no order ever exists without its redemption row.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `preview` runs steps 1-3 only and is freely repeatable: same inputs,
//! identical breakdown, no writes.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::numbering::{self, MAX_NUMBERING_ATTEMPTS, ORDER_PREFIX};
use crate::pool::Database;
use crate::repository::coupon::{record_redemption_on, try_redeem_on};
use crate::repository::order::{insert_item_on, insert_order_on};
use bazaar_core::coupon::check_applicability;
use bazaar_core::pricing;
use bazaar_core::{
    Cart, CoreError, Coupon, CouponRejection, Invoice, Money, Order, OrderItem, OrderStatus,
    PaymentStatus, PricingBreakdown, ShippingStatus, TaxRate,
};

// =============================================================================
// Checkout Error
// =============================================================================

/// Everything the checkout boundary can surface.
///
/// ## Propagation Policy
/// - The coupon rejections inside [`CoreError`] are recoverable: the
///   storefront shows the customer the precise reason.
/// - `PricingInvariantViolation` is a bug indicator; callers log it and show
///   a generic "please retry".
/// - `DbError::NumberingExhausted` is terminal for the request after the
///   bounded internal retries.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Empty carts cannot be checked out.
    #[error("Cart is empty")]
    EmptyCart,

    /// Business rule rejection (coupon errors, pricing invariant).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl CheckoutError {
    /// Whether this is a coupon rejection the customer can act on
    /// (as opposed to an internal failure).
    pub fn is_coupon_rejection(&self) -> bool {
        matches!(
            self,
            CheckoutError::Core(
                CoreError::CouponNotFound(_)
                    | CoreError::CouponNotApplicable { .. }
                    | CoreError::CouponBelowMinimumPurchase { .. }
                    | CoreError::CouponPerCustomerLimitExceeded { .. }
            )
        )
    }
}

// =============================================================================
// Checkout Service
// =============================================================================

/// Orchestrates coupon resolution, pricing, and the freeze transaction.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Resolves the cart's applied coupon against the live row and gates it.
    ///
    /// The cart carries a snapshot from when the customer applied the code;
    /// pricing and redemption always use the CURRENT row so a coupon the
    /// merchant retired in the meantime is rejected here.
    async fn resolve_coupon(
        &self,
        cart: &Cart,
        customer_id: &str,
        subtotal: Money,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, CheckoutError> {
        let Some(applied) = &cart.coupon else {
            return Ok(None);
        };

        let fresh = self
            .db
            .coupons()
            .find_by_code(&applied.code)
            .await?
            .ok_or_else(|| CoreError::CouponNotFound(applied.code.clone()))?;

        let prior = self
            .db
            .coupons()
            .count_customer_redemptions(&fresh.id, customer_id)
            .await?;

        check_applicability(&fresh, now, subtotal, Some(prior))?;

        Ok(Some(fresh))
    }

    /// Prices the cart for display without writing anything.
    ///
    /// Calling this twice with unchanged inputs yields the identical
    /// breakdown.
    pub async fn preview(
        &self,
        cart: &Cart,
        customer_id: &str,
        tax_rate: TaxRate,
        shipping_cost: Money,
        now: DateTime<Utc>,
    ) -> Result<PricingBreakdown, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal = cart.subtotal();
        let coupon = self.resolve_coupon(cart, customer_id, subtotal, now).await?;

        let breakdown = pricing::compute(subtotal, coupon.as_ref(), now, tax_rate, shipping_cost)?;
        Ok(breakdown)
    }

    /// Freezes the cart into an immutable order inside one transaction.
    ///
    /// See the module docs for the full flow. The returned order is already
    /// committed; the caller clears the cart.
    pub async fn place_order(
        &self,
        cart: &Cart,
        customer_id: &str,
        tax_rate: TaxRate,
        shipping_cost: Money,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal = cart.subtotal();
        let coupon = self.resolve_coupon(cart, customer_id, subtotal, now).await?;

        let breakdown = pricing::compute(subtotal, coupon.as_ref(), now, tax_rate, shipping_cost)?;

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

            let order_number = numbering::next_number(&mut *tx, ORDER_PREFIX, now).await?;

            let order = Order {
                id: Uuid::new_v4().to_string(),
                order_number,
                customer_id: customer_id.to_string(),
                coupon_code: coupon.as_ref().map(|c| c.code.clone()),
                subtotal_cents: breakdown.subtotal_cents,
                discount_cents: breakdown.discount_cents,
                tax_cents: breakdown.tax_cents,
                shipping_cost_cents: breakdown.shipping_cost_cents,
                total_cents: breakdown.total_cents,
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

            match insert_order_on(&mut *tx, &order).await {
                Ok(()) => {
                    for cart_item in &cart.items {
                        let item = OrderItem {
                            id: Uuid::new_v4().to_string(),
                            order_id: order.id.clone(),
                            product_id: cart_item.product_id.clone(),
                            name_snapshot: cart_item.name.clone(),
                            unit_price_cents: cart_item.unit_price_cents,
                            quantity: cart_item.quantity,
                            line_total_cents: cart_item.line_total_cents(),
                            created_at: now,
                        };
                        insert_item_on(&mut *tx, &item).await?;
                    }

                    if let Some(c) = &coupon {
                        // The applicability check above ran on a snapshot;
                        // this conditional increment is what actually claims
                        // the redemption. Losing here means another checkout
                        // took the last slot - roll the whole order back.
                        let redeemed = try_redeem_on(&mut *tx, &c.id, now).await?;
                        if !redeemed {
                            return Err(CoreError::CouponNotApplicable {
                                code: c.code.clone(),
                                reason: CouponRejection::Exhausted,
                            }
                            .into());
                        }

                        record_redemption_on(&mut *tx, &c.id, &order.id, customer_id, now)
                            .await?;
                    }

                    tx.commit().await.map_err(DbError::from)?;

                    info!(
                        order_number = %order.order_number,
                        customer_id = %customer_id,
                        total_cents = order.total_cents,
                        items = cart.items.len(),
                        coupon = order.coupon_code.as_deref().unwrap_or("-"),
                        "Order placed"
                    );
                    return Ok(order);
                }
                Err(DbError::UniqueViolation { field, .. }) if field.contains("order_number") => {
                    // Dropping the transaction rolls back the counter bump
                    // along with everything else; the next attempt starts
                    // clean.
                    debug!(attempt, "Order number collision, re-allocating");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(DbError::NumberingExhausted {
            prefix: ORDER_PREFIX.to_string(),
            attempts: MAX_NUMBERING_ATTEMPTS,
        }
        .into())
    }

    /// Issues the invoice document for a placed order.
    ///
    /// Re-verifies the additive identity on the stored row before minting
    /// the document - an order that fails it indicates a bug and must not
    /// be invoiced.
    pub async fn issue_invoice(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Invoice, CheckoutError> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if !order.verify_totals() {
            return Err(CoreError::PricingInvariantViolation {
                expected_cents: order.subtotal_cents - order.discount_cents + order.tax_cents
                    + order.shipping_cost_cents,
                actual_cents: order.total_cents,
            }
            .into());
        }

        Ok(self.db.invoices().issue_for_order(&order, now).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Pricing Pipeline
//!
//! Deterministic aggregation from line items to a final payable total,
//! identical whether previewing a cart or freezing an order.
//!
//! ## The Pipeline (fixed order - downstream totals depend on it)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pricing Pipeline                                   │
//! │                                                                         │
//! │  1. subtotal      = Σ (unit_price × quantity)                          │
//! │         │           (empty cart short-circuits to an all-zero result)  │
//! │         ▼                                                               │
//! │  2. discount      = coupon valid ? calculate_discount(subtotal) : 0    │
//! │         │           (at most one coupon; replace, never stack)         │
//! │         ▼                                                               │
//! │  3. taxable_base  = subtotal - discount   ← tax AFTER discount         │
//! │         │           (re-clamped at 0; a negative base never leaves     │
//! │         ▼            this function)                                     │
//! │  4. tax           = taxable_base × tax_rate                            │
//! │         ▼                                                               │
//! │  5. shipping      = supplied by the shipping collaborator, added       │
//! │         │           un-discounted                                       │
//! │         ▼                                                               │
//! │  6. total         = taxable_base + tax + shipping                      │
//! │                                                                         │
//! │  All cents, all integers, rounded half-up at the two percentage        │
//! │  sites (discount, tax). Pure: no hidden state, no clock reads -        │
//! │  the same inputs always produce the bit-identical breakdown.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writing a breakdown into an Order/Invoice is the separate one-time
//! "freeze" in bazaar-db; this module never mutates anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::coupon::{calculate_discount, is_valid};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Coupon, TaxRate};

// =============================================================================
// Pricing Breakdown
// =============================================================================

/// Every money-bearing output of the pipeline, in cents.
///
/// The additive identity `total == subtotal - discount + tax + shipping`
/// holds for every value this module produces; [`PricingBreakdown::verify`]
/// re-checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// `subtotal - discount`; the amount tax is computed against.
    pub taxable_base_cents: i64,
    pub tax_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
}

impl PricingBreakdown {
    /// The all-zero breakdown an empty cart prices to.
    pub const fn zero() -> Self {
        PricingBreakdown {
            subtotal_cents: 0,
            discount_cents: 0,
            taxable_base_cents: 0,
            tax_cents: 0,
            shipping_cost_cents: 0,
            total_cents: 0,
        }
    }

    /// Subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Re-checks the additive identity.
    ///
    /// ## Errors
    /// [`CoreError::PricingInvariantViolation`] when
    /// `total != subtotal - discount + tax + shipping`. This never happens
    /// unless the pipeline itself is buggy; callers abort and log rather
    /// than show it to a customer.
    pub fn verify(&self) -> CoreResult<()> {
        let expected =
            self.subtotal_cents - self.discount_cents + self.tax_cents + self.shipping_cost_cents;
        if self.total_cents != expected {
            return Err(CoreError::PricingInvariantViolation {
                expected_cents: expected,
                actual_cents: self.total_cents,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs steps 2-6 of the pipeline for an already-summed subtotal.
///
/// An invalid coupon contributes a zero discount rather than an error:
/// the checkout boundary rejects invalid coupons loudly *before* pricing,
/// while a cart preview quietly prices as if the lapsed coupon were absent.
pub fn compute(
    subtotal: Money,
    coupon: Option<&Coupon>,
    now: DateTime<Utc>,
    tax_rate: TaxRate,
    shipping_cost: Money,
) -> CoreResult<PricingBreakdown> {
    let discount = match coupon {
        Some(c) if is_valid(c, now) => calculate_discount(c, subtotal),
        _ => Money::zero(),
    };

    // calculate_discount already clamps to the subtotal; the clamp here
    // guarantees a negative base can never propagate regardless.
    let taxable_base = (subtotal - discount).clamp_at_zero();

    let tax = taxable_base.calculate_tax(tax_rate);

    let total = taxable_base + tax + shipping_cost;

    let breakdown = PricingBreakdown {
        subtotal_cents: subtotal.cents(),
        discount_cents: discount.cents(),
        taxable_base_cents: taxable_base.cents(),
        tax_cents: tax.cents(),
        shipping_cost_cents: shipping_cost.cents(),
        total_cents: total.cents(),
    };

    breakdown.verify()?;
    Ok(breakdown)
}

/// Prices a cart: step 1 plus [`compute`].
///
/// An empty cart short-circuits to the all-zero breakdown - no discount,
/// tax, or shipping is applied. (Checkout eligibility of an empty cart is
/// the caller's precondition, not this function's concern.)
///
/// ## Example
/// ```rust
/// use bazaar_core::cart::Cart;
/// use bazaar_core::money::Money;
/// use bazaar_core::pricing::price_cart;
/// use bazaar_core::types::TaxRate;
/// use chrono::Utc;
///
/// let mut cart = Cart::new();
/// cart.add_item("p1", "Widget", 10_000, 2, Utc::now()).unwrap();
/// cart.add_item("p2", "Gadget", 5_000, 1, Utc::now()).unwrap();
///
/// let breakdown = price_cart(&cart, Utc::now(), TaxRate::from_bps(1000), Money::zero()).unwrap();
/// assert_eq!(breakdown.subtotal_cents, 25_000);
/// assert_eq!(breakdown.tax_cents, 2_500);
/// assert_eq!(breakdown.total_cents, 27_500);
/// ```
pub fn price_cart(
    cart: &Cart,
    now: DateTime<Utc>,
    tax_rate: TaxRate,
    shipping_cost: Money,
) -> CoreResult<PricingBreakdown> {
    if cart.is_empty() {
        return Ok(PricingBreakdown::zero());
    }

    compute(
        cart.subtotal(),
        cart.coupon.as_ref(),
        now,
        tax_rate,
        shipping_cost,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CouponType;
    use chrono::Duration;

    fn cart_with(items: &[(&str, i64, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (id, price, qty) in items {
            cart.add_item(id, &format!("Product {}", id), *price, *qty, Utc::now())
                .unwrap();
        }
        cart
    }

    fn percentage_coupon(bps: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c1".to_string(),
            merchant_id: "m1".to_string(),
            code: "PCT".to_string(),
            coupon_type: CouponType::Percentage,
            value: bps,
            min_purchase_cents: None,
            max_discount_cents: None,
            usage_limit: None,
            used_count: 0,
            per_customer_limit: None,
            start_date: now - Duration::days(1),
            end_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_two_items_no_coupon() {
        // $100 × 2 + $50 × 1, tax 10%, shipping $0:
        // subtotal 250.00, tax 25.00, total 275.00
        let cart = cart_with(&[("p1", 10_000, 2), ("p2", 5_000, 1)]);

        let b = price_cart(&cart, Utc::now(), TaxRate::from_bps(1000), Money::zero()).unwrap();
        assert_eq!(b.subtotal_cents, 25_000);
        assert_eq!(b.discount_cents, 0);
        assert_eq!(b.taxable_base_cents, 25_000);
        assert_eq!(b.tax_cents, 2_500);
        assert_eq!(b.shipping_cost_cents, 0);
        assert_eq!(b.total_cents, 27_500);
    }

    #[test]
    fn test_empty_cart_short_circuits_to_zero() {
        let cart = Cart::new();
        let b = price_cart(
            &cart,
            Utc::now(),
            TaxRate::from_bps(1000),
            Money::from_cents(599), // shipping ignored for empty carts
        )
        .unwrap();
        assert_eq!(b, PricingBreakdown::zero());
    }

    #[test]
    fn test_tax_is_computed_after_discount() {
        // subtotal 100.00, 10% coupon → discount 10.00, taxable 90.00,
        // tax at 10% = 9.00 (NOT 10.00)
        let mut cart = cart_with(&[("p1", 10_000, 1)]);
        cart.apply_coupon(percentage_coupon(1000));

        let b = price_cart(&cart, Utc::now(), TaxRate::from_bps(1000), Money::zero()).unwrap();
        assert_eq!(b.discount_cents, 1_000);
        assert_eq!(b.taxable_base_cents, 9_000);
        assert_eq!(b.tax_cents, 900);
        assert_eq!(b.total_cents, 9_900);
    }

    #[test]
    fn test_shipping_is_added_undiscounted() {
        // 100% off coupon still pays full shipping
        let mut cart = cart_with(&[("p1", 10_000, 1)]);
        cart.apply_coupon(percentage_coupon(10_000));

        let b = price_cart(
            &cart,
            Utc::now(),
            TaxRate::from_bps(1000),
            Money::from_cents(799),
        )
        .unwrap();
        assert_eq!(b.discount_cents, 10_000);
        assert_eq!(b.taxable_base_cents, 0);
        assert_eq!(b.tax_cents, 0);
        assert_eq!(b.total_cents, 799);
    }

    #[test]
    fn test_invalid_coupon_contributes_zero_discount() {
        let mut coupon = percentage_coupon(1000);
        coupon.is_active = false;

        let mut cart = cart_with(&[("p1", 10_000, 1)]);
        cart.apply_coupon(coupon);

        let b = price_cart(&cart, Utc::now(), TaxRate::from_bps(1000), Money::zero()).unwrap();
        assert_eq!(b.discount_cents, 0);
        assert_eq!(b.total_cents, 11_000);
    }

    #[test]
    fn test_preview_is_idempotent() {
        let mut cart = cart_with(&[("p1", 3_333, 3), ("p2", 1_234, 7)]);
        cart.apply_coupon(percentage_coupon(1500));
        let now = Utc::now();
        let rate = TaxRate::from_bps(825);
        let shipping = Money::from_cents(499);

        let first = price_cart(&cart, now, rate, shipping).unwrap();
        let second = price_cart(&cart, now, rate, shipping).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_additive_identity_over_many_inputs() {
        // Deterministic pseudo-random sweep; the identity must hold
        // post-rounding for every combination.
        let now = Utc::now();
        for seed in 0..200u64 {
            let price = ((seed * 7919) % 49_999 + 1) as i64;
            let qty = ((seed * 104_729) % 9 + 1) as i64;
            let bps = ((seed * 31) % 10_000 + 1) as i64;
            let rate = TaxRate::from_bps(((seed * 13) % 2_500) as u32);
            let shipping = Money::from_cents(((seed * 17) % 2_000) as i64);

            let mut cart = cart_with(&[("p", price, qty)]);
            if seed % 2 == 0 {
                cart.apply_coupon(percentage_coupon(bps));
            }

            let b = price_cart(&cart, now, rate, shipping).unwrap();
            assert_eq!(
                b.total_cents,
                b.subtotal_cents - b.discount_cents + b.tax_cents + b.shipping_cost_cents,
                "identity failed for seed {}",
                seed
            );
            assert!(b.taxable_base_cents >= 0);
            assert!(b.discount_cents <= b.subtotal_cents);
        }
    }

    #[test]
    fn test_verify_flags_corrupted_breakdown() {
        let cart = cart_with(&[("p1", 10_000, 1)]);
        let mut b = price_cart(&cart, Utc::now(), TaxRate::zero(), Money::zero()).unwrap();
        b.total_cents += 1;
        assert!(matches!(
            b.verify(),
            Err(CoreError::PricingInvariantViolation { .. })
        ));
    }
}

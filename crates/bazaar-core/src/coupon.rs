//! # Coupon Engine
//!
//! Decides whether a coupon may be applied right now, and computes the
//! discount it yields for a given subtotal.
//!
//! ## Design: Pure Functions Over Snapshots
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Coupon Engine Contract                             │
//! │                                                                         │
//! │  Inputs:  Coupon snapshot + explicit `now` + caller-supplied subtotal  │
//! │  Outputs: bool / Money / typed rejection                               │
//! │                                                                         │
//! │  NO database access  NO wall-clock reads  NO mutation                  │
//! │                                                                         │
//! │  Call order at checkout:                                               │
//! │    1. check_applicability()  ← full gate, typed errors                 │
//! │    2. calculate_discount()   ← pure arithmetic, already-gated input    │
//! │    3. (db layer) atomic used_count increment                           │
//! │                                                                         │
//! │  calculate_discount deliberately does NOT re-check validity or         │
//! │  min-purchase: the pricing pipeline treats an invalid coupon as        │
//! │  "no discount", while checkout rejects it loudly first.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, CouponRejection};
use crate::money::Money;
use crate::types::{Coupon, CouponType};

// =============================================================================
// Validity
// =============================================================================

/// Returns why the coupon cannot be applied at `now`, or `None` when it can.
///
/// Checks run in a fixed order so the customer always sees the most
/// fundamental problem first: inactive, then not-yet-started, then expired,
/// then exhausted.
pub fn rejection_reason(coupon: &Coupon, now: DateTime<Utc>) -> Option<CouponRejection> {
    if !coupon.is_active {
        return Some(CouponRejection::Inactive);
    }

    if now < coupon.start_date {
        return Some(CouponRejection::NotYetStarted);
    }

    if let Some(end) = coupon.end_date {
        if now > end {
            return Some(CouponRejection::Expired);
        }
    }

    if let Some(limit) = coupon.usage_limit {
        if coupon.used_count >= limit {
            return Some(CouponRejection::Exhausted);
        }
    }

    None
}

/// Whether the coupon may be applied at `now`.
///
/// True iff the coupon is active, within its date window, and under its
/// global usage limit. Pure function of the snapshot and `now`; per-customer
/// limits and minimum purchase are separate caller-side checks (see
/// [`check_applicability`]).
///
/// ## Example
/// ```rust
/// use bazaar_core::coupon::is_valid;
/// # use bazaar_core::types::{Coupon, CouponType};
/// # use chrono::{Duration, Utc};
/// # let now = Utc::now();
/// # let coupon = Coupon {
/// #     id: "c1".into(), merchant_id: "m1".into(), code: "TEN".into(),
/// #     coupon_type: CouponType::Percentage, value: 1000,
/// #     min_purchase_cents: None, max_discount_cents: None,
/// #     usage_limit: Some(5), used_count: 0, per_customer_limit: None,
/// #     start_date: now - Duration::days(1), end_date: None,
/// #     is_active: true, created_at: now, updated_at: now,
/// # };
/// assert!(is_valid(&coupon, now));
/// ```
pub fn is_valid(coupon: &Coupon, now: DateTime<Utc>) -> bool {
    rejection_reason(coupon, now).is_none()
}

// =============================================================================
// Discount
// =============================================================================

/// Computes the discount this coupon yields for `subtotal`.
///
/// - Percentage: `subtotal × value` basis points, rounded half-up.
/// - Fixed: `value` cents.
/// - Capped at `max_discount` when set (either type).
/// - Never exceeds `subtotal`, never negative.
///
/// Does NOT check validity, minimum purchase, or per-customer limits;
/// callers gate with [`check_applicability`] first.
///
/// ## Example
/// ```rust
/// use bazaar_core::coupon::calculate_discount;
/// use bazaar_core::money::Money;
/// # use bazaar_core::types::{Coupon, CouponType};
/// # use chrono::Utc;
/// # let now = Utc::now();
/// # let coupon = Coupon {
/// #     id: "c1".into(), merchant_id: "m1".into(), code: "TEN".into(),
/// #     coupon_type: CouponType::Percentage, value: 1000,
/// #     min_purchase_cents: None, max_discount_cents: None,
/// #     usage_limit: None, used_count: 0, per_customer_limit: None,
/// #     start_date: now, end_date: None,
/// #     is_active: true, created_at: now, updated_at: now,
/// # };
/// // 10% of $1000.00 = $100.00
/// let discount = calculate_discount(&coupon, Money::from_cents(100_000));
/// assert_eq!(discount.cents(), 10_000);
/// ```
pub fn calculate_discount(coupon: &Coupon, subtotal: Money) -> Money {
    let raw = match coupon.coupon_type {
        // `value` is bounded to 10000 bps by validation; the clamp keeps
        // arithmetic sane for rows that predate it.
        CouponType::Percentage => subtotal.percentage_of(coupon.value.clamp(0, 10_000) as u32),
        CouponType::Fixed => Money::from_cents(coupon.value),
    };

    let capped = match coupon.max_discount() {
        Some(cap) => raw.min(cap),
        None => raw,
    };

    // A discount can never exceed what is being discounted, and never be
    // negative - this is what keeps totals non-negative downstream.
    capped.min(subtotal).clamp_at_zero()
}

// =============================================================================
// Full Applicability Gate
// =============================================================================

/// The complete checkout-time gate for a coupon.
///
/// ## Arguments
/// * `coupon` - current snapshot (checkout re-reads the row first)
/// * `now` - injected clock
/// * `subtotal` - cart subtotal the discount would apply to
/// * `prior_redemptions` - how many times this customer has already redeemed
///   this coupon, from the order-history collaborator; `None` when the
///   caller does not track the customer
///
/// ## Errors
/// * [`CoreError::CouponNotApplicable`] with the precise rejection reason
/// * [`CoreError::CouponBelowMinimumPurchase`]
/// * [`CoreError::CouponPerCustomerLimitExceeded`]
///
/// (`CouponNotFound` is raised by the lookup layer before this runs.)
pub fn check_applicability(
    coupon: &Coupon,
    now: DateTime<Utc>,
    subtotal: Money,
    prior_redemptions: Option<i64>,
) -> CoreResult<()> {
    if let Some(reason) = rejection_reason(coupon, now) {
        return Err(CoreError::CouponNotApplicable {
            code: coupon.code.clone(),
            reason,
        });
    }

    if let Some(min) = coupon.min_purchase() {
        if subtotal < min {
            return Err(CoreError::CouponBelowMinimumPurchase {
                code: coupon.code.clone(),
                min_purchase_cents: min.cents(),
                subtotal_cents: subtotal.cents(),
            });
        }
    }

    if let (Some(limit), Some(prior)) = (coupon.per_customer_limit, prior_redemptions) {
        if prior >= limit {
            return Err(CoreError::CouponPerCustomerLimitExceeded {
                code: coupon.code.clone(),
                limit,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_coupon(coupon_type: CouponType, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "c1".to_string(),
            merchant_id: "m1".to_string(),
            code: "TEST".to_string(),
            coupon_type,
            value,
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

    // --- validity window ---

    #[test]
    fn test_valid_coupon() {
        let coupon = test_coupon(CouponType::Percentage, 1000);
        assert!(is_valid(&coupon, Utc::now()));
    }

    #[test]
    fn test_inactive_coupon_is_invalid() {
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.is_active = false;
        assert_eq!(
            rejection_reason(&coupon, Utc::now()),
            Some(CouponRejection::Inactive)
        );
    }

    #[test]
    fn test_future_start_date_is_invalid_regardless_of_active() {
        let now = Utc::now();
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.start_date = now + Duration::days(1); // starts tomorrow
        coupon.is_active = true;
        assert_eq!(
            rejection_reason(&coupon, now),
            Some(CouponRejection::NotYetStarted)
        );
    }

    #[test]
    fn test_window_boundaries_are_inclusive() {
        let now = Utc::now();
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.start_date = now;
        coupon.end_date = Some(now);
        // now == start_date and now == end_date are both inside the window
        assert!(is_valid(&coupon, now));
        assert!(!is_valid(&coupon, now + Duration::seconds(1)));
        assert!(!is_valid(&coupon, now - Duration::seconds(1)));
    }

    #[test]
    fn test_expired_coupon_is_invalid() {
        let now = Utc::now();
        let mut coupon = test_coupon(CouponType::Fixed, 500);
        coupon.start_date = now - Duration::days(30);
        coupon.end_date = Some(now - Duration::days(1));
        assert_eq!(
            rejection_reason(&coupon, now),
            Some(CouponRejection::Expired)
        );
    }

    #[test]
    fn test_exhausted_usage_limit_is_invalid() {
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.usage_limit = Some(5);
        coupon.used_count = 5;
        assert_eq!(
            rejection_reason(&coupon, Utc::now()),
            Some(CouponRejection::Exhausted)
        );

        coupon.used_count = 4;
        assert!(is_valid(&coupon, Utc::now()));
    }

    #[test]
    fn test_no_usage_limit_never_exhausts() {
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.usage_limit = None;
        coupon.used_count = 1_000_000;
        assert!(is_valid(&coupon, Utc::now()));
    }

    // --- discount computation ---

    #[test]
    fn test_percentage_discount_uncapped() {
        // 10% of 100000 = 10000
        let coupon = test_coupon(CouponType::Percentage, 1000);
        let discount = calculate_discount(&coupon, Money::from_cents(100_000));
        assert_eq!(discount.cents(), 10_000);
    }

    #[test]
    fn test_fixed_discount() {
        // fixed 50000 off 100000 = 50000
        let coupon = test_coupon(CouponType::Fixed, 50_000);
        let discount = calculate_discount(&coupon, Money::from_cents(100_000));
        assert_eq!(discount.cents(), 50_000);
    }

    #[test]
    fn test_percentage_discount_hits_max_cap() {
        // 20% of 200000 = 40000, capped at 30000
        let mut coupon = test_coupon(CouponType::Percentage, 2000);
        coupon.max_discount_cents = Some(30_000);
        let discount = calculate_discount(&coupon, Money::from_cents(200_000));
        assert_eq!(discount.cents(), 30_000);
    }

    #[test]
    fn test_max_cap_applies_to_fixed_type_too() {
        let mut coupon = test_coupon(CouponType::Fixed, 50_000);
        coupon.max_discount_cents = Some(20_000);
        let discount = calculate_discount(&coupon, Money::from_cents(100_000));
        assert_eq!(discount.cents(), 20_000);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        // fixed $500 off a $30 cart discounts exactly $30
        let coupon = test_coupon(CouponType::Fixed, 50_000);
        let discount = calculate_discount(&coupon, Money::from_cents(3_000));
        assert_eq!(discount.cents(), 3_000);

        // 100% off is the most a percentage can reach
        let full = test_coupon(CouponType::Percentage, 10_000);
        let discount = calculate_discount(&full, Money::from_cents(7_777));
        assert_eq!(discount.cents(), 7_777);
    }

    #[test]
    fn test_discount_on_zero_subtotal_is_zero() {
        let coupon = test_coupon(CouponType::Fixed, 50_000);
        assert!(calculate_discount(&coupon, Money::zero()).is_zero());
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of 333 cents = 49.95 → 50
        let coupon = test_coupon(CouponType::Percentage, 1500);
        let discount = calculate_discount(&coupon, Money::from_cents(333));
        assert_eq!(discount.cents(), 50);
    }

    // --- full applicability gate ---

    #[test]
    fn test_applicability_passes_clean_coupon() {
        let coupon = test_coupon(CouponType::Percentage, 1000);
        let result = check_applicability(&coupon, Utc::now(), Money::from_cents(5_000), Some(0));
        assert!(result.is_ok());
    }

    #[test]
    fn test_applicability_reports_rejection_reason() {
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.is_active = false;
        let err = check_applicability(&coupon, Utc::now(), Money::from_cents(5_000), None)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::CouponNotApplicable {
                reason: CouponRejection::Inactive,
                ..
            }
        ));
    }

    #[test]
    fn test_applicability_minimum_purchase() {
        let mut coupon = test_coupon(CouponType::Fixed, 500);
        coupon.min_purchase_cents = Some(10_000);

        let err = check_applicability(&coupon, Utc::now(), Money::from_cents(9_999), None)
            .unwrap_err();
        assert!(matches!(err, CoreError::CouponBelowMinimumPurchase { .. }));

        // Exactly at the minimum qualifies
        let ok = check_applicability(&coupon, Utc::now(), Money::from_cents(10_000), None);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_applicability_per_customer_limit() {
        let mut coupon = test_coupon(CouponType::Percentage, 1000);
        coupon.per_customer_limit = Some(2);

        let err = check_applicability(&coupon, Utc::now(), Money::from_cents(5_000), Some(2))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::CouponPerCustomerLimitExceeded { limit: 2, .. }
        ));

        let ok = check_applicability(&coupon, Utc::now(), Money::from_cents(5_000), Some(1));
        assert!(ok.is_ok());

        // No redemption history supplied: limit cannot be enforced here
        let ok = check_applicability(&coupon, Utc::now(), Money::from_cents(5_000), None);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_is_valid_has_no_side_effects() {
        let coupon = test_coupon(CouponType::Percentage, 1000);
        let now = Utc::now();
        let before = coupon.clone();
        let _ = is_valid(&coupon, now);
        let _ = calculate_discount(&coupon, Money::from_cents(1_000));
        assert_eq!(before.used_count, coupon.used_count);
        assert_eq!(before.is_active, coupon.is_active);
    }
}

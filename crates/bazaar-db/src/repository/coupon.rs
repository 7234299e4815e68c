//! # Coupon Repository
//!
//! Database operations for coupons and their redemption history.
//!
//! ## The Redemption Race
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Why try_redeem Is One Conditional UPDATE                     │
//! │                                                                         │
//! │  Naive (BROKEN) sequence:                                               │
//! │    read used_count (4) ─► check 4 < 5 ─► write used_count = 5          │
//! │    Two concurrent checkouts both read 4, both pass, both write.        │
//! │    A 5-use coupon gets redeemed 6 times.                               │
//! │                                                                         │
//! │  This repository:                                                       │
//! │    UPDATE coupons SET used_count = used_count + 1                      │
//! │    WHERE id = ? AND is_active = 1                                      │
//! │      AND (usage_limit IS NULL OR used_count < usage_limit)             │
//! │                                                                         │
//! │    rows_affected == 1 → this caller owns the redemption                │
//! │    rows_affected == 0 → limit reached (or retired) - reject            │
//! │                                                                         │
//! │  The database serializes the increments; no caller ever decides on     │
//! │  a stale count.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bazaar_core::Coupon;

/// Column list shared by every coupon SELECT so FromRow always sees the
/// full snapshot.
const COUPON_COLUMNS: &str = r#"
    id, merchant_id, code, coupon_type, value,
    min_purchase_cents, max_discount_cents,
    usage_limit, used_count, per_customer_limit,
    start_date, end_date, is_active,
    created_at, updated_at
"#;

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a coupon.
    ///
    /// ## Errors
    /// [`DbError::UniqueViolation`] with the offending code when the code
    /// is already taken.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, code = %coupon.code, "Inserting coupon");

        let result = sqlx::query(
            r#"
            INSERT INTO coupons (
                id, merchant_id, code, coupon_type, value,
                min_purchase_cents, max_discount_cents,
                usage_limit, used_count, per_customer_limit,
                start_date, end_date, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15
            )
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.merchant_id)
        .bind(&coupon.code)
        .bind(coupon.coupon_type)
        .bind(coupon.value)
        .bind(coupon.min_purchase_cents)
        .bind(coupon.max_discount_cents)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(coupon.per_customer_limit)
        .bind(coupon.start_date)
        .bind(coupon.end_date)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from);

        match result {
            Err(err) if err.is_unique_violation() => {
                Err(DbError::duplicate("code", &coupon.code))
            }
            Err(err) => Err(err),
            Ok(_) => Ok(()),
        }
    }

    /// Gets a coupon by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE id = ?1",
            COUPON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Looks up a coupon by its customer-facing code.
    ///
    /// ## Returns
    /// * `Ok(Some(Coupon))` - current snapshot of the row
    /// * `Ok(None)` - no such code (callers map this to CouponNotFound)
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE code = ?1",
            COUPON_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Lists a merchant's coupons, newest first.
    pub async fn list_by_merchant(&self, merchant_id: &str) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE merchant_id = ?1 ORDER BY created_at DESC",
            COUPON_COLUMNS
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Flips the soft-retirement flag.
    pub async fn set_active(&self, id: &str, is_active: bool, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET is_active = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        Ok(())
    }

    /// Atomically claims one redemption of the coupon.
    ///
    /// ## Returns
    /// * `Ok(true)` - this caller owns the redemption; `used_count` moved up
    /// * `Ok(false)` - the limit was already reached (or the coupon was
    ///   retired between the applicability check and now)
    ///
    /// See the module docs for why this must be a single UPDATE.
    pub async fn try_redeem(&self, coupon_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        try_redeem_on(&self.pool, coupon_id, now).await
    }

    /// Counts all coupons (used by tooling).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts how many times a customer has redeemed a coupon.
    ///
    /// Backs the `per_customer_limit` check at the checkout boundary.
    pub async fn count_customer_redemptions(
        &self,
        coupon_id: &str,
        customer_id: &str,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM coupon_redemptions
            WHERE coupon_id = ?1 AND customer_id = ?2
            "#,
        )
        .bind(coupon_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-Generic Operations (shared with the checkout transaction)
// =============================================================================

/// The conditional increment, runnable on the pool or inside a transaction.
pub(crate) async fn try_redeem_on<'e, E>(
    executor: E,
    coupon_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE coupons
        SET used_count = used_count + 1, updated_at = ?2
        WHERE id = ?1
          AND is_active = 1
          AND (usage_limit IS NULL OR used_count < usage_limit)
        "#,
    )
    .bind(coupon_id)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Records a redemption row for per-customer tracking.
pub(crate) async fn record_redemption_on<'e, E>(
    executor: E,
    coupon_id: &str,
    order_id: &str,
    customer_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO coupon_redemptions (id, coupon_id, order_id, customer_id, redeemed_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(coupon_id)
    .bind(order_id)
    .bind(customer_id)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Order Repository
//!
//! Database operations for frozen order snapshots.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. FREEZE (checkout.rs, single transaction)                           │
//! │     └── order + items inserted with totals copied from the pipeline    │
//! │         Money columns never change after this point.                   │
//! │                                                                         │
//! │  2. STATUS TRANSITIONS                                                 │
//! │     └── update_status() → pending → confirmed → processing             │
//! │         → shipped → delivered (cancelled from pending/confirmed)       │
//! │         Each transition stamps its own timestamp column.               │
//! │                                                                         │
//! │  3. PAYMENT / SHIPPING FLAGS                                           │
//! │     └── set by external collaborators as they learn the outcome        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Order, OrderItem, OrderStatus, PaymentStatus, ShippingStatus};

/// Column list shared by every order SELECT.
const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_id, coupon_code,
    subtotal_cents, discount_cents, tax_cents, shipping_cost_cents, total_cents,
    status, payment_status, shipping_status,
    created_at, updated_at,
    confirmed_at, shipped_at, delivered_at, cancelled_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order by its business number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE order_number = ?1",
            ORDER_COLUMNS
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items for an order, in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   unit_price_cents, quantity, line_total_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE customer_id = ?1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Moves an order through its status state machine.
    ///
    /// ## What This Does
    /// 1. Rejects transitions the state machine forbids
    /// 2. Applies the change with an optimistic `WHERE status = <current>`
    ///    guard, so a concurrent transition loses cleanly instead of
    ///    overwriting
    /// 3. Stamps the transition's timestamp column; shipped/delivered also
    ///    advance `shipping_status`
    ///
    /// ## Errors
    /// * [`DbError::NotFound`] - no such order
    /// * [`DbError::InvalidStatusTransition`] - state machine violation
    /// * [`DbError::TransactionFailed`] - lost a race with another writer
    pub async fn update_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        let current = self
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if !current.status.can_transition_to(next) {
            return Err(DbError::InvalidStatusTransition {
                from: current.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        debug!(
            order_id = %order_id,
            from = current.status.as_str(),
            to = next.as_str(),
            "Order status transition"
        );

        // Each target status stamps its own timestamp column.
        let query = match next {
            OrderStatus::Confirmed => {
                "UPDATE orders SET status = ?2, updated_at = ?3, confirmed_at = ?3
                 WHERE id = ?1 AND status = ?4"
            }
            OrderStatus::Processing => {
                "UPDATE orders SET status = ?2, updated_at = ?3
                 WHERE id = ?1 AND status = ?4"
            }
            OrderStatus::Shipped => {
                "UPDATE orders SET status = ?2, updated_at = ?3, shipped_at = ?3,
                        shipping_status = 'shipped'
                 WHERE id = ?1 AND status = ?4"
            }
            OrderStatus::Delivered => {
                "UPDATE orders SET status = ?2, updated_at = ?3, delivered_at = ?3,
                        shipping_status = 'delivered'
                 WHERE id = ?1 AND status = ?4"
            }
            OrderStatus::Cancelled => {
                "UPDATE orders SET status = ?2, updated_at = ?3, cancelled_at = ?3
                 WHERE id = ?1 AND status = ?4"
            }
            // No transition leads back into Pending; can_transition_to
            // rejected it above.
            OrderStatus::Pending => {
                return Err(DbError::InvalidStatusTransition {
                    from: current.status.as_str().to_string(),
                    to: next.as_str().to_string(),
                })
            }
        };

        let result = sqlx::query(query)
            .bind(order_id)
            .bind(next)
            .bind(now)
            .bind(current.status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::TransactionFailed(format!(
                "order {} changed status concurrently",
                order_id
            )));
        }

        self.get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    /// Records the payment outcome reported by the payment collaborator.
    pub async fn set_payment_status(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(order_id)
        .bind(payment_status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    /// Records the shipment state reported by the shipping collaborator.
    pub async fn set_shipping_status(
        &self,
        order_id: &str,
        shipping_status: ShippingStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET shipping_status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(order_id)
        .bind(shipping_status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }
}

// =============================================================================
// Executor-Generic Operations (shared with the checkout transaction)
// =============================================================================

/// Inserts an order row. Runs inside the checkout transaction.
pub(crate) async fn insert_order_on<'e, E>(executor: E, order: &Order) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_id, coupon_code,
            subtotal_cents, discount_cents, tax_cents, shipping_cost_cents, total_cents,
            status, payment_status, shipping_status,
            created_at, updated_at,
            confirmed_at, shipped_at, delivered_at, cancelled_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12,
            ?13, ?14,
            ?15, ?16, ?17, ?18
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.coupon_code)
    .bind(order.subtotal_cents)
    .bind(order.discount_cents)
    .bind(order.tax_cents)
    .bind(order.shipping_cost_cents)
    .bind(order.total_cents)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.shipping_status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.confirmed_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Inserts a line item. Runs inside the checkout transaction.
pub(crate) async fn insert_item_on<'e, E>(executor: E, item: &OrderItem) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, name_snapshot,
            unit_price_cents, quantity, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use uuid::Uuid;

    fn test_order(number: &str) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            order_number: number.to_string(),
            customer_id: "cust-1".to_string(),
            coupon_code: None,
            subtotal_cents: 25_000,
            discount_cents: 0,
            tax_cents: 2_500,
            shipping_cost_cents: 0,
            total_cents: 27_500,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::Pending,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    async fn insert(db: &Database, order: &Order) {
        insert_order_on(db.pool(), order).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000001");
        insert(&db, &order).await;

        let found = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(found.order_number, "ORD-20260806-000001");
        assert_eq!(found.total_cents, 27_500);
        assert_eq!(found.status, OrderStatus::Pending);
        assert!(found.verify_totals());

        let by_number = db
            .orders()
            .get_by_number("ORD-20260806-000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, order.id);

        let history = db.orders().list_by_customer("cust-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, order.id);
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert(&db, &test_order("ORD-20260806-000001")).await;

        let err = insert_order_on(db.pool(), &test_order("ORD-20260806-000001"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_full_status_walk_stamps_timestamps() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000002");
        insert(&db, &order).await;
        let now = Utc::now();

        let confirmed = db
            .orders()
            .update_status(&order.id, OrderStatus::Confirmed, now)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());

        db.orders()
            .update_status(&order.id, OrderStatus::Processing, now)
            .await
            .unwrap();

        let shipped = db
            .orders()
            .update_status(&order.id, OrderStatus::Shipped, now)
            .await
            .unwrap();
        assert!(shipped.shipped_at.is_some());
        assert_eq!(shipped.shipping_status, ShippingStatus::Shipped);

        let delivered = db
            .orders()
            .update_status(&order.id, OrderStatus::Delivered, now)
            .await
            .unwrap();
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.shipping_status, ShippingStatus::Delivered);
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected_and_leave_row_untouched() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000003");
        insert(&db, &order).await;
        let now = Utc::now();

        // Pending cannot skip to Shipped
        let err = db
            .orders()
            .update_status(&order.id, OrderStatus::Shipped, now)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidStatusTransition { .. }));

        let found = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(found.status, OrderStatus::Pending);
        assert!(found.shipped_at.is_none());
    }

    #[tokio::test]
    async fn test_cancel_only_before_processing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000004");
        insert(&db, &order).await;
        let now = Utc::now();

        db.orders()
            .update_status(&order.id, OrderStatus::Confirmed, now)
            .await
            .unwrap();
        db.orders()
            .update_status(&order.id, OrderStatus::Processing, now)
            .await
            .unwrap();

        let err = db
            .orders()
            .update_status(&order.id, OrderStatus::Cancelled, now)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidStatusTransition { .. }));
    }

    #[tokio::test]
    async fn test_frozen_money_fields_survive_transitions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000005");
        insert(&db, &order).await;
        let now = Utc::now();

        db.orders()
            .update_status(&order.id, OrderStatus::Confirmed, now)
            .await
            .unwrap();
        db.orders()
            .set_payment_status(&order.id, PaymentStatus::Paid, now)
            .await
            .unwrap();

        let found = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(found.subtotal_cents, order.subtotal_cents);
        assert_eq!(found.discount_cents, order.discount_cents);
        assert_eq!(found.tax_cents, order.tax_cents);
        assert_eq!(found.shipping_cost_cents, order.shipping_cost_cents);
        assert_eq!(found.total_cents, order.total_cents);
        assert_eq!(found.payment_status, PaymentStatus::Paid);
    }
}

//! # Invoice Repository
//!
//! Database operations for invoices - financial documents derived from
//! orders.
//!
//! An invoice mirrors its order's frozen totals under its own
//! `INV-YYYYMMDD-NNNNNN` number. One invoice per order, enforced by a
//! unique index on `order_id`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::numbering::{self, INVOICE_PREFIX, MAX_NUMBERING_ATTEMPTS};
use bazaar_core::{Invoice, Order};

/// Column list shared by every invoice SELECT.
const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, order_id,
    subtotal_cents, discount_cents, tax_cents, shipping_cost_cents, total_cents,
    issued_at, created_at
"#;

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Issues the invoice for an order, allocating a fresh invoice number.
    ///
    /// ## Numbering Retry
    /// A unique-index rejection of the allocated `invoice_number` re-allocates
    /// and retries, bounded by [`MAX_NUMBERING_ATTEMPTS`]. A rejection on
    /// `order_id` means the order is already invoiced and is surfaced as a
    /// duplicate immediately - re-issuing never mints a second document.
    pub async fn issue_for_order(&self, order: &Order, now: DateTime<Utc>) -> DbResult<Invoice> {
        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            let invoice_number = numbering::next_number(&self.pool, INVOICE_PREFIX, now).await?;

            let invoice = Invoice {
                id: Uuid::new_v4().to_string(),
                invoice_number,
                order_id: order.id.clone(),
                subtotal_cents: order.subtotal_cents,
                discount_cents: order.discount_cents,
                tax_cents: order.tax_cents,
                shipping_cost_cents: order.shipping_cost_cents,
                total_cents: order.total_cents,
                issued_at: now,
                created_at: now,
            };

            let result = sqlx::query(
                r#"
                INSERT INTO invoices (
                    id, invoice_number, order_id,
                    subtotal_cents, discount_cents, tax_cents,
                    shipping_cost_cents, total_cents,
                    issued_at, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&invoice.id)
            .bind(&invoice.invoice_number)
            .bind(&invoice.order_id)
            .bind(invoice.subtotal_cents)
            .bind(invoice.discount_cents)
            .bind(invoice.tax_cents)
            .bind(invoice.shipping_cost_cents)
            .bind(invoice.total_cents)
            .bind(invoice.issued_at)
            .bind(invoice.created_at)
            .execute(&self.pool)
            .await
            .map_err(DbError::from);

            match result {
                Ok(_) => {
                    debug!(
                        invoice_number = %invoice.invoice_number,
                        order_id = %order.id,
                        "Invoice issued"
                    );
                    return Ok(invoice);
                }
                Err(DbError::UniqueViolation { field, .. })
                    if field.contains("invoice_number") =>
                {
                    debug!(attempt, "Invoice number collision, re-allocating");
                    continue;
                }
                Err(DbError::UniqueViolation { field, .. }) if field.contains("order_id") => {
                    return Err(DbError::duplicate("invoice for order", &order.id));
                }
                Err(err) => return Err(err),
            }
        }

        Err(DbError::NumberingExhausted {
            prefix: INVOICE_PREFIX.to_string(),
            attempts: MAX_NUMBERING_ATTEMPTS,
        })
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = ?1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Gets the invoice for an order, if one has been issued.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE order_id = ?1",
            INVOICE_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::order::insert_order_on;
    use bazaar_core::{OrderStatus, PaymentStatus, ShippingStatus};

    fn test_order(number: &str) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            order_number: number.to_string(),
            customer_id: "cust-1".to_string(),
            coupon_code: Some("TEN".to_string()),
            subtotal_cents: 100_000,
            discount_cents: 10_000,
            tax_cents: 9_000,
            shipping_cost_cents: 599,
            total_cents: 99_599,
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

    #[tokio::test]
    async fn test_invoice_mirrors_order_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000001");
        insert_order_on(db.pool(), &order).await.unwrap();

        let invoice = db
            .invoices()
            .issue_for_order(&order, Utc::now())
            .await
            .unwrap();

        assert!(invoice.invoice_number.starts_with("INV-"));
        assert_eq!(invoice.subtotal_cents, order.subtotal_cents);
        assert_eq!(invoice.discount_cents, order.discount_cents);
        assert_eq!(invoice.tax_cents, order.tax_cents);
        assert_eq!(invoice.shipping_cost_cents, order.shipping_cost_cents);
        assert_eq!(invoice.total_cents, order.total_cents);
        assert!(invoice.verify_totals());

        let found = db
            .invoices()
            .get_by_order(&order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.invoice_number, invoice.invoice_number);
    }

    #[tokio::test]
    async fn test_second_invoice_for_same_order_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = test_order("ORD-20260806-000002");
        insert_order_on(db.pool(), &order).await.unwrap();

        db.invoices()
            .issue_for_order(&order, Utc::now())
            .await
            .unwrap();

        let err = db
            .invoices()
            .issue_for_order(&order, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Still exactly one invoice
        assert!(db.invoices().get_by_order(&order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential_per_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let a = test_order("ORD-20260806-000003");
        let b = test_order("ORD-20260806-000004");
        insert_order_on(db.pool(), &a).await.unwrap();
        insert_order_on(db.pool(), &b).await.unwrap();

        let first = db.invoices().issue_for_order(&a, now).await.unwrap();
        let second = db.invoices().issue_for_order(&b, now).await.unwrap();
        assert!(first.invoice_number < second.invoice_number);
    }
}

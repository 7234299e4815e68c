//! # Document Numbering
//!
//! Produces unique, sortable, human-legible identifiers for persisted
//! financial documents.
//!
//! ## Format Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Document Numbers                                     │
//! │                                                                         │
//! │   ORD-20260806-000042        INV-20260806-000042                       │
//! │   ─┬─ ───┬──── ──┬───                                                  │
//! │    │     │       └── per-day sequence, zero-padded to 6 digits         │
//! │    │     └── UTC date of creation (YYYYMMDD)                           │
//! │    └── document kind prefix                                            │
//! │                                                                         │
//! │  Allocation:                                                            │
//! │    INSERT INTO document_counters ... ON CONFLICT DO UPDATE              │
//! │      SET next_seq = next_seq + 1 RETURNING next_seq                    │
//! │                                                                         │
//! │  One statement = one atomic allocation. Two checkouts on two           │
//! │  connections can never observe the same sequence value, so the         │
//! │  unique index on order_number/invoice_number is a backstop, not        │
//! │  the mechanism. On the (effectively unreachable) index conflict the    │
//! │  caller re-allocates, bounded by MAX_NUMBERING_ATTEMPTS.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbers are assigned once at document creation and never regenerated or
//! mutated afterwards.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::error::DbResult;

/// Prefix for order numbers.
pub const ORDER_PREFIX: &str = "ORD";

/// Prefix for invoice numbers.
pub const INVOICE_PREFIX: &str = "INV";

/// How many freshly allocated numbers an insert will try before giving up
/// with [`crate::error::DbError::NumberingExhausted`].
pub const MAX_NUMBERING_ATTEMPTS: u32 = 3;

/// Formats a document number from its parts.
///
/// Sequences beyond 999999 widen past six digits rather than wrap - a wrap
/// would re-issue an earlier number.
///
/// ## Example
/// ```rust
/// use bazaar_db::numbering::format_document_number;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
/// assert_eq!(format_document_number("ORD", now, 42), "ORD-20260806-000042");
/// ```
pub fn format_document_number(prefix: &str, now: DateTime<Utc>, seq: i64) -> String {
    format!("{}-{}-{:06}", prefix, now.format("%Y%m%d"), seq)
}

/// Atomically allocates the next sequence for `(prefix, day)` and returns
/// the formatted document number.
///
/// Takes any SQLite executor so the allocation can run inside the checkout
/// transaction or standalone on the pool.
pub async fn next_number<'e, E>(executor: E, prefix: &str, now: DateTime<Utc>) -> DbResult<String>
where
    E: Executor<'e, Database = Sqlite>,
{
    let day = now.format("%Y%m%d").to_string();

    // Single-statement UPSERT: insert the day's counter at 1, or bump it.
    // RETURNING hands back the value this caller owns exclusively.
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_counters (prefix, day, next_seq)
        VALUES (?1, ?2, 1)
        ON CONFLICT (prefix, day) DO UPDATE SET next_seq = next_seq + 1
        RETURNING next_seq
        "#,
    )
    .bind(prefix)
    .bind(&day)
    .fetch_one(executor)
    .await?;

    Ok(format_document_number(prefix, now, seq))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_contract() {
        let now = fixed_now();
        assert_eq!(format_document_number("ORD", now, 1), "ORD-20260806-000001");
        assert_eq!(
            format_document_number("INV", now, 123_456),
            "INV-20260806-123456"
        );
        // Beyond six digits widens instead of wrapping
        assert_eq!(
            format_document_number("ORD", now, 1_000_001),
            "ORD-20260806-1000001"
        );
    }

    #[tokio::test]
    async fn test_sequences_increment_per_prefix_and_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = fixed_now();

        let first = next_number(db.pool(), ORDER_PREFIX, now).await.unwrap();
        let second = next_number(db.pool(), ORDER_PREFIX, now).await.unwrap();
        assert_eq!(first, "ORD-20260806-000001");
        assert_eq!(second, "ORD-20260806-000002");

        // Invoice counter is independent
        let inv = next_number(db.pool(), INVOICE_PREFIX, now).await.unwrap();
        assert_eq!(inv, "INV-20260806-000001");

        // A new day starts a fresh sequence
        let tomorrow = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 1).unwrap();
        let next_day = next_number(db.pool(), ORDER_PREFIX, tomorrow).await.unwrap();
        assert_eq!(next_day, "ORD-20260807-000001");
    }

    #[tokio::test]
    async fn test_concurrent_allocations_never_collide() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = fixed_now();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                next_number(db.pool(), ORDER_PREFIX, now).await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let number = handle.await.unwrap();
            assert!(seen.insert(number.clone()), "duplicate number {}", number);
        }
        assert_eq!(seen.len(), 20);
    }
}

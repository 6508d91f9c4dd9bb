//! # Sequences
//!
//! Per-school counters behind serial and receipt numbers.
//!
//! ```text
//! document_sequences
//! school_id │ kind        │ period     │ last_value
//! ──────────┼─────────────┼────────────┼───────────
//! s-1       │ admit_card  │ 2026-10-19 │ 40
//! s-1       │ rct         │ 2026-10-01 │ 117
//! ```
//!
//! The upsert takes a row lock, so two batches for the same school and day
//! queue behind each other and never hand out the same number.

use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::error::DbResult;

/// Counter key for fee receipts, numbered per month.
///
/// Document kinds use their slug as key; this one cannot collide with a slug.
pub const FEE_RECEIPT: &str = "rct";

/// Reserves `count` consecutive values and returns the first.
///
/// Must run inside the caller's transaction so the reservation rolls back
/// with the documents it numbers.
pub async fn reserve(
    conn: &mut PgConnection,
    school_id: &str,
    kind: &str,
    period: NaiveDate,
    count: i64,
) -> DbResult<i64> {
    let last: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_sequences (school_id, kind, period, last_value)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (school_id, kind, period)
        DO UPDATE SET last_value = document_sequences.last_value + EXCLUDED.last_value
        RETURNING last_value
        "#,
    )
    .bind(school_id)
    .bind(kind)
    .bind(period)
    .bind(count)
    .fetch_one(&mut *conn)
    .await?;

    Ok(last - count + 1)
}

//! # Fee Repository
//!
//! Fee receipts. Receipt numbers run per school per calendar month:
//! `RCT-108254-202610-00001`, `RCT-108254-202610-00002`, ...

use chrono::{Datelike, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, sequence, StudentRepository};
use shikkha_core::{receipt_number, FeeReceipt, NewFeeReceipt, Page, School};

const RECEIPT_COLUMNS: &str = r#"
    id, school_id, student_id, receipt_number, fee_type, amount_paisa, waiver_paisa,
    month, payment_method, note, received_by, created_at
"#;

/// Repository for fee receipt database operations.
#[derive(Debug, Clone)]
pub struct FeeRepository {
    pool: PgPool,
}

impl FeeRepository {
    pub fn new(pool: PgPool) -> Self {
        FeeRepository { pool }
    }

    /// Records a payment and issues its receipt number.
    ///
    /// `amount_paisa` on the receipt is the amount collected after the waiver.
    pub async fn create(
        &self,
        school: &School,
        new: &NewFeeReceipt,
        received_by: Option<&str>,
    ) -> DbResult<FeeReceipt> {
        new.validate()?;

        StudentRepository::new(self.pool.clone())
            .get_by_id(&school.id, &new.student_id)
            .await?
            .ok_or_else(|| DbError::not_found("Student", new.student_id.as_str()))?;

        let (collected, waived) = new.split();
        let today = Utc::now().date_naive();
        let period = today.with_day(1).unwrap_or(today);

        let mut tx = self.pool.begin().await?;

        let seq = sequence::reserve(&mut *tx, &school.id, sequence::FEE_RECEIPT, period, 1).await?;
        let number = receipt_number(&school.code(), today, seq);

        let receipt = sqlx::query_as::<_, FeeReceipt>(&format!(
            r#"
            INSERT INTO fee_receipts (
                id, school_id, student_id, receipt_number, fee_type, amount_paisa,
                waiver_paisa, month, payment_method, note, received_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {RECEIPT_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&school.id)
        .bind(&new.student_id)
        .bind(&number)
        .bind(new.fee_type.trim())
        .bind(collected.paisa())
        .bind(waived.paisa())
        .bind(new.month.as_deref().map(str::trim))
        .bind(new.payment_method)
        .bind(&new.note)
        .bind(received_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("receipt_number", &number))?;

        tx.commit().await?;

        info!(
            school_id = %school.id,
            receipt = %number,
            amount = %collected,
            "Fee receipt issued"
        );
        Ok(receipt)
    }

    pub async fn get_by_id(&self, school_id: &str, id: &str) -> DbResult<Option<FeeReceipt>> {
        let receipt = sqlx::query_as::<_, FeeReceipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM fee_receipts WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receipt)
    }

    /// Receipts, newest first, optionally for one student or billing month.
    pub async fn list(
        &self,
        school_id: &str,
        student_id: Option<&str>,
        month: Option<&str>,
        page: Page,
    ) -> DbResult<Vec<FeeReceipt>> {
        let receipts = sqlx::query_as::<_, FeeReceipt>(&format!(
            r#"
            SELECT {RECEIPT_COLUMNS} FROM fee_receipts
            WHERE school_id = $1
              AND ($2::text IS NULL OR student_id = $2)
              AND ($3::text IS NULL OR month = $3)
            ORDER BY created_at DESC, receipt_number DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(school_id)
        .bind(student_id)
        .bind(month)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(receipts)
    }
}

//! # Dashboard Repository
//!
//! Admin dashboard counters, read in one round trip. "This month" is the
//! current calendar month in UTC.

use sqlx::PgPool;
use tracing::debug;

use crate::error::DbResult;
use shikkha_core::DashboardStats;

/// Repository for dashboard queries.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        DashboardRepository { pool }
    }

    pub async fn stats(&self, school_id: &str) -> DbResult<DashboardStats> {
        debug!(school_id = %school_id, "Loading dashboard stats");

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            WITH month AS (
                SELECT date_trunc('month', now() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS start
            )
            SELECT
                (SELECT COUNT(*) FROM students WHERE school_id = $1) AS total_students,
                (SELECT COUNT(*) FROM students WHERE school_id = $1 AND is_active) AS active_students,
                (SELECT COUNT(*) FROM teachers WHERE school_id = $1 AND is_active) AS total_teachers,
                (SELECT COUNT(*) FROM generated_documents WHERE school_id = $1) AS documents_generated,
                (SELECT COUNT(*) FROM generated_documents, month
                    WHERE school_id = $1 AND created_at >= month.start) AS documents_this_month,
                COALESCE((SELECT current_credits FROM credit_balances WHERE school_id = $1), 0) AS current_credits,
                COALESCE((SELECT used_credits FROM credit_balances WHERE school_id = $1), 0) AS used_credits,
                COALESCE((SELECT SUM(amount_paisa) FROM fee_receipts, month
                    WHERE school_id = $1 AND created_at >= month.start), 0)::BIGINT
                    AS fees_collected_this_month_paisa,
                (SELECT COUNT(*) FROM library_books WHERE school_id = $1) AS library_books,
                (SELECT COUNT(*) FROM book_issues WHERE school_id = $1 AND returned_at IS NULL) AS books_on_loan,
                (SELECT COUNT(*) FROM book_issues
                    WHERE school_id = $1 AND returned_at IS NULL AND due_date < CURRENT_DATE) AS overdue_issues,
                (SELECT COUNT(*) FROM inventory_items
                    WHERE school_id = $1 AND quantity <= min_quantity) AS low_stock_items,
                (SELECT COUNT(*) FROM transport_routes WHERE school_id = $1 AND is_active) AS transport_routes
            "#,
        )
        .bind(school_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

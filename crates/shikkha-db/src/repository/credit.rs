//! # Credit Repository
//!
//! Balance and ledger for document credits.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add / purchase                      spend (inside generation tx)       │
//! │  ───────────────                     ─────────────────────────────      │
//! │  SELECT ... FOR UPDATE               UPDATE credit_balances             │
//! │  apply_purchase() in core              SET current -= cost              │
//! │  UPDATE balance                        WHERE current >= cost            │
//! │  INSERT ledger row                   RETURNING current                  │
//! │  COMMIT                              INSERT ledger row                  │
//! │                                      (caller inserts documents, COMMIT) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A spend that finds no row to update means the balance was too low at that
//! instant; the caller's transaction rolls back with no document written.

use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::credits::{
    apply_purchase, apply_spend, find_package, CreditBalance, CreditTransaction,
    CreditTransactionKind, Credits,
};
use shikkha_core::Page;

const BALANCE_COLUMNS: &str = "school_id, current_credits, used_credits, updated_at";

const TRANSACTION_COLUMNS: &str = r#"
    id, school_id, kind, amount, balance_after, reference, description, created_by, created_at
"#;

/// Ledger row fields supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct LedgerEntry<'a> {
    pub reference: Option<&'a str>,
    pub description: Option<&'a str>,
    pub created_by: Option<&'a str>,
}

/// Repository for credit database operations.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: PgPool,
}

impl CreditRepository {
    pub fn new(pool: PgPool) -> Self {
        CreditRepository { pool }
    }

    /// Current balance of a school.
    pub async fn balance(&self, school_id: &str) -> DbResult<CreditBalance> {
        sqlx::query_as::<_, CreditBalance>(&format!(
            "SELECT {BALANCE_COLUMNS} FROM credit_balances WHERE school_id = $1"
        ))
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Credit balance", school_id))
    }

    /// Ledger rows, newest first.
    pub async fn transactions(&self, school_id: &str, page: Page) -> DbResult<Vec<CreditTransaction>> {
        let rows = sqlx::query_as::<_, CreditTransaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM credit_transactions
            WHERE school_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(school_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Buys a credit package. The ledger reference is the package code.
    pub async fn purchase(
        &self,
        school_id: &str,
        package_code: &str,
        created_by: Option<&str>,
    ) -> DbResult<CreditTransaction> {
        let package = find_package(package_code)?;
        let description = format!("{} package ({})", package.name, package.price());
        self.add(
            school_id,
            package.credits,
            CreditTransactionKind::Purchase,
            LedgerEntry {
                reference: Some(package.code),
                description: Some(&description),
                created_by,
            },
        )
        .await
    }

    /// Adds credits to a school: balance update and ledger row in one transaction.
    ///
    /// ## Errors
    /// - `CoreError::Validation` when `amount` is not positive
    /// - `CoreError::CreditOverflow` if the balance would overflow
    /// - `DbError::NotFound` for an unknown school
    pub async fn add(
        &self,
        school_id: &str,
        amount: i64,
        kind: CreditTransactionKind,
        entry: LedgerEntry<'_>,
    ) -> DbResult<CreditTransaction> {
        let mut tx = self.pool.begin().await?;

        let current: i64 = sqlx::query_scalar(
            "SELECT current_credits FROM credit_balances WHERE school_id = $1 FOR UPDATE",
        )
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Credit balance", school_id))?;

        let updated = apply_purchase(Credits::new(current)?, amount)?;

        sqlx::query(
            "UPDATE credit_balances SET current_credits = $2, updated_at = now() WHERE school_id = $1",
        )
        .bind(school_id)
        .bind(updated.value())
        .execute(&mut *tx)
        .await?;

        let row = insert_ledger_row(&mut *tx, school_id, kind, amount, updated.value(), &entry).await?;

        tx.commit().await?;

        info!(
            school_id = %school_id,
            amount,
            balance_after = updated.value(),
            kind = kind.as_str(),
            "Credits added"
        );
        Ok(row)
    }
}

/// Spends `cost` credits inside the caller's transaction.
///
/// Returns the balance after the spend.
///
/// ## Errors
/// `CoreError::InsufficientCredits` when the balance is below `cost`.
pub(crate) async fn spend(
    conn: &mut PgConnection,
    school_id: &str,
    cost: Credits,
    entry: &LedgerEntry<'_>,
) -> DbResult<i64> {
    debug!(school_id = %school_id, cost = cost.value(), "Spending credits");

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE credit_balances
        SET current_credits = current_credits - $2,
            used_credits = used_credits + $2,
            updated_at = now()
        WHERE school_id = $1 AND current_credits >= $2
        RETURNING current_credits
        "#,
    )
    .bind(school_id)
    .bind(cost.value())
    .fetch_optional(&mut *conn)
    .await?;

    let remaining = match remaining {
        Some(balance) => balance,
        None => {
            let available: i64 = sqlx::query_scalar(
                "SELECT current_credits FROM credit_balances WHERE school_id = $1",
            )
            .bind(school_id)
            .fetch_optional(&mut *conn)
            .await?
            .unwrap_or(0);

            warn!(school_id = %school_id, required = cost.value(), available, "Insufficient credits");
            // Reports the shortfall with the balance seen just now
            apply_spend(Credits::new(available)?, cost)?;
            return Err(DbError::TransactionFailed(
                "credit balance changed during spend".to_string(),
            ));
        }
    };

    insert_ledger_row(
        conn,
        school_id,
        CreditTransactionKind::Spend,
        -cost.value(),
        remaining,
        entry,
    )
    .await?;

    Ok(remaining)
}

async fn insert_ledger_row(
    conn: &mut PgConnection,
    school_id: &str,
    kind: CreditTransactionKind,
    amount: i64,
    balance_after: i64,
    entry: &LedgerEntry<'_>,
) -> DbResult<CreditTransaction> {
    let row = sqlx::query_as::<_, CreditTransaction>(&format!(
        r#"
        INSERT INTO credit_transactions (id, school_id, kind, amount, balance_after, reference, description, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(new_id())
    .bind(school_id)
    .bind(kind)
    .bind(amount)
    .bind(balance_after)
    .bind(entry.reference)
    .bind(entry.description)
    .bind(entry.created_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

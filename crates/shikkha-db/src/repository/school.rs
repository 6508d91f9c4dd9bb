//! # School Repository
//!
//! Tenants. Creating a school also opens its credit balance at zero so every
//! later ledger operation can assume the row exists.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::{NewSchool, School, SchoolUpdate};

const SCHOOL_COLUMNS: &str = r#"
    id, name, name_bn, eiin, address, phone, email, logo_url,
    principal_name, is_active, created_at, updated_at
"#;

/// Repository for school database operations.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    pool: PgPool,
}

impl SchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        SchoolRepository { pool }
    }

    /// Gets a school by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(School))` - School found
    /// * `Ok(None)` - School not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<School>> {
        let school = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(school)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing school is an error.
    pub async fn require(&self, id: &str) -> DbResult<School> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("School", id))
    }

    /// Lists schools by name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<School>> {
        let schools = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE is_active OR $1 ORDER BY name"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = schools.len(), "Listed schools");
        Ok(schools)
    }

    /// Creates a school and its zero credit balance in one transaction.
    pub async fn create(&self, new: &NewSchool) -> DbResult<School> {
        let id = new_id();
        let eiin = new.eiin.as_deref().map(str::trim).filter(|e| !e.is_empty());

        let mut tx = self.pool.begin().await?;

        let school = sqlx::query_as::<_, School>(&format!(
            r#"
            INSERT INTO schools (id, name, name_bn, eiin, address, phone, email, logo_url, principal_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SCHOOL_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(new.name.trim())
        .bind(&new.name_bn)
        .bind(eiin)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.logo_url)
        .bind(&new.principal_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("eiin", eiin.unwrap_or_default()))?;

        sqlx::query("INSERT INTO credit_balances (school_id) VALUES ($1)")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(school_id = %id, name = %school.name, "School created");
        Ok(school)
    }

    /// Applies a partial update. Absent fields keep their value.
    pub async fn update(&self, id: &str, update: &SchoolUpdate) -> DbResult<School> {
        let eiin = update.eiin.as_deref().map(str::trim).filter(|e| !e.is_empty());

        let school = sqlx::query_as::<_, School>(&format!(
            r#"
            UPDATE schools SET
                name = COALESCE($2, name),
                name_bn = COALESCE($3, name_bn),
                eiin = COALESCE($4, eiin),
                address = COALESCE($5, address),
                phone = COALESCE($6, phone),
                email = COALESCE($7, email),
                logo_url = COALESCE($8, logo_url),
                principal_name = COALESCE($9, principal_name),
                is_active = COALESCE($10, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING {SCHOOL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.name_bn)
        .bind(eiin)
        .bind(&update.address)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.logo_url)
        .bind(&update.principal_name)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("eiin", eiin.unwrap_or_default()))?
        .ok_or_else(|| DbError::not_found("School", id))?;

        info!(school_id = %id, "School updated");
        Ok(school)
    }
}

//! # User Repository
//!
//! Portal logins. The password hash never leaves this module except through
//! [`UserCredentials`], which the login handler verifies and drops.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::{NewUser, Role, User, ValidationError};

const USER_COLUMNS: &str = r#"
    id, school_id, email, full_name, role, phone, is_active, created_at, last_login_at
"#;

/// A user row together with its password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Looks a login up by email (case-insensitive), hash included.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<UserCredentials>> {
        debug!("Looking up credentials");
        let creds = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(creds)
    }

    /// Lists users of one school, or every user when `school_id` is `None`.
    pub async fn list(&self, school_id: Option<&str>) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE $1::text IS NULL OR school_id = $1
            ORDER BY role, full_name
            "#
        ))
        .bind(school_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Creates a user. `password_hash` is produced by the caller.
    ///
    /// ## Errors
    /// - `DbError::UniqueViolation` on a taken email
    /// - `DbError::CheckViolation` for a non-developer without a school
    pub async fn create(
        &self,
        school_id: Option<&str>,
        new: &NewUser,
        password_hash: &str,
    ) -> DbResult<User> {
        match (new.role.requires_school(), school_id) {
            (true, None) => return Err(ValidationError::required("school_id").into()),
            (false, Some(_)) => {
                return Err(ValidationError::invalid("school_id", "developer accounts belong to no school").into())
            }
            _ => {}
        }

        let id = new_id();
        let email = new.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, school_id, email, password_hash, full_name, role, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(school_id)
        .bind(&email)
        .bind(password_hash)
        .bind(new.full_name.trim())
        .bind(new.role)
        .bind(&new.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("email", &email))?;

        info!(user_id = %id, role = %new.role.as_str(), "User created");
        Ok(user)
    }

    /// Stamps a successful login.
    pub async fn record_login(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    /// Number of active developers; the seed uses this to bootstrap once.
    pub async fn count_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1 AND is_active")
                .bind(role)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

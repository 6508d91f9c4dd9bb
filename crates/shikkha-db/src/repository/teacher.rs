//! # Teacher Repository

use sqlx::PgPool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{ensure_linked_user, new_id};
use shikkha_core::{NewTeacher, Page, Role, Teacher, TeacherUpdate};

const TEACHER_COLUMNS: &str = r#"
    id, school_id, teacher_code, name, name_bn, designation, subject, phone, email,
    joining_date, photo_url, user_id, is_active, created_at, updated_at
"#;

/// Repository for teacher database operations.
#[derive(Debug, Clone)]
pub struct TeacherRepository {
    pool: PgPool,
}

impl TeacherRepository {
    pub fn new(pool: PgPool) -> Self {
        TeacherRepository { pool }
    }

    pub async fn get_by_id(&self, school_id: &str, id: &str) -> DbResult<Option<Teacher>> {
        let teacher = sqlx::query_as::<_, Teacher>(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(teacher)
    }

    pub async fn list(&self, school_id: &str, include_inactive: bool, page: Page) -> DbResult<Vec<Teacher>> {
        let teachers = sqlx::query_as::<_, Teacher>(&format!(
            r#"
            SELECT {TEACHER_COLUMNS} FROM teachers
            WHERE school_id = $1 AND (is_active OR $2)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(school_id)
        .bind(include_inactive)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(teachers)
    }

    /// Fetches the listed active teachers, failing on the first missing id.
    pub async fn get_many(&self, school_id: &str, ids: &[String]) -> DbResult<Vec<Teacher>> {
        let teachers = sqlx::query_as::<_, Teacher>(&format!(
            r#"
            SELECT {TEACHER_COLUMNS} FROM teachers
            WHERE school_id = $1 AND id = ANY($2) AND is_active
            ORDER BY name
            "#
        ))
        .bind(school_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        if let Some(missing) = ids.iter().find(|id| !teachers.iter().any(|t| &t.id == *id)) {
            return Err(DbError::not_found("Teacher", missing.as_str()));
        }
        Ok(teachers)
    }

    /// The teacher record linked to a teacher-portal login.
    pub async fn by_user(&self, school_id: &str, user_id: &str) -> DbResult<Option<Teacher>> {
        let teacher = sqlx::query_as::<_, Teacher>(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE school_id = $1 AND user_id = $2 AND is_active"
        ))
        .bind(school_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(teacher)
    }

    pub async fn create(&self, school_id: &str, new: &NewTeacher) -> DbResult<Teacher> {
        if let Some(user_id) = new.user_id.as_deref() {
            ensure_linked_user(&self.pool, school_id, "user_id", user_id, Role::Teacher).await?;
        }

        let id = new_id();
        let code = new.teacher_code.trim();

        let teacher = sqlx::query_as::<_, Teacher>(&format!(
            r#"
            INSERT INTO teachers (
                id, school_id, teacher_code, name, name_bn, designation, subject,
                phone, email, joining_date, photo_url, user_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {TEACHER_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(school_id)
        .bind(code)
        .bind(new.name.trim())
        .bind(&new.name_bn)
        .bind(&new.designation)
        .bind(&new.subject)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.joining_date)
        .bind(&new.photo_url)
        .bind(&new.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("teacher_code", code))?;

        info!(school_id = %school_id, teacher_id = %id, "Teacher created");
        Ok(teacher)
    }

    pub async fn update(&self, school_id: &str, id: &str, update: &TeacherUpdate) -> DbResult<Teacher> {
        let teacher = sqlx::query_as::<_, Teacher>(&format!(
            r#"
            UPDATE teachers SET
                name = COALESCE($3, name),
                name_bn = COALESCE($4, name_bn),
                designation = COALESCE($5, designation),
                subject = COALESCE($6, subject),
                phone = COALESCE($7, phone),
                email = COALESCE($8, email),
                joining_date = COALESCE($9, joining_date),
                photo_url = COALESCE($10, photo_url),
                is_active = COALESCE($11, is_active),
                updated_at = now()
            WHERE school_id = $1 AND id = $2
            RETURNING {TEACHER_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.name_bn)
        .bind(&update.designation)
        .bind(&update.subject)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(update.joining_date)
        .bind(&update.photo_url)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Teacher", id))?;

        info!(school_id = %school_id, teacher_id = %id, "Teacher updated");
        Ok(teacher)
    }

    /// Deactivates a teacher; issued documents keep their history.
    pub async fn deactivate(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE teachers SET is_active = FALSE, updated_at = now() WHERE school_id = $1 AND id = $2",
        )
        .bind(school_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Teacher", id));
        }
        info!(school_id = %school_id, teacher_id = %id, "Teacher deactivated");
        Ok(())
    }
}

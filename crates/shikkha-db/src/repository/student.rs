//! # Student Repository
//!
//! Student records, scoped by school.
//!
//! ## Lookups
//! ```text
//! list(school, filter)        admin/teacher directory, paged
//! get_many(school, ids)       document and admit-card batches
//! in_class(school, class)     admit cards for a whole class
//! by_user / children_of       student and parent portals, within the caller's school
//! ```
//!
//! Deleting a student only deactivates the row; fee receipts and generated
//! documents keep pointing at it.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{ensure_linked_user, new_id};
use shikkha_core::{NewStudent, Role, Student, StudentFilter, StudentUpdate};

pub(crate) const STUDENT_COLUMNS: &str = r#"
    id, school_id, student_code, name, name_bn, class_name, section, roll_number,
    father_name, mother_name, guardian_phone, date_of_birth, blood_group, address,
    photo_url, user_id, parent_user_id, is_active, created_at, updated_at
"#;

const ORDER: &str = "ORDER BY class_name, section NULLS FIRST, roll_number NULLS LAST, name";

/// Repository for student database operations.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        StudentRepository { pool }
    }

    pub async fn get_by_id(&self, school_id: &str, id: &str) -> DbResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Lists students matching `filter`.
    ///
    /// `search` matches the English name, the Bangla name or the student code.
    pub async fn list(&self, school_id: &str, filter: &StudentFilter) -> DbResult<Vec<Student>> {
        let page = filter.page();
        let pattern = filter.search_pattern();

        debug!(school_id = %school_id, class = ?filter.class_name, search = ?pattern, "Listing students");

        let students = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students
            WHERE school_id = $1
              AND ($2::text IS NULL OR class_name = $2)
              AND ($3::text IS NULL OR section = $3)
              AND ($4::text IS NULL OR name ILIKE $4 OR name_bn ILIKE $4 OR student_code ILIKE $4)
              AND (is_active OR $5)
            {ORDER}
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(school_id)
        .bind(filter.class_name.as_deref().map(str::trim))
        .bind(filter.section.as_deref().map(str::trim))
        .bind(pattern)
        .bind(filter.include_inactive)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    /// Fetches the listed students of one school.
    ///
    /// ## Errors
    /// `DbError::NotFound` naming the first id that is missing, inactive or
    /// belongs to another school.
    pub async fn get_many(&self, school_id: &str, ids: &[String]) -> DbResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students
            WHERE school_id = $1 AND id = ANY($2) AND is_active
            {ORDER}
            "#
        ))
        .bind(school_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        if let Some(missing) = ids.iter().find(|id| !students.iter().any(|s| &s.id == *id)) {
            return Err(DbError::not_found("Student", missing.as_str()));
        }
        Ok(students)
    }

    /// Active students of a class, optionally narrowed to a section.
    pub async fn in_class(
        &self,
        school_id: &str,
        class_name: &str,
        section: Option<&str>,
    ) -> DbResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students
            WHERE school_id = $1 AND class_name = $2
              AND ($3::text IS NULL OR section = $3)
              AND is_active
            {ORDER}
            "#
        ))
        .bind(school_id)
        .bind(class_name.trim())
        .bind(section)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    /// The student record linked to a student-portal login.
    pub async fn by_user(&self, school_id: &str, user_id: &str) -> DbResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE school_id = $1 AND user_id = $2 AND is_active"
        ))
        .bind(school_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Children linked to a parent-portal login.
    pub async fn children_of(&self, school_id: &str, parent_user_id: &str) -> DbResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE school_id = $1 AND parent_user_id = $2 AND is_active {ORDER}"
        ))
        .bind(school_id)
        .bind(parent_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    pub async fn create(&self, school_id: &str, new: &NewStudent) -> DbResult<Student> {
        if let Some(user_id) = new.user_id.as_deref() {
            ensure_linked_user(&self.pool, school_id, "user_id", user_id, Role::Student).await?;
        }
        if let Some(parent) = new.parent_user_id.as_deref() {
            ensure_linked_user(&self.pool, school_id, "parent_user_id", parent, Role::Parent).await?;
        }

        let id = new_id();
        let code = new.student_code.trim();

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (
                id, school_id, student_code, name, name_bn, class_name, section, roll_number,
                father_name, mother_name, guardian_phone, date_of_birth, blood_group, address,
                photo_url, user_id, parent_user_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(school_id)
        .bind(code)
        .bind(new.name.trim())
        .bind(&new.name_bn)
        .bind(new.class_name.trim())
        .bind(&new.section)
        .bind(new.roll_number)
        .bind(&new.father_name)
        .bind(&new.mother_name)
        .bind(&new.guardian_phone)
        .bind(new.date_of_birth)
        .bind(&new.blood_group)
        .bind(&new.address)
        .bind(&new.photo_url)
        .bind(&new.user_id)
        .bind(&new.parent_user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("student_code", code))?;

        info!(school_id = %school_id, student_id = %id, code = %code, "Student created");
        Ok(student)
    }

    /// Applies a partial update. Absent fields keep their value.
    pub async fn update(&self, school_id: &str, id: &str, update: &StudentUpdate) -> DbResult<Student> {
        if let Some(parent) = update.parent_user_id.as_deref() {
            ensure_linked_user(&self.pool, school_id, "parent_user_id", parent, Role::Parent).await?;
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students SET
                name = COALESCE($3, name),
                name_bn = COALESCE($4, name_bn),
                class_name = COALESCE($5, class_name),
                section = COALESCE($6, section),
                roll_number = COALESCE($7, roll_number),
                father_name = COALESCE($8, father_name),
                mother_name = COALESCE($9, mother_name),
                guardian_phone = COALESCE($10, guardian_phone),
                date_of_birth = COALESCE($11, date_of_birth),
                blood_group = COALESCE($12, blood_group),
                address = COALESCE($13, address),
                photo_url = COALESCE($14, photo_url),
                parent_user_id = COALESCE($15, parent_user_id),
                is_active = COALESCE($16, is_active),
                updated_at = now()
            WHERE school_id = $1 AND id = $2
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.name_bn)
        .bind(update.class_name.as_deref().map(str::trim))
        .bind(&update.section)
        .bind(update.roll_number)
        .bind(&update.father_name)
        .bind(&update.mother_name)
        .bind(&update.guardian_phone)
        .bind(update.date_of_birth)
        .bind(&update.blood_group)
        .bind(&update.address)
        .bind(&update.photo_url)
        .bind(&update.parent_user_id)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Student", id))?;

        info!(school_id = %school_id, student_id = %id, "Student updated");
        Ok(student)
    }

    /// Deactivates a student.
    pub async fn deactivate(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE students SET is_active = FALSE, updated_at = now() WHERE school_id = $1 AND id = $2",
        )
        .bind(school_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Student", id));
        }
        info!(school_id = %school_id, student_id = %id, "Student deactivated");
        Ok(())
    }
}

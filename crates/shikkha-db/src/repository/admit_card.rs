//! # Admit Card Repository
//!
//! Exam admit cards for a class. A card is unique per (student, exam, year);
//! generating again reprints it with a fresh serial and charges again.

use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::document::{issue_batch, merge_values, DocumentTarget};
use crate::repository::template::TemplateRepository;
use crate::repository::{new_id, StudentRepository};
use shikkha_core::error::ValidationError;
use shikkha_core::{AdmitCard, AdmitCardBatchRequest, AdmitCardBatchResponse, DocumentKind, Page, School};

const ADMIT_CARD_COLUMNS: &str = r#"
    id, school_id, student_id, exam_name, exam_year, class_name, roll_number,
    exam_center, instructions, serial_number, created_at
"#;

/// Repository for admit card database operations.
#[derive(Debug, Clone)]
pub struct AdmitCardRepository {
    pool: PgPool,
}

impl AdmitCardRepository {
    pub fn new(pool: PgPool) -> Self {
        AdmitCardRepository { pool }
    }

    /// Generates admit cards for a class (or the listed students).
    ///
    /// Cards, generated-document rows and the credit spend commit together.
    pub async fn generate(
        &self,
        school: &School,
        request: &AdmitCardBatchRequest,
        created_by: Option<&str>,
    ) -> DbResult<AdmitCardBatchResponse> {
        request.validate()?;

        let students_repo = StudentRepository::new(self.pool.clone());
        let students = match &request.student_ids {
            Some(ids) => students_repo.get_many(&school.id, ids).await?,
            None => {
                students_repo
                    .in_class(&school.id, &request.class_name, request.section.as_deref())
                    .await?
            }
        };
        if students.is_empty() {
            return Err(ValidationError::invalid("class_name", "no active students in this class").into());
        }

        let resolved = TemplateRepository::new(self.pool.clone())
            .resolve(&school.id, DocumentKind::AdmitCard, request.language, None)
            .await?;
        let lang = resolved.spec.language;
        let exam_values = request.document_values();

        let targets: Vec<DocumentTarget> = students
            .iter()
            .map(|s| DocumentTarget {
                student_id: Some(s.id.clone()),
                values: merge_values(&exam_values, s.document_values(lang)),
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        let batch = issue_batch(&mut *tx, school, &resolved, targets, created_by).await?;

        let mut admit_cards = Vec::with_capacity(students.len());
        for (student, output) in students.iter().zip(&batch.documents) {
            let card = sqlx::query_as::<_, AdmitCard>(&format!(
                r#"
                INSERT INTO admit_cards (
                    id, school_id, student_id, exam_name, exam_year, class_name,
                    roll_number, exam_center, instructions, serial_number
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (student_id, exam_name, exam_year) DO UPDATE SET
                    class_name = EXCLUDED.class_name,
                    roll_number = EXCLUDED.roll_number,
                    exam_center = EXCLUDED.exam_center,
                    instructions = EXCLUDED.instructions,
                    serial_number = EXCLUDED.serial_number,
                    created_at = now()
                RETURNING {ADMIT_CARD_COLUMNS}
                "#
            ))
            .bind(new_id())
            .bind(&school.id)
            .bind(&student.id)
            .bind(request.exam_name.trim())
            .bind(request.exam_year)
            .bind(&student.class_name)
            .bind(student.roll_number)
            .bind(&request.exam_center)
            .bind(&request.instructions)
            .bind(&output.document.serial_number)
            .fetch_one(&mut *tx)
            .await?;
            admit_cards.push(card);
        }

        tx.commit().await?;

        info!(
            school_id = %school.id,
            exam = %request.exam_name,
            year = request.exam_year,
            count = admit_cards.len(),
            "Admit cards generated"
        );

        Ok(AdmitCardBatchResponse {
            admit_cards,
            rendered: batch.documents.into_iter().map(|d| d.rendered).collect(),
            credits_charged: batch.credits_charged,
            balance_after: batch.balance_after,
        })
    }

    /// Lists admit cards, optionally for one exam.
    pub async fn list(
        &self,
        school_id: &str,
        exam_name: Option<&str>,
        exam_year: Option<i32>,
        page: Page,
    ) -> DbResult<Vec<AdmitCard>> {
        let cards = sqlx::query_as::<_, AdmitCard>(&format!(
            r#"
            SELECT {ADMIT_CARD_COLUMNS} FROM admit_cards
            WHERE school_id = $1
              AND ($2::text IS NULL OR exam_name = $2)
              AND ($3::int IS NULL OR exam_year = $3)
            ORDER BY exam_year DESC, exam_name, class_name, roll_number NULLS LAST
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(school_id)
        .bind(exam_name)
        .bind(exam_year)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    /// A student's admit cards (student portal).
    pub async fn for_student(&self, school_id: &str, student_id: &str) -> DbResult<Vec<AdmitCard>> {
        let cards = sqlx::query_as::<_, AdmitCard>(&format!(
            r#"
            SELECT {ADMIT_CARD_COLUMNS} FROM admit_cards
            WHERE school_id = $1 AND student_id = $2
            ORDER BY exam_year DESC, created_at DESC
            "#
        ))
        .bind(school_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }
}

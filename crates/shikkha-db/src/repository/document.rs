//! # Document Repository
//!
//! Generation, history and public verification of documents.
//!
//! ## Generation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate(school, request)                                              │
//! │                                                                         │
//! │  validate request, price it (charge_for), resolve template,             │
//! │  load students / teachers                                               │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  1. reserve N serial numbers        (document_sequences)                │
//! │  2. spend credits                   (conditional UPDATE + ledger row)   │
//! │  3. render each document            (Tera, in memory)                   │
//! │  4. INSERT generated_documents × N                                      │
//! │       │  COMMIT                                                         │
//! │       ▼                                                                 │
//! │  any failure before COMMIT: nothing charged, nothing numbered           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::credit::{self, LedgerEntry};
use crate::repository::template::{ResolvedTemplate, TemplateRepository};
use crate::repository::{new_id, sequence, StudentRepository, TeacherRepository};
use shikkha_core::credits::{charge_for, Credits};
use shikkha_core::documents::{self, DocumentContext, RenderedDocument};
use shikkha_core::{
    DocumentKind, DocumentVerification, GenerateDocumentsRequest, GenerateDocumentsResponse,
    GeneratedDocument, GeneratedDocumentOutput, Page, School,
};

const DOCUMENT_COLUMNS: &str = r#"
    id, school_id, kind, template_id, student_id, serial_number, credits_charged,
    payload, created_by, created_at
"#;

/// One document to render: whose it is and the values it prints.
#[derive(Debug, Clone)]
pub(crate) struct DocumentTarget {
    pub student_id: Option<String>,
    pub values: Map<String, Value>,
}

/// Result of [`issue_batch`].
#[derive(Debug)]
pub(crate) struct IssuedBatch {
    pub documents: Vec<GeneratedDocumentOutput>,
    pub credits_charged: i64,
    pub balance_after: i64,
}

/// Filter of `GET /api/documents/history`.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub kind: Option<DocumentKind>,
    pub student_id: Option<String>,
    pub page: Page,
}

/// Repository for document database operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        DocumentRepository { pool }
    }

    /// Generates a batch of documents and charges the school for them.
    ///
    /// One document per listed student and teacher; with neither, a single
    /// document rendered from `request.values`.
    ///
    /// ## Errors
    /// - `CoreError::Validation` for a bad request or a missing required field
    /// - `CoreError::InsufficientCredits` when the balance cannot cover the batch
    /// - `DbError::NotFound` for an unknown student, teacher or template
    pub async fn generate(
        &self,
        school: &School,
        request: &GenerateDocumentsRequest,
        created_by: Option<&str>,
    ) -> DbResult<GenerateDocumentsResponse> {
        request.validate()?;

        let resolved = TemplateRepository::new(self.pool.clone())
            .resolve(
                &school.id,
                request.kind,
                request.language,
                request.template_id.as_deref(),
            )
            .await?;
        let lang = resolved.spec.language;

        let mut targets = Vec::with_capacity(request.document_count());
        if !request.student_ids.is_empty() {
            let students = StudentRepository::new(self.pool.clone())
                .get_many(&school.id, &request.student_ids)
                .await?;
            targets.extend(students.iter().map(|s| DocumentTarget {
                student_id: Some(s.id.clone()),
                values: merge_values(&request.values, s.document_values(lang)),
            }));
        }
        if !request.teacher_ids.is_empty() {
            let teachers = TeacherRepository::new(self.pool.clone())
                .get_many(&school.id, &request.teacher_ids)
                .await?;
            targets.extend(teachers.iter().map(|t| DocumentTarget {
                student_id: None,
                values: merge_values(&request.values, t.document_values(lang)),
            }));
        }
        if targets.is_empty() {
            targets.push(DocumentTarget {
                student_id: None,
                values: request.values.clone(),
            });
        }

        let mut tx = self.pool.begin().await?;
        let batch = issue_batch(&mut *tx, school, &resolved, targets, created_by).await?;
        tx.commit().await?;

        info!(
            school_id = %school.id,
            kind = %request.kind,
            count = batch.documents.len(),
            credits = batch.credits_charged,
            "Documents generated"
        );

        Ok(GenerateDocumentsResponse {
            documents: batch.documents,
            credits_charged: batch.credits_charged,
            balance_after: batch.balance_after,
        })
    }

    pub async fn get_by_id(&self, school_id: &str, id: &str) -> DbResult<Option<GeneratedDocument>> {
        let doc = sqlx::query_as::<_, GeneratedDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM generated_documents WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }

    /// Generated documents, newest first.
    pub async fn history(&self, school_id: &str, filter: &HistoryFilter) -> DbResult<Vec<GeneratedDocument>> {
        let docs = sqlx::query_as::<_, GeneratedDocument>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM generated_documents
            WHERE school_id = $1
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::text IS NULL OR student_id = $3)
            ORDER BY created_at DESC, serial_number DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(school_id)
        .bind(filter.kind)
        .bind(filter.student_id.as_deref())
        .bind(filter.page.limit)
        .bind(filter.page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(docs)
    }

    /// Public lookup of a serial number printed on a document.
    ///
    /// Reveals only the document type, the school and the student's name.
    pub async fn verify(&self, serial_number: &str) -> DbResult<Option<DocumentVerification>> {
        let serial = serial_number.trim().to_uppercase();
        if documents::parse_serial_number(&serial).is_none() {
            debug!(serial = %serial, "Malformed serial number");
            return Ok(None);
        }
        debug!(serial = %serial, "Verifying document");

        let found = sqlx::query_as::<_, DocumentVerification>(
            r#"
            SELECT d.serial_number, d.kind, sc.name AS school_name,
                   st.name AS student_name, d.created_at AS issued_at
            FROM generated_documents d
            JOIN schools sc ON sc.id = d.school_id
            LEFT JOIN students st ON st.id = d.student_id
            WHERE d.serial_number = $1
            "#,
        )
        .bind(&serial)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found)
    }
}

/// Person values win over request-wide values of the same key.
pub(crate) fn merge_values(common: &Map<String, Value>, own: Map<String, Value>) -> Map<String, Value> {
    let mut values = common.clone();
    values.extend(own);
    values
}

/// Numbers, charges, renders and stores a batch inside `conn`'s transaction.
pub(crate) async fn issue_batch(
    conn: &mut PgConnection,
    school: &School,
    resolved: &ResolvedTemplate,
    targets: Vec<DocumentTarget>,
    created_by: Option<&str>,
) -> DbResult<IssuedBatch> {
    let kind = resolved.spec.kind;
    let cost = charge_for(kind, targets.len())?;
    let per_document = kind.credit_cost();
    let issue_date: NaiveDate = Utc::now().date_naive();
    let code = school.code();

    let first = sequence::reserve(
        &mut *conn,
        &school.id,
        kind.slug(),
        issue_date,
        targets.len() as i64,
    )
    .await?;

    let reference = documents::serial_number(kind, &code, first, issue_date);
    let description = format!("{} × {}", targets.len(), kind.name(shikkha_core::Language::En));
    let balance_after = if cost == Credits::zero() {
        credit_balance(&mut *conn, &school.id).await?
    } else {
        credit::spend(
            &mut *conn,
            &school.id,
            cost,
            &LedgerEntry {
                reference: Some(&reference),
                description: Some(&description),
                created_by,
            },
        )
        .await?
    };

    let header = school.header();
    let mut documents = Vec::with_capacity(targets.len());

    for (offset, target) in targets.into_iter().enumerate() {
        let serial = documents::serial_number(kind, &code, first + offset as i64, issue_date);
        let rendered: RenderedDocument = documents::render(
            &resolved.spec,
            &DocumentContext {
                school: header.clone(),
                serial_number: serial.clone(),
                issue_date,
                values: target.values.clone(),
            },
        )?;

        let document = sqlx::query_as::<_, GeneratedDocument>(&format!(
            r#"
            INSERT INTO generated_documents (
                id, school_id, kind, template_id, student_id, serial_number,
                credits_charged, payload, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(&school.id)
        .bind(kind)
        .bind(resolved.template_id.as_deref())
        .bind(target.student_id.as_deref())
        .bind(&serial)
        .bind(per_document)
        .bind(Value::Object(target.values))
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("serial_number", &serial))?;

        documents.push(GeneratedDocumentOutput { document, rendered });
    }

    Ok(IssuedBatch {
        documents,
        credits_charged: cost.value(),
        balance_after,
    })
}

async fn credit_balance(conn: &mut PgConnection, school_id: &str) -> DbResult<i64> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT current_credits FROM credit_balances WHERE school_id = $1")
            .bind(school_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(balance.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_values_win() {
        let common = json!({ "exam_name": "Half Yearly", "name": "ignored" });
        let own = json!({ "name": "Rahim" });
        let merged = merge_values(
            common.as_object().unwrap(),
            own.as_object().unwrap().clone(),
        );
        assert_eq!(merged["name"], "Rahim");
        assert_eq!(merged["exam_name"], "Half Yearly");
    }
}

//! # Template Repository
//!
//! School-specific document templates.
//!
//! ## Template Resolution
//! ```text
//! generate(kind, language, template_id?)
//!     │
//!     ├── template_id given ──► that template (must belong to the school
//!     │                         and match the kind)
//!     ├── school default for (kind, language)
//!     └── built-in template for the kind
//! ```
//!
//! At most one template per (school, kind, language) is the default; setting
//! a new default clears the previous one in the same transaction.

use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::documents::TemplateSpec;
use shikkha_core::error::ValidationError;
use shikkha_core::{DocumentKind, DocumentTemplate, Language, NewTemplate, TemplateUpdate};

const TEMPLATE_COLUMNS: &str = r#"
    id, school_id, kind, name, language, body, config, is_default, created_at, updated_at
"#;

/// The template a generation run will use.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    /// `None` when the built-in template was chosen.
    pub template_id: Option<String>,
    pub spec: TemplateSpec,
}

/// Repository for template database operations.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        TemplateRepository { pool }
    }

    pub async fn get_by_id(&self, school_id: &str, id: &str) -> DbResult<Option<DocumentTemplate>> {
        let template = sqlx::query_as::<_, DocumentTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM document_templates WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    /// Lists a school's templates, optionally for one kind.
    pub async fn list(&self, school_id: &str, kind: Option<DocumentKind>) -> DbResult<Vec<DocumentTemplate>> {
        let templates = sqlx::query_as::<_, DocumentTemplate>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM document_templates
            WHERE school_id = $1 AND ($2::text IS NULL OR kind = $2)
            ORDER BY kind, language, is_default DESC, name
            "#
        ))
        .bind(school_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    /// Creates a template after checking it renders.
    pub async fn create(&self, school_id: &str, new: &NewTemplate) -> DbResult<DocumentTemplate> {
        let spec = new.build_spec()?;
        let id = new_id();

        let mut tx = self.pool.begin().await?;

        if new.is_default {
            clear_default(&mut *tx, school_id, spec.kind, spec.language).await?;
        }

        let template = sqlx::query_as::<_, DocumentTemplate>(&format!(
            r#"
            INSERT INTO document_templates (id, school_id, kind, name, language, body, config, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(school_id)
        .bind(spec.kind)
        .bind(new.name.trim())
        .bind(spec.language)
        .bind(&spec.body)
        .bind(spec.config.to_json())
        .bind(new.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(school_id = %school_id, template_id = %id, kind = %spec.kind, "Template created");
        Ok(template)
    }

    /// Applies an update; the merged template must still render.
    pub async fn update(&self, school_id: &str, id: &str, update: &TemplateUpdate) -> DbResult<DocumentTemplate> {
        let current = self
            .get_by_id(school_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Template", id))?;
        let spec = update.merge(&current)?;
        let is_default = update.is_default.unwrap_or(current.is_default);

        let mut tx = self.pool.begin().await?;

        if is_default {
            clear_default(&mut *tx, school_id, spec.kind, spec.language).await?;
        }

        let template = sqlx::query_as::<_, DocumentTemplate>(&format!(
            r#"
            UPDATE document_templates SET
                name = COALESCE($3, name),
                language = $4,
                body = $5,
                config = $6,
                is_default = $7,
                updated_at = now()
            WHERE school_id = $1 AND id = $2
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(spec.language)
        .bind(&spec.body)
        .bind(spec.config.to_json())
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(school_id = %school_id, template_id = %id, "Template updated");
        Ok(template)
    }

    pub async fn delete(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM document_templates WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Template", id));
        }
        info!(school_id = %school_id, template_id = %id, "Template deleted");
        Ok(())
    }

    /// Picks the template for a generation run (see module docs).
    pub async fn resolve(
        &self,
        school_id: &str,
        kind: DocumentKind,
        language: Option<Language>,
        template_id: Option<&str>,
    ) -> DbResult<ResolvedTemplate> {
        if let Some(id) = template_id {
            let template = self
                .get_by_id(school_id, id)
                .await?
                .ok_or_else(|| DbError::not_found("Template", id))?;
            if template.kind != kind {
                return Err(ValidationError::invalid(
                    "template_id",
                    format!("template is for {}, not {}", template.kind, kind),
                )
                .into());
            }
            let mut spec = template.to_spec()?;
            if let Some(lang) = language {
                spec.language = lang;
            }
            return Ok(ResolvedTemplate {
                template_id: Some(template.id),
                spec,
            });
        }

        let language = language.unwrap_or_default();
        let default = sqlx::query_as::<_, DocumentTemplate>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM document_templates
            WHERE school_id = $1 AND kind = $2 AND language = $3 AND is_default
            "#
        ))
        .bind(school_id)
        .bind(kind)
        .bind(language)
        .fetch_optional(&self.pool)
        .await?;

        match default {
            Some(template) => Ok(ResolvedTemplate {
                spec: template.to_spec()?,
                template_id: Some(template.id),
            }),
            None => Ok(ResolvedTemplate {
                template_id: None,
                spec: TemplateSpec::builtin(kind, language),
            }),
        }
    }
}

async fn clear_default(
    conn: &mut PgConnection,
    school_id: &str,
    kind: DocumentKind,
    language: Language,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE document_templates SET is_default = FALSE, updated_at = now()
        WHERE school_id = $1 AND kind = $2 AND language = $3 AND is_default
        "#,
    )
    .bind(school_id)
    .bind(kind)
    .bind(language)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

//! # Domain Types
//!
//! Core entities and request DTOs shared by the database layer, the REST
//! handlers and (through ts-rs) the React client.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     School      │◄──│     Student     │   │    Teacher      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  eiin           │   │  student_code   │   │  teacher_code   │       │
//! │  │  name / name_bn │   │  class, roll    │   │  designation    │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │ school_id on every row                                      │
//! │  ┌────────▼────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │DocumentTemplate │──►│GeneratedDocument│   │   AdmitCard     │       │
//! │  │  kind, body     │   │  serial_number  │   │  exam, roll     │       │
//! │  │  config (JSON)  │   │  credits_charged│   │  serial_number  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  FeeReceipt • Notification • User (+ library, inventory, transport,    │
//! │  credits in their own modules)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (student_code, receipt_number, serial_number) - printed on paper

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::access::{Portal, Role};
use crate::documents::{self, DocumentKind, SchoolHeader, TemplateConfig, TemplateSpec};
use crate::error::{CoreResult, ValidationError};
use crate::i18n::Language;
use crate::money::Money;
use crate::validation::{
    validate_amount, validate_batch_size, validate_blood_group, validate_class_name,
    validate_code, validate_eiin, validate_email, validate_name, validate_optional_email,
    validate_optional_mobile, validate_optional_name, validate_password, validate_range,
    validate_required, validate_roll_number, validate_uuid, ValidationResult,
};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// School
// =============================================================================

/// A tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct School {
    pub id: String,
    pub name: String,
    pub name_bn: Option<String>,
    /// BANBEIS institution number.
    pub eiin: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub principal_name: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl School {
    /// Letterhead for rendered documents.
    pub fn header(&self) -> SchoolHeader {
        SchoolHeader {
            name: self.name.clone(),
            name_bn: self.name_bn.clone(),
            eiin: self.eiin.clone(),
            address: self.address.clone(),
            logo_url: self.logo_url.clone(),
        }
    }

    /// Code embedded in serial numbers.
    pub fn code(&self) -> String {
        documents::school_code(self.eiin.as_deref(), &self.id)
    }
}

/// What `GET /api/public/schools/{id}` reveals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PublicSchoolProfile {
    pub id: String,
    pub name: String,
    pub name_bn: Option<String>,
    pub eiin: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
}

impl From<School> for PublicSchoolProfile {
    fn from(s: School) -> Self {
        PublicSchoolProfile {
            id: s.id,
            name: s.name,
            name_bn: s.name_bn,
            eiin: s.eiin,
            address: s.address,
            logo_url: s.logo_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSchool {
    pub name: String,
    pub name_bn: Option<String>,
    pub eiin: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub principal_name: Option<String>,
}

impl NewSchool {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_name("name_bn", self.name_bn.as_deref())?;
        if let Some(eiin) = self.eiin.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_eiin(eiin)?;
        }
        validate_optional_mobile("phone", self.phone.as_deref())?;
        validate_optional_email(self.email.as_deref())?;
        validate_optional_name("principal_name", self.principal_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub name_bn: Option<String>,
    pub eiin: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub principal_name: Option<String>,
    /// Only developers may change this.
    pub is_active: Option<bool>,
}

impl SchoolUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(eiin) = self.eiin.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_eiin(eiin)?;
        }
        validate_optional_mobile("phone", self.phone.as_deref())?;
        validate_optional_email(self.email.as_deref())
    }
}

// =============================================================================
// User
// =============================================================================

/// A portal login. The password hash lives only in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub school_id: Option<String>,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn portal(&self) -> Portal {
        self.role.portal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password: String,
    pub phone: Option<String>,
    /// Developers creating users for another school set this.
    pub school_id: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_email(&self.email)?;
        validate_name("full_name", &self.full_name)?;
        validate_password(&self.password)?;
        validate_optional_mobile("phone", self.phone.as_deref())?;
        if let Some(school) = &self.school_id {
            validate_uuid("school_id", school)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("email", &self.email)?;
        validate_required("password", &self.password)
    }
}

// =============================================================================
// Student
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Student {
    pub id: String,
    pub school_id: String,
    /// School-assigned code printed on ID cards.
    pub student_code: String,
    pub name: String,
    pub name_bn: Option<String>,
    pub class_name: String,
    pub section: Option<String>,
    pub roll_number: Option<i32>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub guardian_phone: Option<String>,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    /// Student portal login, if any.
    pub user_id: Option<String>,
    /// Parent portal login, if any.
    pub parent_user_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Values available to document templates.
    pub fn document_values(&self, lang: Language) -> Map<String, Value> {
        let mut values = Map::new();
        let name = crate::i18n::localized(&self.name, self.name_bn.as_deref(), lang);
        values.insert("name".into(), Value::from(name));
        values.insert("student_code".into(), Value::from(self.student_code.clone()));
        values.insert("class_name".into(), Value::from(self.class_name.clone()));
        insert_opt(&mut values, "section", &self.section);
        if let Some(roll) = self.roll_number {
            values.insert("roll_number".into(), Value::from(roll));
        }
        insert_opt(&mut values, "father_name", &self.father_name);
        insert_opt(&mut values, "mother_name", &self.mother_name);
        insert_opt(&mut values, "guardian_phone", &self.guardian_phone);
        insert_opt(&mut values, "blood_group", &self.blood_group);
        insert_opt(&mut values, "address", &self.address);
        insert_opt(&mut values, "photo_url", &self.photo_url);
        if let Some(dob) = self.date_of_birth {
            values.insert(
                "date_of_birth".into(),
                Value::from(crate::i18n::format_date(dob, lang)),
            );
        }
        values
    }
}

fn insert_opt(values: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        values.insert(key.to_string(), Value::from(v));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStudent {
    pub student_code: String,
    pub name: String,
    pub name_bn: Option<String>,
    pub class_name: String,
    pub section: Option<String>,
    pub roll_number: Option<i32>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub guardian_phone: Option<String>,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub user_id: Option<String>,
    pub parent_user_id: Option<String>,
}

impl NewStudent {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("student_code", &self.student_code)?;
        validate_name("name", &self.name)?;
        validate_optional_name("name_bn", self.name_bn.as_deref())?;
        validate_class_name(&self.class_name)?;
        if let Some(roll) = self.roll_number {
            validate_roll_number(roll)?;
        }
        validate_optional_name("father_name", self.father_name.as_deref())?;
        validate_optional_name("mother_name", self.mother_name.as_deref())?;
        validate_optional_mobile("guardian_phone", self.guardian_phone.as_deref())?;
        validate_blood_group(self.blood_group.as_deref())?;
        validate_birth_date(self.date_of_birth)?;
        for (field, id) in [("user_id", &self.user_id), ("parent_user_id", &self.parent_user_id)] {
            if let Some(id) = id {
                validate_uuid(field, id)?;
            }
        }
        Ok(())
    }
}

fn validate_birth_date(dob: Option<NaiveDate>) -> ValidationResult<()> {
    if let Some(dob) = dob {
        let year = Utc::now().year() as i64;
        validate_range("date_of_birth", dob.year() as i64, 1900, year)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub name_bn: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    pub roll_number: Option<i32>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub guardian_phone: Option<String>,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub parent_user_id: Option<String>,
    pub is_active: Option<bool>,
}

impl StudentUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(class) = &self.class_name {
            validate_class_name(class)?;
        }
        if let Some(roll) = self.roll_number {
            validate_roll_number(roll)?;
        }
        validate_optional_mobile("guardian_phone", self.guardian_phone.as_deref())?;
        validate_blood_group(self.blood_group.as_deref())?;
        validate_birth_date(self.date_of_birth)?;
        if let Some(parent) = &self.parent_user_id {
            validate_uuid("parent_user_id", parent)?;
        }
        Ok(())
    }
}

/// Query string of `GET /api/students`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StudentFilter {
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub section: Option<String>,
    /// Matches name, Bangla name or student code.
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    #[ts(type = "number | null")]
    pub limit: Option<i64>,
    #[ts(type = "number | null")]
    pub offset: Option<i64>,
}

impl StudentFilter {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }

    /// `%term%` for ILIKE, or `None` when no search was given.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
    }
}

// =============================================================================
// Teacher
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Teacher {
    pub id: String,
    pub school_id: String,
    pub teacher_code: String,
    pub name: String,
    pub name_bn: Option<String>,
    pub designation: Option<String>,
    pub subject: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "Option<String>")]
    pub joining_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub user_id: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Teacher {
    pub fn document_values(&self, lang: Language) -> Map<String, Value> {
        let mut values = Map::new();
        let name = crate::i18n::localized(&self.name, self.name_bn.as_deref(), lang);
        values.insert("name".into(), Value::from(name));
        values.insert("teacher_code".into(), Value::from(self.teacher_code.clone()));
        insert_opt(&mut values, "designation", &self.designation);
        insert_opt(&mut values, "subject", &self.subject);
        insert_opt(&mut values, "phone", &self.phone);
        insert_opt(&mut values, "email", &self.email);
        insert_opt(&mut values, "photo_url", &self.photo_url);
        if let Some(date) = self.joining_date {
            values.insert(
                "joining_date".into(),
                Value::from(crate::i18n::format_date(date, lang)),
            );
        }
        values
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTeacher {
    pub teacher_code: String,
    pub name: String,
    pub name_bn: Option<String>,
    pub designation: Option<String>,
    pub subject: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "Option<String>")]
    pub joining_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub user_id: Option<String>,
}

impl NewTeacher {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_code("teacher_code", &self.teacher_code)?;
        validate_name("name", &self.name)?;
        validate_optional_name("name_bn", self.name_bn.as_deref())?;
        validate_optional_name("designation", self.designation.as_deref())?;
        validate_optional_mobile("phone", self.phone.as_deref())?;
        validate_optional_email(self.email.as_deref())?;
        if let Some(user) = &self.user_id {
            validate_uuid("user_id", user)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TeacherUpdate {
    pub name: Option<String>,
    pub name_bn: Option<String>,
    pub designation: Option<String>,
    pub subject: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "Option<String>")]
    pub joining_date: Option<NaiveDate>,
    pub photo_url: Option<String>,
    pub is_active: Option<bool>,
}

impl TeacherUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        validate_optional_mobile("phone", self.phone.as_deref())?;
        validate_optional_email(self.email.as_deref())
    }
}

// =============================================================================
// Document Templates & Generated Documents
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DocumentTemplate {
    pub id: String,
    pub school_id: String,
    pub kind: DocumentKind,
    pub name: String,
    pub language: Language,
    /// Tera source.
    pub body: String,
    /// `{ fields: [...], styling: {...} }`
    #[ts(type = "unknown")]
    pub config: Value,
    pub is_default: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl DocumentTemplate {
    pub fn to_spec(&self) -> CoreResult<TemplateSpec> {
        Ok(TemplateSpec {
            kind: self.kind,
            language: self.language,
            body: self.body.clone(),
            config: TemplateConfig::from_json(&self.config)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTemplate {
    pub kind: DocumentKind,
    pub name: String,
    #[serde(default)]
    pub language: Language,
    /// Defaults to the built-in body for `kind`.
    pub body: Option<String>,
    /// Defaults to the built-in config for `kind`.
    pub config: Option<TemplateConfig>,
    #[serde(default)]
    pub is_default: bool,
}

impl NewTemplate {
    /// Fills defaults and checks the template renders.
    pub fn build_spec(&self) -> CoreResult<TemplateSpec> {
        validate_name("name", &self.name)?;
        let builtin = TemplateSpec::builtin(self.kind, self.language);
        let spec = TemplateSpec {
            body: self
                .body
                .clone()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or(builtin.body),
            config: self.config.clone().unwrap_or(builtin.config),
            ..builtin
        };
        spec.validate()?;
        Ok(spec)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub language: Option<Language>,
    pub body: Option<String>,
    pub config: Option<TemplateConfig>,
    pub is_default: Option<bool>,
}

impl TemplateUpdate {
    /// Applies the update to `current` and validates the result.
    pub fn merge(&self, current: &DocumentTemplate) -> CoreResult<TemplateSpec> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        let mut spec = current.to_spec()?;
        if let Some(lang) = self.language {
            spec.language = lang;
        }
        if let Some(body) = &self.body {
            spec.body = body.clone();
        }
        if let Some(config) = &self.config {
            spec.config = config.clone();
        }
        spec.validate()?;
        Ok(spec)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct GeneratedDocument {
    pub id: String,
    pub school_id: String,
    pub kind: DocumentKind,
    pub template_id: Option<String>,
    pub student_id: Option<String>,
    pub serial_number: String,
    #[ts(type = "number")]
    pub credits_charged: i64,
    /// The values the document was rendered from.
    #[ts(type = "unknown")]
    pub payload: Value,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// `POST /api/documents/generate`
///
/// One document is produced per listed student and teacher. With no targets a
/// single document is rendered from `values` alone (notices, routines).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GenerateDocumentsRequest {
    pub kind: DocumentKind,
    /// Explicit template; otherwise the school's default, then the built-in.
    pub template_id: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub teacher_ids: Vec<String>,
    /// Extra values merged into every document (exam name, notice body).
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub values: Map<String, Value>,
}

impl GenerateDocumentsRequest {
    /// Number of documents the request will produce.
    pub fn document_count(&self) -> usize {
        (self.student_ids.len() + self.teacher_ids.len()).max(1)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(template) = &self.template_id {
            validate_uuid("template_id", template)?;
        }
        for id in &self.student_ids {
            validate_uuid("student_ids", id)?;
        }
        for id in &self.teacher_ids {
            validate_uuid("teacher_ids", id)?;
        }
        validate_batch_size(self.document_count())
    }
}

/// Result of a generation batch.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct GenerateDocumentsResponse {
    pub documents: Vec<GeneratedDocumentOutput>,
    #[ts(type = "number")]
    pub credits_charged: i64,
    #[ts(type = "number")]
    pub balance_after: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct GeneratedDocumentOutput {
    pub document: GeneratedDocument,
    pub rendered: documents::RenderedDocument,
}

/// Public answer to `GET /api/public/documents/verify/{serial}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DocumentVerification {
    pub serial_number: String,
    pub kind: DocumentKind,
    pub school_name: String,
    pub student_name: Option<String>,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
}

// =============================================================================
// Admit Cards
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdmitCard {
    pub id: String,
    pub school_id: String,
    pub student_id: String,
    pub exam_name: String,
    pub exam_year: i32,
    pub class_name: String,
    pub roll_number: Option<i32>,
    pub exam_center: Option<String>,
    pub instructions: Option<String>,
    pub serial_number: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// `POST /api/admit-cards/generate`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdmitCardBatchRequest {
    pub exam_name: String,
    pub exam_year: i32,
    pub class_name: String,
    pub section: Option<String>,
    pub exam_center: Option<String>,
    pub instructions: Option<String>,
    /// Defaults to every active student of the class (and section).
    pub student_ids: Option<Vec<String>>,
    #[serde(default)]
    pub language: Option<Language>,
}

impl AdmitCardBatchRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("exam_name", &self.exam_name)?;
        validate_range("exam_year", self.exam_year as i64, 2000, 2100)?;
        validate_class_name(&self.class_name)?;
        if let Some(ids) = &self.student_ids {
            validate_batch_size(ids.len())?;
            for id in ids {
                validate_uuid("student_ids", id)?;
            }
        }
        Ok(())
    }

    /// Exam values merged into each card.
    pub fn document_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("exam_name".into(), Value::from(self.exam_name.clone()));
        values.insert("exam_year".into(), Value::from(self.exam_year));
        insert_opt(&mut values, "exam_center", &self.exam_center);
        insert_opt(&mut values, "instructions", &self.instructions);
        values
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct AdmitCardBatchResponse {
    pub admit_cards: Vec<AdmitCard>,
    pub rendered: Vec<documents::RenderedDocument>,
    #[ts(type = "number")]
    pub credits_charged: i64,
    #[ts(type = "number")]
    pub balance_after: i64,
}

// =============================================================================
// Fees
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Bkash,
    Nagad,
    Rocket,
    BankTransfer,
    Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FeeReceipt {
    pub id: String,
    pub school_id: String,
    pub student_id: String,
    pub receipt_number: String,
    /// "tuition", "exam", "admission", ...
    pub fee_type: String,
    /// Amount actually collected.
    #[ts(type = "number")]
    pub amount_paisa: i64,
    #[ts(type = "number")]
    pub waiver_paisa: i64,
    /// Billing month, `YYYY-MM`.
    pub month: Option<String>,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub received_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl FeeReceipt {
    pub fn amount(&self) -> Money {
        Money::from_paisa(self.amount_paisa)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewFeeReceipt {
    pub student_id: String,
    pub fee_type: String,
    /// Gross amount before waiver.
    #[ts(type = "number")]
    pub amount_paisa: i64,
    /// Scholarship in basis points (5000 = 50%).
    #[serde(default)]
    pub waiver_bps: u32,
    pub month: Option<String>,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

impl NewFeeReceipt {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("student_id", &self.student_id)?;
        validate_name("fee_type", &self.fee_type)?;
        validate_amount("amount_paisa", self.amount_paisa)?;
        validate_range("waiver_bps", self.waiver_bps as i64, 0, 10_000)?;
        if let Some(month) = &self.month {
            parse_billing_month(month)?;
        }
        Ok(())
    }

    /// `(collected, waived)` after applying the waiver.
    pub fn split(&self) -> (Money, Money) {
        let gross = Money::from_paisa(self.amount_paisa);
        let net = gross.apply_waiver(self.waiver_bps);
        (net, gross - net)
    }
}

/// Parses a `YYYY-MM` billing month into its first day.
pub fn parse_billing_month(month: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid("month", "must be YYYY-MM"))
}

/// Receipt numbers: `RCT-<school code>-<yyyymm>-<seq>`.
pub fn receipt_number(school_code: &str, date: NaiveDate, sequence: i64) -> String {
    format!("RCT-{}-{}-{:05}", school_code, date.format("%Y%m"), sequence)
}

// =============================================================================
// Notifications
// =============================================================================

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    All,
    Teachers,
    Students,
    Parents,
    /// A single user (`recipient_user_id`).
    User,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Teachers => "teachers",
            Audience::Students => "students",
            Audience::Parents => "parents",
            Audience::User => "user",
        }
    }

    /// Whether a user with `role` and `user_id` sees notifications for this audience.
    pub fn includes(&self, role: Role, user_id: &str, recipient: Option<&str>) -> bool {
        let staff = matches!(role, Role::Admin | Role::Developer);
        match self {
            Audience::All => true,
            Audience::Teachers => staff || role == Role::Teacher,
            Audience::Students => staff || role == Role::Student,
            Audience::Parents => staff || role == Role::Parent,
            Audience::User => recipient == Some(user_id),
        }
    }

    /// Audiences visible to `role`; the SQL filter mirrors [`Audience::includes`].
    pub fn visible_to(role: Role) -> Vec<Audience> {
        let mut list = vec![Audience::All];
        match role {
            Role::Teacher => list.push(Audience::Teachers),
            Role::Student => list.push(Audience::Students),
            Role::Parent => list.push(Audience::Parents),
            Role::Admin | Role::Developer => {
                list.extend([Audience::Teachers, Audience::Students, Audience::Parents])
            }
        }
        list
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A notification as seen by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct NotificationView {
    pub id: String,
    pub school_id: String,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub recipient_user_id: Option<String>,
    pub priority: Priority,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub recipient_user_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl NewNotification {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("title", &self.title)?;
        validate_required("body", &self.body)?;
        match (self.audience, self.recipient_user_id.as_deref()) {
            (Audience::User, Some(id)) => validate_uuid("recipient_user_id", id),
            (Audience::User, None) => Err(ValidationError::required("recipient_user_id")),
            (_, Some(_)) => Err(ValidationError::invalid(
                "recipient_user_id",
                "only allowed when audience is user",
            )),
            (_, None) => Ok(()),
        }
    }
}

// =============================================================================
// Dashboard & Paging
// =============================================================================

/// Counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DashboardStats {
    #[ts(type = "number")]
    pub total_students: i64,
    #[ts(type = "number")]
    pub active_students: i64,
    #[ts(type = "number")]
    pub total_teachers: i64,
    #[ts(type = "number")]
    pub documents_generated: i64,
    #[ts(type = "number")]
    pub documents_this_month: i64,
    #[ts(type = "number")]
    pub current_credits: i64,
    #[ts(type = "number")]
    pub used_credits: i64,
    #[ts(type = "number")]
    pub fees_collected_this_month_paisa: i64,
    #[ts(type = "number")]
    pub library_books: i64,
    #[ts(type = "number")]
    pub books_on_loan: i64,
    #[ts(type = "number")]
    pub overdue_issues: i64,
    #[ts(type = "number")]
    pub low_stock_items: i64,
    #[ts(type = "number")]
    pub transport_routes: i64,
}

/// Query-string paging (`?limit=&offset=`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    #[ts(type = "number | null")]
    pub limit: Option<i64>,
    #[ts(type = "number | null")]
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

/// Clamped LIMIT/OFFSET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Page {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> Student {
        Student {
            id: "st-1".to_string(),
            school_id: "s-1".to_string(),
            student_code: "STU-001".to_string(),
            name: "Rahim Uddin".to_string(),
            name_bn: Some("রহিম উদ্দিন".to_string()),
            class_name: "Class 8".to_string(),
            section: Some("A".to_string()),
            roll_number: Some(7),
            father_name: Some("Karim Uddin".to_string()),
            mother_name: None,
            guardian_phone: Some("01712345678".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 3, 5),
            blood_group: Some("B+".to_string()),
            address: None,
            photo_url: None,
            user_id: None,
            parent_user_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn new_student() -> NewStudent {
        NewStudent {
            student_code: "STU-001".to_string(),
            name: "Rahim Uddin".to_string(),
            name_bn: None,
            class_name: "Class 8".to_string(),
            section: Some("A".to_string()),
            roll_number: Some(7),
            father_name: None,
            mother_name: None,
            guardian_phone: Some("+8801712345678".to_string()),
            date_of_birth: None,
            blood_group: Some("O+".to_string()),
            address: None,
            photo_url: None,
            user_id: None,
            parent_user_id: None,
        }
    }

    #[test]
    fn test_student_document_values() {
        let s = student();
        let en = s.document_values(Language::En);
        assert_eq!(en["name"], "Rahim Uddin");
        assert_eq!(en["roll_number"], 7);
        assert_eq!(en["date_of_birth"], "5 March 2012");
        assert!(!en.contains_key("mother_name"));

        let bn = s.document_values(Language::Bn);
        assert_eq!(bn["name"], "রহিম উদ্দিন");
    }

    #[test]
    fn test_new_student_validation() {
        assert!(new_student().validate().is_ok());
        assert!(NewStudent { roll_number: Some(0), ..new_student() }.validate().is_err());
        assert!(NewStudent {
            guardian_phone: Some("12345".to_string()),
            ..new_student()
        }
        .validate()
        .is_err());
        assert!(NewStudent {
            student_code: "has space".to_string(),
            ..new_student()
        }
        .validate()
        .is_err());
        assert!(NewStudent {
            parent_user_id: Some("nope".to_string()),
            ..new_student()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = StudentFilter {
            search: Some(" 50%_off ".to_string()),
            ..StudentFilter::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(StudentFilter::default().search_pattern(), None);
    }

    #[test]
    fn test_student_filter_query_names() {
        let filter: StudentFilter =
            serde_json::from_value(serde_json::json!({ "class": "Class 8", "search": "ra" })).unwrap();
        assert_eq!(filter.class_name.as_deref(), Some("Class 8"));
        assert!(!filter.include_inactive);
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(Page::default(), Page { limit: DEFAULT_PAGE_SIZE, offset: 0 });
        assert_eq!(Page::new(Some(10_000), Some(-4)), Page { limit: MAX_PAGE_SIZE, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(20)).limit, 1);
    }

    #[test]
    fn test_generate_request() {
        let req: GenerateDocumentsRequest = serde_json::from_value(serde_json::json!({
            "kind": "notice",
            "values": { "title": "Holiday" }
        }))
        .unwrap();
        assert_eq!(req.document_count(), 1);
        assert!(req.validate().is_ok());

        let bad_teacher = GenerateDocumentsRequest {
            teacher_ids: vec!["bad".to_string()],
            ..req.clone()
        };
        assert!(matches!(
            bad_teacher.validate(),
            Err(ValidationError::InvalidFormat { field, .. }) if field == "teacher_ids"
        ));

        let req = GenerateDocumentsRequest {
            student_ids: vec!["bad".to_string()],
            ..req
        };
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidFormat { field, .. }) if field == "student_ids"
        ));
    }

    #[test]
    fn test_new_template_defaults_to_builtin() {
        let tpl = NewTemplate {
            kind: DocumentKind::AdmitCard,
            name: "Half yearly".to_string(),
            language: Language::Bn,
            body: None,
            config: None,
            is_default: true,
        };
        let spec = tpl.build_spec().unwrap();
        assert_eq!(spec, TemplateSpec::builtin(DocumentKind::AdmitCard, Language::Bn));

        let broken = NewTemplate {
            body: Some("{{ unclosed".to_string()),
            ..tpl
        };
        assert!(broken.build_spec().is_err());
    }

    #[test]
    fn test_fee_receipt_waiver() {
        let fee = NewFeeReceipt {
            student_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            fee_type: "tuition".to_string(),
            amount_paisa: 150_000,
            waiver_bps: 5000,
            month: Some("2026-10".to_string()),
            payment_method: PaymentMethod::Bkash,
            note: None,
        };
        assert!(fee.validate().is_ok());
        let (net, waived) = fee.split();
        assert_eq!(net, Money::from_taka(750));
        assert_eq!(waived, Money::from_taka(750));

        assert!(NewFeeReceipt { waiver_bps: 10_001, ..fee.clone() }.validate().is_err());
        assert!(NewFeeReceipt { month: Some("2026-13".to_string()), ..fee }.validate().is_err());
    }

    #[test]
    fn test_receipt_number() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(receipt_number("108254", date, 42), "RCT-108254-202610-00042");
    }

    #[test]
    fn test_audience() {
        assert!(Audience::All.includes(Role::Parent, "u", None));
        assert!(Audience::Teachers.includes(Role::Teacher, "u", None));
        assert!(!Audience::Teachers.includes(Role::Student, "u", None));
        assert!(Audience::User.includes(Role::Student, "u-1", Some("u-1")));
        assert!(!Audience::User.includes(Role::Student, "u-2", Some("u-1")));

        for role in Role::ALL {
            for audience in Audience::visible_to(role) {
                assert!(audience.includes(role, "u", None));
            }
        }
    }

    #[test]
    fn test_new_notification_recipient_rules() {
        let n = NewNotification {
            title: "Exam".to_string(),
            body: "Starts Sunday".to_string(),
            audience: Audience::Parents,
            recipient_user_id: None,
            priority: Priority::High,
        };
        assert!(n.validate().is_ok());
        assert!(NewNotification { audience: Audience::User, ..n.clone() }.validate().is_err());
        assert!(NewNotification {
            recipient_user_id: Some("550e8400-e29b-41d4-a716-446655440000".to_string()),
            ..n
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_public_profile_hides_contact() {
        let school = School {
            id: "s-1".to_string(),
            name: "Dhaka Model School".to_string(),
            name_bn: None,
            eiin: Some("108254".to_string()),
            address: None,
            phone: Some("01712345678".to_string()),
            email: Some("head@dms.edu.bd".to_string()),
            logo_url: None,
            principal_name: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(school.code(), "108254");
        let json = serde_json::to_value(PublicSchoolProfile::from(school)).unwrap();
        assert!(json.get("phone").is_none());
        assert!(json.get("email").is_none());
    }
}

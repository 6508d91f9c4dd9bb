//! # Documents Module
//!
//! The document catalogue and the template rendering pipeline.
//!
//! ## Rendering Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Document Generation                                │
//! │                                                                         │
//! │  DocumentTemplate (db row)         DocumentContext (per student)        │
//! │  ├── body    (Tera source)         ├── school header                    │
//! │  ├── config  (fields, styling)     ├── serial number                    │
//! │  └── language                      └── values {name, roll, ...}         │
//! │         │                                   │                           │
//! │         └─────────────┬─────────────────────┘                           │
//! │                       ▼                                                 │
//! │  1. resolve fields → rows (labels per language, Bangla digits)          │
//! │  2. Tera renders body            (autoescaped)                          │
//! │  3. Tera renders page shell      (styling → CSS)                        │
//! │  4. base64 artifact + MIME type  ──► RenderedDocument                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serial Numbers
//! ```text
//! ADM-108254-20261019-0007
//! │   │      │        └── per-school sequence, zero padded
//! │   │      └─────────── issue date
//! │   └────────────────── school code (EIIN, or id prefix)
//! └────────────────────── kind prefix
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tera::{Context, Tera};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::i18n::{self, Language};

// =============================================================================
// Document Category
// =============================================================================

/// Broad family a document kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    IdCard,
    Exam,
    Certificate,
    Academic,
    Finance,
    Letter,
    Administrative,
    Service,
}

// =============================================================================
// Document Kind
// =============================================================================

/// Every document type the platform can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    StudentIdCard,
    TeacherIdCard,
    StaffIdCard,
    AdmitCard,
    SeatCard,
    ExamRoutine,
    TestimonialCertificate,
    CharacterCertificate,
    TransferCertificate,
    StudyCertificate,
    AppreciationCertificate,
    ParticipationCertificate,
    MeritCertificate,
    SportsCertificate,
    MarkSheet,
    ProgressReport,
    ClassRoutine,
    ClassList,
    AttendanceSheet,
    FeeReceipt,
    PaymentSlip,
    SalarySheet,
    LeaveLetter,
    AppointmentLetter,
    ExperienceLetter,
    Notice,
    LibraryCard,
    TransportPass,
}

/// Static facts about a kind.
#[derive(Debug, Clone, Copy)]
struct KindMeta {
    slug: &'static str,
    prefix: &'static str,
    name_en: &'static str,
    name_bn: &'static str,
    category: DocumentCategory,
    cost: i64,
}

const fn meta(
    slug: &'static str,
    prefix: &'static str,
    name_en: &'static str,
    name_bn: &'static str,
    category: DocumentCategory,
    cost: i64,
) -> KindMeta {
    KindMeta {
        slug,
        prefix,
        name_en,
        name_bn,
        category,
        cost,
    }
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 28] = [
        DocumentKind::StudentIdCard,
        DocumentKind::TeacherIdCard,
        DocumentKind::StaffIdCard,
        DocumentKind::AdmitCard,
        DocumentKind::SeatCard,
        DocumentKind::ExamRoutine,
        DocumentKind::TestimonialCertificate,
        DocumentKind::CharacterCertificate,
        DocumentKind::TransferCertificate,
        DocumentKind::StudyCertificate,
        DocumentKind::AppreciationCertificate,
        DocumentKind::ParticipationCertificate,
        DocumentKind::MeritCertificate,
        DocumentKind::SportsCertificate,
        DocumentKind::MarkSheet,
        DocumentKind::ProgressReport,
        DocumentKind::ClassRoutine,
        DocumentKind::ClassList,
        DocumentKind::AttendanceSheet,
        DocumentKind::FeeReceipt,
        DocumentKind::PaymentSlip,
        DocumentKind::SalarySheet,
        DocumentKind::LeaveLetter,
        DocumentKind::AppointmentLetter,
        DocumentKind::ExperienceLetter,
        DocumentKind::Notice,
        DocumentKind::LibraryCard,
        DocumentKind::TransportPass,
    ];

    fn meta(&self) -> KindMeta {
        use DocumentCategory as C;
        use DocumentKind::*;

        match self {
            StudentIdCard => meta("student_id_card", "SID", "Student ID Card", "শিক্ষার্থী পরিচয়পত্র", C::IdCard, 2),
            TeacherIdCard => meta("teacher_id_card", "TID", "Teacher ID Card", "শিক্ষক পরিচয়পত্র", C::IdCard, 2),
            StaffIdCard => meta("staff_id_card", "STF", "Staff ID Card", "কর্মচারী পরিচয়পত্র", C::IdCard, 2),
            AdmitCard => meta("admit_card", "ADM", "Admit Card", "প্রবেশপত্র", C::Exam, 1),
            SeatCard => meta("seat_card", "SEA", "Seat Card", "আসন কার্ড", C::Exam, 1),
            ExamRoutine => meta("exam_routine", "ERT", "Exam Routine", "পরীক্ষার রুটিন", C::Exam, 2),
            TestimonialCertificate => meta("testimonial_certificate", "TST", "Testimonial", "প্রশংসাপত্র", C::Certificate, 5),
            CharacterCertificate => meta("character_certificate", "CHR", "Character Certificate", "চারিত্রিক সনদপত্র", C::Certificate, 5),
            TransferCertificate => meta("transfer_certificate", "TRC", "Transfer Certificate", "ছাড়পত্র", C::Certificate, 5),
            StudyCertificate => meta("study_certificate", "STU", "Study Certificate", "অধ্যয়ন প্রত্যয়নপত্র", C::Certificate, 3),
            AppreciationCertificate => meta("appreciation_certificate", "APR", "Appreciation Certificate", "অভিনন্দন পত্র", C::Certificate, 3),
            ParticipationCertificate => meta("participation_certificate", "PRT", "Participation Certificate", "অংশগ্রহণ সনদ", C::Certificate, 3),
            MeritCertificate => meta("merit_certificate", "MER", "Merit Certificate", "মেধা সনদ", C::Certificate, 3),
            SportsCertificate => meta("sports_certificate", "SPT", "Sports Certificate", "ক্রীড়া সনদ", C::Certificate, 3),
            MarkSheet => meta("mark_sheet", "MRK", "Mark Sheet", "নম্বরপত্র", C::Academic, 3),
            ProgressReport => meta("progress_report", "PRG", "Progress Report", "অগ্রগতি প্রতিবেদন", C::Academic, 3),
            ClassRoutine => meta("class_routine", "CRT", "Class Routine", "ক্লাস রুটিন", C::Academic, 2),
            ClassList => meta("class_list", "CLS", "Class List", "শ্রেণি তালিকা", C::Academic, 1),
            AttendanceSheet => meta("attendance_sheet", "ATT", "Attendance Sheet", "হাজিরা খাতা", C::Academic, 1),
            FeeReceipt => meta("fee_receipt", "FEE", "Fee Receipt", "ফি রসিদ", C::Finance, 1),
            PaymentSlip => meta("payment_slip", "PAY", "Payment Slip", "পেমেন্ট স্লিপ", C::Finance, 1),
            SalarySheet => meta("salary_sheet", "SAL", "Salary Sheet", "বেতন শিট", C::Finance, 2),
            LeaveLetter => meta("leave_letter", "LEV", "Leave Letter", "ছুটির আবেদন", C::Letter, 2),
            AppointmentLetter => meta("appointment_letter", "APT", "Appointment Letter", "নিয়োগপত্র", C::Letter, 3),
            ExperienceLetter => meta("experience_letter", "EXP", "Experience Letter", "অভিজ্ঞতা সনদ", C::Letter, 3),
            Notice => meta("notice", "NOT", "Notice", "নোটিশ", C::Administrative, 1),
            LibraryCard => meta("library_card", "LIB", "Library Card", "লাইব্রেরি কার্ড", C::Service, 2),
            TransportPass => meta("transport_pass", "TRN", "Transport Pass", "পরিবহন পাস", C::Service, 2),
        }
    }

    pub fn slug(&self) -> &'static str {
        self.meta().slug
    }

    /// Three-letter prefix used in serial numbers.
    pub fn serial_prefix(&self) -> &'static str {
        self.meta().prefix
    }

    pub fn name(&self, lang: Language) -> &'static str {
        match lang {
            Language::En => self.meta().name_en,
            Language::Bn => self.meta().name_bn,
        }
    }

    pub fn category(&self) -> DocumentCategory {
        self.meta().category
    }

    /// Credits charged per generated document.
    pub fn credit_cost(&self) -> i64 {
        self.meta().cost
    }

    /// Looks a kind up by its serial prefix.
    pub fn from_prefix(prefix: &str) -> Option<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.serial_prefix() == prefix)
    }

    /// Public description of this kind, as listed by the catalogue endpoints.
    pub fn info(&self) -> DocumentTypeInfo {
        let m = self.meta();
        DocumentTypeInfo {
            kind: *self,
            slug: m.slug.to_string(),
            name_en: m.name_en.to_string(),
            name_bn: m.name_bn.to_string(),
            category: m.category,
            credit_cost: m.cost,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DocumentKind {
    type Err = CoreError;

    /// Accepts the slug with either underscores or hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted)
            .ok_or_else(|| CoreError::UnknownDocumentKind(s.to_string()))
    }
}

/// Catalogue entry returned by `GET /api/documents/types`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentTypeInfo {
    pub kind: DocumentKind,
    pub slug: String,
    pub name_en: String,
    pub name_bn: String,
    pub category: DocumentCategory,
    #[ts(type = "number")]
    pub credit_cost: i64,
}

/// The whole catalogue in display order.
pub fn catalogue() -> Vec<DocumentTypeInfo> {
    DocumentKind::ALL.iter().map(DocumentKind::info).collect()
}

// =============================================================================
// Template Configuration
// =============================================================================

/// One labelled value printed on a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TemplateField {
    /// Key into the document values (`name`, `roll_number`, ...).
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub label_bn: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Printed when the value is missing.
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A5,
    /// CR80 card, 85.6 × 54 mm.
    Card,
}

impl PageSize {
    fn css(&self, orientation: Orientation) -> &'static str {
        match (self, orientation) {
            (PageSize::A4, Orientation::Portrait) => "A4 portrait",
            (PageSize::A4, Orientation::Landscape) => "A4 landscape",
            (PageSize::A5, Orientation::Portrait) => "A5 portrait",
            (PageSize::A5, Orientation::Landscape) => "A5 landscape",
            (PageSize::Card, Orientation::Portrait) => "54mm 85.6mm",
            (PageSize::Card, Orientation::Landscape) => "85.6mm 54mm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Visual settings stored in the template's `config.styling`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct Styling {
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// `#rrggbb`
    pub primary_color: String,
    pub font_family: String,
    pub font_size_pt: i32,
    pub show_border: bool,
    pub show_logo: bool,
    pub watermark: Option<String>,
}

impl Default for Styling {
    fn default() -> Self {
        Styling {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            primary_color: "#1d4ed8".to_string(),
            font_family: "Noto Sans Bengali, Kalpurush, sans-serif".to_string(),
            font_size_pt: 11,
            show_border: true,
            show_logo: true,
            watermark: None,
        }
    }
}

impl Styling {
    /// Rejects values that would break out of the generated CSS.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let hex = self.primary_color.strip_prefix('#').unwrap_or("");
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::invalid("primary_color", "must be #rrggbb"));
        }
        if !self
            .font_family
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | ',' | '-' | '_'))
        {
            return Err(ValidationError::invalid(
                "font_family",
                "may contain only letters, digits, spaces, commas and hyphens",
            ));
        }
        if !(6..=32).contains(&self.font_size_pt) {
            return Err(ValidationError::OutOfRange {
                field: "font_size_pt".to_string(),
                min: 6,
                max: 32,
            });
        }
        Ok(())
    }
}

/// Parsed form of the `document_templates.config` JSON column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct TemplateConfig {
    pub fields: Vec<TemplateField>,
    pub styling: Styling,
}

impl TemplateConfig {
    /// Parses the JSON column; `null` yields the defaults.
    pub fn from_json(value: &Value) -> CoreResult<Self> {
        if value.is_null() {
            return Ok(TemplateConfig::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| ValidationError::invalid("config", e.to_string()).into())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in &self.fields {
            if field.key.trim().is_empty() {
                return Err(ValidationError::required("fields.key"));
            }
        }
        self.styling.validate()
    }

    /// The built-in configuration for a kind.
    pub fn default_for(kind: DocumentKind) -> Self {
        let styling = match kind.category() {
            DocumentCategory::IdCard => Styling {
                page_size: PageSize::Card,
                font_size_pt: 8,
                ..Styling::default()
            },
            DocumentCategory::Service => Styling {
                page_size: PageSize::Card,
                orientation: Orientation::Landscape,
                font_size_pt: 8,
                ..Styling::default()
            },
            DocumentCategory::Exam => Styling {
                page_size: PageSize::A5,
                orientation: Orientation::Landscape,
                ..Styling::default()
            },
            DocumentCategory::Certificate => Styling {
                orientation: Orientation::Landscape,
                font_size_pt: 13,
                ..Styling::default()
            },
            _ => Styling::default(),
        };

        TemplateConfig {
            fields: default_field_keys(kind)
                .iter()
                .map(|key| field(key))
                .collect(),
            styling,
        }
    }
}

fn default_field_keys(kind: DocumentKind) -> &'static [&'static str] {
    use DocumentKind::*;

    match kind {
        StudentIdCard => &["name", "class_name", "section", "roll_number", "blood_group", "guardian_phone"],
        TeacherIdCard | StaffIdCard => &["name", "designation", "phone", "blood_group"],
        AdmitCard | SeatCard => &["name", "class_name", "roll_number", "exam_name", "exam_year", "exam_center"],
        ExamRoutine | ClassRoutine | ClassList | AttendanceSheet => &["class_name", "section"],
        FeeReceipt | PaymentSlip => &["receipt_number", "name", "class_name", "fee_type", "month", "amount", "payment_method"],
        SalarySheet => &["name", "designation", "month", "amount"],
        LeaveLetter | AppointmentLetter | ExperienceLetter => &["name", "designation", "joining_date"],
        Notice => &["title"],
        LibraryCard => &["name", "class_name", "roll_number"],
        TransportPass => &["name", "class_name", "route_name", "pickup_stop"],
        MarkSheet | ProgressReport => &["name", "class_name", "section", "roll_number"],
        _ => &["name", "father_name", "mother_name", "class_name", "roll_number"],
    }
}

fn field(key: &str) -> TemplateField {
    let (en, bn) = match key {
        "name" => ("Name", "নাম"),
        "class_name" => ("Class", "শ্রেণি"),
        "section" => ("Section", "শাখা"),
        "roll_number" => ("Roll", "রোল"),
        "blood_group" => ("Blood Group", "রক্তের গ্রুপ"),
        "guardian_phone" => ("Guardian Phone", "অভিভাবকের ফোন"),
        "designation" => ("Designation", "পদবি"),
        "phone" => ("Phone", "ফোন"),
        "exam_name" => ("Examination", "পরীক্ষা"),
        "exam_year" => ("Year", "সাল"),
        "exam_center" => ("Centre", "কেন্দ্র"),
        "receipt_number" => ("Receipt No.", "রসিদ নং"),
        "fee_type" => ("Fee Type", "ফি এর ধরন"),
        "month" => ("Month", "মাস"),
        "amount" => ("Amount", "পরিমাণ"),
        "payment_method" => ("Paid By", "পরিশোধের মাধ্যম"),
        "joining_date" => ("Joining Date", "যোগদানের তারিখ"),
        "father_name" => ("Father's Name", "পিতার নাম"),
        "mother_name" => ("Mother's Name", "মাতার নাম"),
        "route_name" => ("Route", "রুট"),
        "pickup_stop" => ("Pickup Stop", "ওঠার স্থান"),
        "title" => ("Subject", "বিষয়"),
        other => (other, other),
    };

    TemplateField {
        key: key.to_string(),
        label: en.to_string(),
        label_bn: Some(bn.to_string()),
        required: matches!(key, "name" | "title" | "class_name"),
        default: None,
    }
}

// =============================================================================
// Default Template Bodies
// =============================================================================

const CARD_BODY: &str = r#"<div class="card">
  <div class="doc-title">{{ kind_name }}</div>
  {% if photo_url %}<img class="photo" src="{{ photo_url }}" alt="">{% endif %}
  <table class="fields">{% for row in rows %}
    <tr><th>{{ row.label }}</th><td>{{ row.value }}</td></tr>{% endfor %}
  </table>
  <div class="serial">{{ serial_number }}</div>
</div>"#;

const EXAM_BODY: &str = r#"<div class="doc-title">{{ kind_name }}</div>
<table class="fields">{% for row in rows %}
  <tr><th>{{ row.label }}</th><td>{{ row.value }}</td></tr>{% endfor %}
</table>
{% if values.instructions %}<div class="instructions">{{ values.instructions }}</div>{% endif %}
<div class="footer">
  <span class="serial">{{ serial_number }}</span>
  <span class="signature">{{ signature_label }}</span>
</div>"#;

const DOCUMENT_BODY: &str = r#"<div class="doc-title">{{ kind_name }}</div>
<div class="issue-date">{{ issue_date_label }}: {{ issue_date }}</div>
<table class="fields">{% for row in rows %}
  <tr><th>{{ row.label }}</th><td>{{ row.value }}</td></tr>{% endfor %}
</table>
{% if values.body %}<div class="content">{{ values.body }}</div>{% endif %}
<div class="footer">
  <span class="serial">{{ serial_number }}</span>
  <span class="signature">{{ signature_label }}</span>
</div>"#;

const PAGE_SHELL: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
<meta charset="utf-8">
<title>{{ kind_name }} {{ serial_number }}</title>
<style>
@page { size: {{ page_css }}; margin: 8mm; }
body { font-family: {{ styling.font_family }}; font-size: {{ styling.font_size_pt }}pt; color: #111; }
.page { {% if styling.show_border %}border: 2px solid {{ styling.primary_color }};{% endif %} padding: 6mm; position: relative; }
.school-name { color: {{ styling.primary_color }}; font-size: 1.4em; font-weight: bold; text-align: center; }
.school-meta { text-align: center; font-size: 0.85em; }
.logo { display: block; margin: 0 auto; max-height: 18mm; }
.doc-title { text-align: center; font-weight: bold; margin: 3mm 0; text-transform: uppercase; }
table.fields th { text-align: left; padding-right: 4mm; white-space: nowrap; }
.footer { display: flex; justify-content: space-between; margin-top: 10mm; }
.serial { font-family: monospace; font-size: 0.8em; }
.watermark { position: absolute; top: 40%; width: 100%; text-align: center; opacity: 0.08; font-size: 4em; }
</style>
</head>
<body>
<div class="page">
{% if styling.watermark %}<div class="watermark">{{ styling.watermark }}</div>{% endif %}
<header>
{% if styling.show_logo and school.logo_url %}<img class="logo" src="{{ school.logo_url }}" alt="">{% endif %}
<div class="school-name">{{ school_name }}</div>
<div class="school-meta">{{ school.address }}{% if school.eiin %} · EIIN {{ school_eiin }}{% endif %}</div>
</header>
{{ body | safe }}
</div>
</body>
</html>"#;

/// The built-in Tera body for a kind.
pub fn default_body(kind: DocumentKind) -> &'static str {
    match kind.category() {
        DocumentCategory::IdCard | DocumentCategory::Service => CARD_BODY,
        DocumentCategory::Exam => EXAM_BODY,
        _ => DOCUMENT_BODY,
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Everything needed to render one kind of document.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpec {
    pub kind: DocumentKind,
    pub language: Language,
    pub body: String,
    pub config: TemplateConfig,
}

impl TemplateSpec {
    /// The built-in template, used when a school has no custom one.
    pub fn builtin(kind: DocumentKind, language: Language) -> Self {
        TemplateSpec {
            kind,
            language,
            body: default_body(kind).to_string(),
            config: TemplateConfig::default_for(kind),
        }
    }

    /// Checks that the body parses as a Tera template and the config is sane.
    pub fn validate(&self) -> CoreResult<()> {
        self.config.validate()?;
        let mut tera = Tera::default();
        tera.add_raw_template("body", &self.body)
            .map_err(|e| CoreError::Template(describe_tera_error(&e)))?;
        Ok(())
    }
}

/// School letterhead printed at the top of every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolHeader {
    pub name: String,
    pub name_bn: Option<String>,
    pub eiin: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
}

/// Per-document data.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    pub school: SchoolHeader,
    pub serial_number: String,
    pub issue_date: NaiveDate,
    /// Flat key/value data: student fields, exam details, amounts.
    pub values: Map<String, Value>,
}

/// A rendered document artifact.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    pub serial_number: String,
    pub file_name: String,
    pub mime_type: String,
    /// The HTML page, base64 encoded.
    pub content_base64: String,
    #[serde(skip)]
    #[ts(skip)]
    pub html: String,
}

pub const HTML_MIME: &str = "text/html; charset=utf-8";

#[derive(Serialize)]
struct Row {
    label: String,
    value: String,
}

/// Renders one document.
///
/// ## Errors
/// - `CoreError::Validation` when a required field has no value and no default
/// - `CoreError::Template` when the body fails to parse or render
pub fn render(spec: &TemplateSpec, ctx: &DocumentContext) -> CoreResult<RenderedDocument> {
    let lang = spec.language;
    let values = localize_values(&ctx.values, lang);
    let rows = resolve_rows(&spec.config.fields, &values, lang)?;

    let mut context = Context::new();
    context.insert("lang", lang.as_str());
    context.insert("kind_name", spec.kind.name(lang));
    context.insert("serial_number", &ctx.serial_number);
    context.insert("issue_date", &i18n::format_date(ctx.issue_date, lang));
    context.insert(
        "issue_date_label",
        match lang {
            Language::En => "Date",
            Language::Bn => "তারিখ",
        },
    );
    context.insert(
        "signature_label",
        match lang {
            Language::En => "Head of Institution",
            Language::Bn => "প্রতিষ্ঠান প্রধান",
        },
    );
    context.insert("photo_url", &values.get("photo_url").cloned().unwrap_or(Value::Null));
    context.insert("values", &values);
    context.insert("rows", &rows);
    context.insert("school", &ctx.school);
    context.insert(
        "school_name",
        i18n::localized(&ctx.school.name, ctx.school.name_bn.as_deref(), lang),
    );
    context.insert(
        "school_eiin",
        &i18n::localize_digits(ctx.school.eiin.as_deref().unwrap_or_default(), lang),
    );

    let body = Tera::one_off(&spec.body, &context, true)
        .map_err(|e| CoreError::Template(describe_tera_error(&e)))?;

    context.insert("body", &body);
    context.insert("styling", &spec.config.styling);
    context.insert(
        "page_css",
        spec.config
            .styling
            .page_size
            .css(spec.config.styling.orientation),
    );

    let html = Tera::one_off(PAGE_SHELL, &context, true)
        .map_err(|e| CoreError::Template(describe_tera_error(&e)))?;

    Ok(RenderedDocument {
        kind: spec.kind,
        serial_number: ctx.serial_number.clone(),
        file_name: format!("{}-{}.html", spec.kind.slug(), ctx.serial_number),
        mime_type: HTML_MIME.to_string(),
        content_base64: BASE64.encode(html.as_bytes()),
        html,
    })
}

/// Tera nests the useful message in the error's source chain.
fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = std::error::Error::source(inner);
    }
    message
}

/// String values that hold numbers written as text. Everything else (URLs,
/// emails, codes) is passed through untouched.
const NUMERIC_KEYS: &[&str] = &[
    "roll_number",
    "exam_year",
    "guardian_phone",
    "phone",
    "amount",
    "receipt_number",
    "month",
];

fn localize_values(values: &Map<String, Value>, lang: Language) -> Map<String, Value> {
    values
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::Number(n) => Value::String(i18n::localize_digits(&n.to_string(), lang)),
                Value::String(s) if NUMERIC_KEYS.contains(&k.as_str()) => {
                    Value::String(i18n::localize_digits(s, lang))
                }
                other => other.clone(),
            };
            (k.clone(), v)
        })
        .collect()
}

fn resolve_rows(
    fields: &[TemplateField],
    values: &Map<String, Value>,
    lang: Language,
) -> CoreResult<Vec<Row>> {
    fields
        .iter()
        .filter_map(|field| {
            let value = match values.get(&field.key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                Some(Value::Bool(b)) => Some(b.to_string()),
                _ => field.default.clone(),
            };

            let label = match lang {
                Language::Bn => field.label_bn.clone().unwrap_or_else(|| field.label.clone()),
                Language::En => field.label.clone(),
            };

            match value {
                Some(value) => Some(Ok(Row { label, value })),
                None if field.required => Some(Err(ValidationError::required(&field.key).into())),
                None => None,
            }
        })
        .collect()
}

// =============================================================================
// Serial Numbers
// =============================================================================

/// Short code identifying a school in serial numbers.
///
/// The EIIN when the school has one, otherwise the first six hex digits
/// of its id.
pub fn school_code(eiin: Option<&str>, school_id: &str) -> String {
    match eiin.map(str::trim) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => school_id
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(6)
            .collect::<String>()
            .to_uppercase(),
    }
}

/// Builds a verifiable serial number, e.g. `ADM-108254-20261019-0007`.
pub fn serial_number(kind: DocumentKind, school_code: &str, sequence: i64, date: NaiveDate) -> String {
    format!(
        "{}-{}-{}-{:04}",
        kind.serial_prefix(),
        school_code,
        date.format("%Y%m%d"),
        sequence
    )
}

/// The decoded parts of a serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialParts {
    pub kind: DocumentKind,
    pub school_code: String,
    pub date: NaiveDate,
    pub sequence: i64,
}

/// Parses a serial built by [`serial_number`]. Malformed input yields `None`.
pub fn parse_serial_number(serial: &str) -> Option<SerialParts> {
    let mut parts = serial.trim().split('-');
    let (prefix, code, date, seq) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || code.is_empty() || seq.len() < 4 {
        return None;
    }

    Some(SerialParts {
        kind: DocumentKind::from_prefix(prefix)?,
        school_code: code.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y%m%d").ok()?,
        sequence: seq.parse().ok()?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn context(values: Value) -> DocumentContext {
        DocumentContext {
            school: SchoolHeader {
                name: "Dhaka Model School".to_string(),
                name_bn: Some("ঢাকা মডেল স্কুল".to_string()),
                eiin: Some("108254".to_string()),
                address: Some("Mirpur, Dhaka".to_string()),
                logo_url: None,
            },
            serial_number: "ADM-108254-20261019-0007".to_string(),
            issue_date: date(),
            values: values.as_object().cloned().unwrap_or_default(),
        }
    }

    fn decode(doc: &RenderedDocument) -> String {
        String::from_utf8(BASE64.decode(&doc.content_base64).unwrap()).unwrap()
    }

    #[test]
    fn test_catalogue_is_consistent() {
        let all = catalogue();
        assert_eq!(all.len(), DocumentKind::ALL.len());

        let mut slugs: Vec<_> = all.iter().map(|i| i.slug.clone()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), all.len(), "slugs must be unique");

        let mut prefixes: Vec<_> = DocumentKind::ALL.iter().map(|k| k.serial_prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), all.len(), "prefixes must be unique");

        assert!(all.iter().all(|i| i.credit_cost > 0));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("admit_card".parse::<DocumentKind>().unwrap(), DocumentKind::AdmitCard);
        assert_eq!("admit-card".parse::<DocumentKind>().unwrap(), DocumentKind::AdmitCard);
        assert!(matches!(
            "diploma".parse::<DocumentKind>(),
            Err(CoreError::UnknownDocumentKind(_))
        ));
        assert_eq!(DocumentKind::TransferCertificate.to_string(), "transfer_certificate");
        assert_eq!(DocumentKind::AdmitCard.name(Language::Bn), "প্রবেশপত্র");
        assert_eq!(DocumentKind::StudentIdCard.category(), DocumentCategory::IdCard);
    }

    #[test]
    fn test_kind_serde_matches_slug() {
        for kind in DocumentKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, Value::String(kind.slug().to_string()));
        }
    }

    #[test]
    fn test_render_admit_card_english() {
        let spec = TemplateSpec::builtin(DocumentKind::AdmitCard, Language::En);
        let doc = render(
            &spec,
            &context(json!({
                "name": "Rahim Uddin",
                "class_name": "Class 10",
                "roll_number": 42,
                "exam_name": "Half Yearly",
                "exam_year": 2026,
                "exam_center": "Main Campus",
            })),
        )
        .unwrap();

        assert_eq!(doc.mime_type, HTML_MIME);
        assert_eq!(doc.file_name, "admit_card-ADM-108254-20261019-0007.html");

        let html = decode(&doc);
        assert_eq!(html, doc.html);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Dhaka Model School"));
        assert!(html.contains("Rahim Uddin"));
        assert!(html.contains("<th>Roll</th><td>42</td>"));
        assert!(html.contains("ADM-108254-20261019-0007"));
        assert!(html.contains("size: A5 landscape"));
    }

    #[test]
    fn test_render_bangla_uses_bangla_digits_and_labels() {
        let spec = TemplateSpec::builtin(DocumentKind::AdmitCard, Language::Bn);
        let doc = render(
            &spec,
            &context(json!({
                "name": "রহিম উদ্দিন",
                "class_name": "দশম",
                "roll_number": 42,
                "exam_year": "2026",
            })),
        )
        .unwrap();

        assert!(doc.html.contains("<th>রোল</th><td>৪২</td>"));
        assert!(doc.html.contains("২০২৬"));
        assert!(doc.html.contains("ঢাকা মডেল স্কুল"));
        assert!(doc.html.contains("প্রবেশপত্র"));
        // serials stay ASCII so they can be typed into the verify page
        assert!(doc.html.contains("ADM-108254-20261019-0007"));
    }

    #[test]
    fn test_render_bangla_keeps_urls_and_emails() {
        let photo = "https://cdn.example.com/photos/2024/123.jpg";
        let spec = TemplateSpec::builtin(DocumentKind::StudentIdCard, Language::Bn);
        let doc = render(
            &spec,
            &context(json!({
                "name": "করিম",
                "class_name": "ষষ্ঠ",
                "guardian_phone": "01712345678",
                "photo_url": photo,
                "email": "karim2024@example.edu.bd",
            })),
        )
        .unwrap();

        let escaped = photo.replace('/', "&#x2F;");
        assert!(doc.html.contains(&escaped));
        assert!(!doc.html.contains("২০২৪&#x2F;১২৩"));
        assert!(doc.html.contains("০১৭১২৩৪৫৬৭৮"));

        let values = localize_values(&context(json!({ "email": "karim2024@example.edu.bd" })).values, Language::Bn);
        assert_eq!(values["email"], "karim2024@example.edu.bd");
    }

    #[test]
    fn test_render_escapes_values() {
        let spec = TemplateSpec::builtin(DocumentKind::StudentIdCard, Language::En);
        let doc = render(
            &spec,
            &context(json!({ "name": "<script>alert(1)</script>", "class_name": "Six" })),
        )
        .unwrap();

        assert!(!doc.html.contains("<script>alert(1)</script>"));
        assert!(doc.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_missing_required_field() {
        let spec = TemplateSpec::builtin(DocumentKind::CharacterCertificate, Language::En);
        let err = render(&spec, &context(json!({ "class_name": "Ten" }))).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
    }

    #[test]
    fn test_render_optional_missing_field_is_omitted() {
        let spec = TemplateSpec::builtin(DocumentKind::StudentIdCard, Language::En);
        let doc = render(&spec, &context(json!({ "name": "Karim", "class_name": "Six" }))).unwrap();
        assert!(!doc.html.contains("Blood Group"));
    }

    #[test]
    fn test_custom_template_body() {
        let spec = TemplateSpec {
            kind: DocumentKind::Notice,
            language: Language::En,
            body: "<h2>{{ values.title }}</h2><p>{{ values.body }}</p>".to_string(),
            config: TemplateConfig::default(),
        };
        let doc = render(
            &spec,
            &context(json!({ "title": "Holiday", "body": "School closed on Friday" })),
        )
        .unwrap();
        assert!(doc.html.contains("<h2>Holiday</h2>"));
        assert!(doc.html.contains("School closed on Friday"));
    }

    #[test]
    fn test_broken_template_is_rejected() {
        let spec = TemplateSpec {
            kind: DocumentKind::Notice,
            language: Language::En,
            body: "{% for x in %}".to_string(),
            config: TemplateConfig::default(),
        };
        assert!(matches!(spec.validate(), Err(CoreError::Template(_))));
        assert!(matches!(
            render(&spec, &context(json!({}))),
            Err(CoreError::Template(_))
        ));
    }

    #[test]
    fn test_config_json() {
        let cfg = TemplateConfig::from_json(&json!({
            "fields": [{ "key": "name", "label": "Name", "required": true }],
            "styling": { "primary_color": "#006a4e" }
        }))
        .unwrap();
        assert_eq!(cfg.fields.len(), 1);
        assert_eq!(cfg.styling.primary_color, "#006a4e");
        assert_eq!(cfg.styling.page_size, PageSize::A4);

        assert_eq!(TemplateConfig::from_json(&Value::Null).unwrap(), TemplateConfig::default());
        assert!(TemplateConfig::from_json(&json!({ "fields": 3 })).is_err());
    }

    #[test]
    fn test_styling_validation() {
        assert!(Styling::default().validate().is_ok());

        let bad_color = Styling {
            primary_color: "red; } body { display:none".to_string(),
            ..Styling::default()
        };
        assert!(bad_color.validate().is_err());

        let bad_font = Styling {
            font_family: "x; color: red".to_string(),
            ..Styling::default()
        };
        assert!(bad_font.validate().is_err());
    }

    #[test]
    fn test_builtin_templates_validate() {
        for kind in DocumentKind::ALL {
            TemplateSpec::builtin(kind, Language::En).validate().unwrap();
        }
    }

    #[test]
    fn test_serial_numbers() {
        let serial = serial_number(DocumentKind::AdmitCard, "108254", 7, date());
        assert_eq!(serial, "ADM-108254-20261019-0007");

        let parts = parse_serial_number(&serial).unwrap();
        assert_eq!(parts.kind, DocumentKind::AdmitCard);
        assert_eq!(parts.school_code, "108254");
        assert_eq!(parts.date, date());
        assert_eq!(parts.sequence, 7);

        assert_eq!(
            serial_number(DocumentKind::FeeReceipt, "108254", 12345, date()),
            "FEE-108254-20261019-12345"
        );
        assert!(parse_serial_number("XYZ-108254-20261019-0007").is_none());
        assert!(parse_serial_number("ADM-108254-20261399-0007").is_none());
        assert!(parse_serial_number("ADM-108254").is_none());
    }

    #[test]
    fn test_school_code() {
        assert_eq!(school_code(Some("108254"), "abc"), "108254");
        assert_eq!(
            school_code(None, "3f2b9c1e-0000-4000-8000-000000000000"),
            "3F2B9C"
        );
        assert_eq!(school_code(Some(" "), "ab-cd-ef-12"), "ABCDEF");
    }
}

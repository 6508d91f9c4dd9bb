//! # Repository Module
//!
//! Database repository implementations for Shikkha.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.students().list(&school_id, &filter)                       │
//! │       ▼                                                                 │
//! │  StudentRepository                                                     │
//! │  ├── list(&self, school_id, filter)                                    │
//! │  ├── get_by_id(&self, school_id, id)                                   │
//! │  ├── create(&self, school_id, new)                                     │
//! │  └── update(&self, school_id, id, update)                              │
//! │       │                                                                 │
//! │       │  SQL, always `WHERE school_id = $1`                            │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SchoolRepository`], [`UserRepository`] - Tenants and logins
//! - [`StudentRepository`], [`TeacherRepository`] - People records
//! - [`TemplateRepository`], [`DocumentRepository`], [`AdmitCardRepository`] - Documents
//! - [`CreditRepository`] - Balance and ledger
//! - [`FeeRepository`], [`NotificationRepository`]
//! - [`LibraryRepository`], [`InventoryRepository`], [`TransportRepository`]
//! - [`DashboardRepository`] - Aggregate counters

pub mod admit_card;
pub mod credit;
pub mod dashboard;
pub mod document;
pub mod fee;
pub mod inventory;
pub mod library;
pub mod notification;
pub mod school;
pub mod sequence;
pub mod student;
pub mod teacher;
pub mod template;
pub mod transport;
pub mod user;

pub use admit_card::AdmitCardRepository;
pub use credit::CreditRepository;
pub use dashboard::DashboardRepository;
pub use document::DocumentRepository;
pub use fee::FeeRepository;
pub use inventory::InventoryRepository;
pub use library::LibraryRepository;
pub use notification::NotificationRepository;
pub use school::SchoolRepository;
pub use student::StudentRepository;
pub use teacher::TeacherRepository;
pub use template::TemplateRepository;
pub use transport::TransportRepository;
pub use user::UserRepository;

use shikkha_core::{Role, ValidationError};
use sqlx::PgPool;

use crate::error::DbResult;

/// New UUID v4 primary key.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fails unless `user_id` is a `role` account of `school_id`.
///
/// Guards the `user_id` / `parent_user_id` links that open the portals.
pub(crate) async fn ensure_linked_user(
    pool: &PgPool,
    school_id: &str,
    field: &str,
    user_id: &str,
    role: Role,
) -> DbResult<()> {
    let linked: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND school_id = $2 AND role = $3)",
    )
    .bind(user_id)
    .bind(school_id)
    .bind(role)
    .fetch_one(pool)
    .await?;

    if !linked {
        return Err(ValidationError::invalid(field, format!("must be a {role} account of this school")).into());
    }
    Ok(())
}

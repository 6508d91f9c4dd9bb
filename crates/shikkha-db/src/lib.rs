//! # shikkha-db: Database Layer for Shikkha
//!
//! PostgreSQL access for every school, through sqlx with an async pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shikkha Data Flow                                │
//! │                                                                         │
//! │  axum handler (POST /api/documents/generate)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    shikkha-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (student.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ PgPool        │◄───│ DocumentRepo  │    │ 001_initial_ │  │   │
//! │  │   │ health check  │    │ CreditRepo    │    │ schema.sql   │  │   │
//! │  │   │               │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  │   every row carries school_id; every query filters on it        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shikkha_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("postgres://localhost/shikkha")).await?;
//!
//! let balance = db.credits().balance(&school_id).await?;
//! let students = db.students().list(&school_id, &filter).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::LedgerEntry;
pub use repository::document::HistoryFilter;
pub use repository::library::IssueStatus;
pub use repository::template::ResolvedTemplate;
pub use repository::user::UserCredentials;
pub use repository::{
    AdmitCardRepository, CreditRepository, DashboardRepository, DocumentRepository,
    FeeRepository, InventoryRepository, LibraryRepository, NotificationRepository,
    SchoolRepository, StudentRepository, TeacherRepository, TemplateRepository,
    TransportRepository, UserRepository,
};

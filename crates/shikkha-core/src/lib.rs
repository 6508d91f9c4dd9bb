//! # shikkha-core: Pure Business Logic for Shikkha
//!
//! This crate is the **heart** of Shikkha, a multi-tenant school management
//! back end. It holds every business rule as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shikkha Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 React portals (admin/teacher/...)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shikkha-api (axum)                           │   │
//! │  │    auth, routes, error mapping                                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shikkha-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  credits  │  │ documents │  │  access   │  │   │
//! │  │   │  Student  │  │  ledger   │  │  Tera     │  │  roles    │  │   │
//! │  │   │  School   │  │  packages │  │  serials  │  │  tenancy  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   library • inventory • transport • money • i18n • validation  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shikkha-db (PostgreSQL layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Schools, users, students, teachers, templates, fees, notifications
//! - [`credits`] - Credit ledger math and packages
//! - [`documents`] - Document catalogue, Tera rendering, serial numbers
//! - [`access`] - Roles, portals, access policy, tenant scoping
//! - [`library`], [`inventory`], [`transport`] - Campus modules and their rules
//! - [`money`] - Taka amounts in integer paisa
//! - [`i18n`] - Bangla digits, month names
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shikkha_core::credits::{apply_spend, charge_for, Credits};
//! use shikkha_core::documents::DocumentKind;
//!
//! let cost = charge_for(DocumentKind::AdmitCard, 40).unwrap();
//! let balance = Credits::new(100).unwrap();
//! assert_eq!(apply_spend(balance, cost).unwrap().value(), 60);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod credits;
pub mod documents;
pub mod error;
pub mod i18n;
pub mod inventory;
pub mod library;
pub mod money;
pub mod transport;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Portal, Principal, Role};
pub use documents::DocumentKind;
pub use error::{CoreError, CoreResult, ValidationError};
pub use i18n::Language;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default library loan period in days.
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Default overdue fine per day (৳5).
pub const DEFAULT_FINE_PER_DAY_PAISA: i64 = 500;

/// Most documents one generation request may produce.
pub const MAX_BATCH_SIZE: usize = 500;

/// Largest single credit grant a developer may make.
pub const MAX_CREDIT_GRANT: i64 = 1_000_000;

/// Names, titles and similar free-text fields.
pub const MAX_NAME_LEN: usize = 200;

pub const MIN_PASSWORD_LEN: usize = 8;

/// List endpoints return this many rows unless asked otherwise.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

pub const MAX_PAGE_SIZE: i64 = 200;

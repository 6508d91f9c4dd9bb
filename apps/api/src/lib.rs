//! # Shikkha API
//!
//! REST server behind every Shikkha portal.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Shikkha API                                   │
//! │                                                                         │
//! │  Browser / app ──► axum (8080) ──► TraceLayer ──► CORS                  │
//! │                                                      │                  │
//! │                                                      ▼                  │
//! │                     ┌──────────────────────────────────────────┐        │
//! │                     │  routes::<domain>                        │        │
//! │                     │    AuthUser   (JWT: Bearer or cookie)    │        │
//! │                     │    require()  (role policy)              │        │
//! │                     │    school()   (tenant scope)             │        │
//! │                     └───────────────────┬──────────────────────┘        │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                     shikkha-db repositories ──► PostgreSQL              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. The usual variables:
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `JWT_SECRET` - Secret for JWT signing (32+ bytes in production)
//! - `PORT` - HTTP port (default: 8080)
//! - `SHIKKHA_CONFIG` - optional TOML file
//! - `SHIKKHA__<FIELD>` - any other setting

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

//! Shared state handed to every handler.

use std::sync::Arc;

use shikkha_db::{Database, LibraryRepository};

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Cloned per request; the pool and the managers are reference counted.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            &config.jwt_secret,
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// Library repository carrying the configured loan period and fine.
    pub fn library(&self) -> LibraryRepository {
        self.db.library().with_policy(self.config.library_policy())
    }
}

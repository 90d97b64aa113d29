//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::JwtHandler;
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Session token issuer and validator
    pub jwt: Arc<JwtHandler>,
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(repository: Arc<dyn FullRepository>, jwt: Arc<JwtHandler>) -> Self {
        Self {
            repository,
            jwt,
            cors_origins: super::config::default_cors_origins().into(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins.into();
        self
    }
}

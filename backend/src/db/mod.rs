//! Database module for team, athlete, match and training storage.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services/) - Business Logic             │
//! │  - Validation and ownership checks                      │
//! │  - Response composition (dashboard, player evolution)   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └──────────┬────────────────────────────────┬─────────────┘
//!            │                                │
//! ┌──────────▼──────────┐        ┌────────────▼────────────┐
//! │  Postgres (Diesel)  │        │  Local (in-memory)      │
//! └─────────────────────┘        └─────────────────────────┘
//! ```
//!
//! Career counters are maintained inside the repository, in the same
//! transaction as the performance rows they summarize. The arithmetic lives
//! in [`ledger`] so both backends agree on it.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod ledger;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use repo_config::RepositoryConfig;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AthleteRepository, ErrorContext, FullRepository, MatchRepository, RepositoryError,
    RepositoryResult, TeamRepository, TrainingRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton.
///
/// Selection order: the compiled-in backend (Postgres over local when both
/// features are enabled), then `repository.toml` or the environment. See
/// [`RepositoryBuilder::from_startup_sources`]. Calling it again returns the
/// already initialized instance.
pub async fn init_repository() -> Result<Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo.clone());
    }

    let repo = RepositoryFactory::from_startup_sources()
        .await
        .map_err(|e| anyhow::Error::msg(e.to_string()))
        .context("Failed to initialize repository")?;
    let _ = REPOSITORY.set(repo);
    get_repository().cloned()
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}

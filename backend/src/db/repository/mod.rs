//! Repository trait definitions for database operations.
//!
//! The storage contract is split across focused traits so each backend
//! implementation stays readable and each service states what it needs.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`team`]: Users, teams and ownership lookups
//! - [`athlete`]: Athletes, careers and transfers
//! - [`matches`]: Matches and per-athlete performance rows
//! - [`training`]: Trainings, classes and class attendance
//!
//! # Transactions
//!
//! Methods documented as transactional apply all of their writes or none of
//! them. The Postgres backend wraps them in a database transaction; the local
//! backend performs every check before mutating under a single write lock.
//!
//! # Convenience Trait Bound
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let team = repo.get_team(team_id).await?;
//!     let careers = repo.list_team_careers(team.id).await?;
//!     Ok(())
//! }
//! ```

pub mod athlete;
pub mod error;
pub mod matches;
pub mod team;
pub mod training;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use athlete::AthleteRepository;
pub use matches::MatchRepository;
pub use team::TeamRepository;
pub use training::TrainingRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    TeamRepository + AthleteRepository + MatchRepository + TrainingRepository
{
}

impl<T> FullRepository for T where
    T: TeamRepository + AthleteRepository + MatchRepository + TrainingRepository
{
}

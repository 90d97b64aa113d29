//! Users, teams and ownership.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::RepositoryResult;
use crate::api::{NewTeam, NewUser, Team, TeamPatch, User};

/// Repository trait for users and the teams they own.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Users ====================

    /// Insert a user.
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(RepositoryError::Conflict)` - If the email is already registered
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;

    async fn get_user(&self, id: Uuid) -> RepositoryResult<User>;

    async fn get_users(&self, ids: &[Uuid]) -> RepositoryResult<Vec<User>>;

    /// Look a user up by exact email. Absence is not an error.
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    // ==================== Teams ====================

    async fn create_team(&self, owner_id: Uuid, team: NewTeam) -> RepositoryResult<Team>;

    /// Fetch a team or fail with `NotFound`.
    async fn get_team(&self, id: Uuid) -> RepositoryResult<Team>;

    /// Fetch the subset of `ids` that exist. Order is unspecified.
    async fn get_teams(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Team>>;

    /// All teams ordered by full name.
    async fn list_teams(&self) -> RepositoryResult<Vec<Team>>;

    /// Teams created by `owner_id` ordered by full name.
    async fn list_teams_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Team>>;

    async fn update_team(&self, id: Uuid, patch: TeamPatch) -> RepositoryResult<Team>;

    /// Subset of `team_ids` owned by `owner_id`.
    async fn owned_team_ids(
        &self,
        owner_id: Uuid,
        team_ids: &[Uuid],
    ) -> RepositoryResult<Vec<Uuid>>;
}

//! Match repository trait.
//!
//! Performance rows and the denormalized career counters are always written
//! together. See [`crate::db::ledger`] for the arithmetic.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::RepositoryResult;
use crate::api::{
    Match, MatchAthlete, MatchFilter, MatchPatch, NewMatch, PerformanceEntry, PerformanceFilter,
};

#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert a match with its performance rows. Transactional.
    ///
    /// Duplicate `(athlete, team)` entries are merged first, so each pair
    /// is stored once. Every pair's career gains one match plus the row's
    /// goals, assists and cards.
    ///
    /// # Returns
    /// * `Ok(Match)` - The stored match
    /// * `Err(RepositoryError::BadRequest)` - If a pair has no career row
    /// * `Err(RepositoryError::ValidationError)` - If a counter would overflow;
    ///   nothing is written
    async fn create_match(
        &self,
        new_match: NewMatch,
        performances: Vec<PerformanceEntry>,
    ) -> RepositoryResult<Match>;

    /// Patch a match and optionally replace its performance rows. Transactional.
    ///
    /// When `performances` is `Some`, the old rows are reversed out of the
    /// careers, deleted, and the new rows inserted and applied. Career match
    /// counters are left unchanged by a replacement.
    async fn update_match(
        &self,
        id: Uuid,
        patch: MatchPatch,
        performances: Option<Vec<PerformanceEntry>>,
    ) -> RepositoryResult<Match>;

    /// Fetch a match or fail with `NotFound`.
    async fn get_match(&self, id: Uuid) -> RepositoryResult<Match>;

    async fn get_matches(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Match>>;

    /// Matches passing `filter`, newest first.
    async fn list_matches(&self, filter: MatchFilter) -> RepositoryResult<Vec<Match>>;

    async fn list_match_athletes(&self, match_id: Uuid) -> RepositoryResult<Vec<MatchAthlete>>;

    /// Insert a single performance row and apply it to the career. Transactional.
    ///
    /// Fails with `Conflict` if the row already exists.
    async fn create_match_athlete(&self, row: MatchAthlete) -> RepositoryResult<MatchAthlete>;

    async fn list_performances(
        &self,
        filter: PerformanceFilter,
    ) -> RepositoryResult<Vec<MatchAthlete>>;
}

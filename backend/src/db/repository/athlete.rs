//! Athlete and career repository trait.
//!
//! A career is the tenure of one athlete at one team. Open careers
//! (`finished_at = None`) carry the unique shirt numbers of a team and are
//! the only ones that accept new match statistics.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::error::RepositoryResult;
use crate::api::{
    Athlete, AthleteCareer, AthletePatch, CareerPatch, NewAthlete, NewCareer, TransferRequest,
};

#[async_trait]
pub trait AthleteRepository: Send + Sync {
    // ==================== Athletes ====================

    /// Insert an athlete together with its first career. Transactional.
    ///
    /// # Arguments
    /// * `athlete` - Name and birthdate
    /// * `career` - Team, shirt number and position of the opening career
    /// * `started_at` - Start date of the career
    ///
    /// # Returns
    /// * `Ok((Athlete, AthleteCareer))` - The stored rows
    /// * `Err(RepositoryError::Conflict)` - If the shirt number is held by an
    ///   open career of the same team
    async fn create_athlete_with_career(
        &self,
        athlete: NewAthlete,
        career: NewCareer,
        started_at: NaiveDate,
    ) -> RepositoryResult<(Athlete, AthleteCareer)>;

    /// Fetch an athlete or fail with `NotFound`.
    async fn get_athlete(&self, id: Uuid) -> RepositoryResult<Athlete>;

    async fn get_athletes(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Athlete>>;

    async fn list_athletes(&self) -> RepositoryResult<Vec<Athlete>>;

    // ==================== Careers ====================

    /// Career of `athlete_id` at `team_id`, open or closed.
    async fn get_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
    ) -> RepositoryResult<Option<AthleteCareer>>;

    /// Career of `athlete_id` at `team_id` if it is still open.
    async fn find_open_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
    ) -> RepositoryResult<Option<AthleteCareer>> {
        Ok(self
            .get_career(athlete_id, team_id)
            .await?
            .filter(AthleteCareer::is_open))
    }

    /// Open career of `team_id` currently wearing `shirt_number`.
    async fn find_open_career_by_shirt(
        &self,
        team_id: Uuid,
        shirt_number: i32,
    ) -> RepositoryResult<Option<AthleteCareer>>;

    /// Every career of a team joined with its athlete.
    async fn list_team_careers(
        &self,
        team_id: Uuid,
    ) -> RepositoryResult<Vec<(Athlete, AthleteCareer)>>;

    async fn list_athlete_careers(&self, athlete_id: Uuid)
        -> RepositoryResult<Vec<AthleteCareer>>;

    /// Every career joined with its athlete.
    async fn list_careers(&self) -> RepositoryResult<Vec<(Athlete, AthleteCareer)>>;

    /// Patch an athlete and its career at `team_id`. Transactional.
    ///
    /// Either patch may be empty. Nothing is written unless both apply.
    ///
    /// # Returns
    /// * `Ok((Athlete, AthleteCareer))` - Both records after the patch
    /// * `Err(RepositoryError::NotFound)` - If there is no such career
    /// * `Err(RepositoryError::Conflict)` - If the new shirt number is held by
    ///   another open career of the team
    async fn update_athlete_with_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
        athlete: AthletePatch,
        career: CareerPatch,
    ) -> RepositoryResult<(Athlete, AthleteCareer)>;

    /// Delete a career and, when it was the last one, the athlete. Transactional.
    ///
    /// The athlete's performance rows for the team and attendance rows for
    /// the team's classes go with the career, so no row outlives its career.
    ///
    /// # Returns
    /// * `Ok(true)` - The athlete itself was removed
    /// * `Ok(false)` - Only the career was removed
    /// * `Err(RepositoryError::NotFound)` - If there is no such career
    async fn delete_career(&self, athlete_id: Uuid, team_id: Uuid) -> RepositoryResult<bool>;

    /// Close the source career and open a zeroed one at the target. Transactional.
    ///
    /// The caller has already resolved the shirt number and position to carry
    /// over. Implementations re-check the preconditions inside the
    /// transaction:
    /// - the source career exists and is open (`NotFound` otherwise)
    /// - no career row exists for the athlete at the target (`Conflict`)
    /// - the shirt number is free among open target careers (`Conflict`)
    ///
    /// # Returns
    /// The newly opened target career.
    async fn transfer_athlete(&self, request: TransferRequest) -> RepositoryResult<AthleteCareer>;
}

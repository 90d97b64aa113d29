//! Training sessions, classes and attendance.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::error::RepositoryResult;
use crate::api::{
    ClassAthlete, ClassAthletePatch, NewTrainingClass, Training, TrainingClass,
    TrainingClassPatch, TrainingFilter, TrainingPatch,
};

/// Repository trait for trainings.
///
/// Lookups are scoped by parent: a training is only found through its team
/// and a class only through its training. A mismatch is `NotFound`.
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    // ==================== Trainings ====================

    async fn create_training(&self, team_id: Uuid, date: NaiveDate) -> RepositoryResult<Training>;

    async fn get_training(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<Training>;

    /// Trainings of a team passing `filter`, latest date first.
    async fn list_trainings(
        &self,
        team_id: Uuid,
        filter: TrainingFilter,
    ) -> RepositoryResult<Vec<Training>>;

    async fn update_training(
        &self,
        team_id: Uuid,
        training_id: Uuid,
        patch: TrainingPatch,
    ) -> RepositoryResult<Training>;

    /// Delete a training with its classes and attendance rows.
    async fn delete_training(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<()>;

    // ==================== Classes ====================

    async fn create_class(
        &self,
        training_id: Uuid,
        class: NewTrainingClass,
    ) -> RepositoryResult<TrainingClass>;

    async fn get_class(&self, training_id: Uuid, class_id: Uuid)
        -> RepositoryResult<TrainingClass>;

    /// Classes belonging to any of `training_ids`, oldest first.
    async fn list_classes(&self, training_ids: &[Uuid]) -> RepositoryResult<Vec<TrainingClass>>;

    async fn update_class(
        &self,
        training_id: Uuid,
        class_id: Uuid,
        patch: TrainingClassPatch,
    ) -> RepositoryResult<TrainingClass>;

    /// Delete a class with its attendance rows.
    async fn delete_class(&self, training_id: Uuid, class_id: Uuid) -> RepositoryResult<()>;

    // ==================== Class attendance ====================

    /// Fails with `Conflict` if the athlete is already in the class.
    async fn add_class_athlete(&self, row: ClassAthlete) -> RepositoryResult<ClassAthlete>;

    /// Attendance rows belonging to any of `class_ids`.
    async fn list_class_athletes(&self, class_ids: &[Uuid])
        -> RepositoryResult<Vec<ClassAthlete>>;

    async fn update_class_athlete(
        &self,
        class_id: Uuid,
        athlete_id: Uuid,
        patch: ClassAthletePatch,
    ) -> RepositoryResult<ClassAthlete>;

    async fn remove_class_athlete(&self, class_id: Uuid, athlete_id: Uuid)
        -> RepositoryResult<()>;
}

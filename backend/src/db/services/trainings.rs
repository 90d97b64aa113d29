//! Trainings, their classes and per-athlete class attendance.
//!
//! Every operation is restricted to the owner of the team. Trainings are
//! resolved through their team and classes through their training, so an id
//! belonging to another parent is reported as not found.

use std::collections::HashMap;

use log::info;
use uuid::Uuid;

use super::{require_owner, validate};
use crate::api::{
    AthleteSummary, ClassAthlete, ClassAthleteDetail, ClassAthletePatch, CreateTrainingRequest,
    NewClassAthlete, NewTrainingClass, Training, TrainingClass, TrainingClassDetail,
    TrainingClassPatch, TrainingDetail, TrainingFilter, TrainingListQuery, TrainingPatch,
};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

const NOTES_MAX: usize = 4096;

fn empty_patch(operation: &str) -> RepositoryError {
    RepositoryError::bad_request_with_context(
        "At least one field must be provided",
        ErrorContext::new(operation),
    )
}

/// Parse the `concluded` query flag, which only accepts `true` or `false`.
fn parse_filter(query: TrainingListQuery) -> RepositoryResult<TrainingFilter> {
    let concluded = match query.concluded.as_deref() {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(_) => {
            return Err(RepositoryError::validation_with_context(
                "concluded must be true or false",
                ErrorContext::new("list_trainings").with_entity("concluded"),
            ))
        }
    };
    Ok(TrainingFilter {
        from: query.from,
        to: query.to,
        concluded,
    })
}

/// Nest classes, attendance rows and athlete summaries under each training.
async fn with_classes<R: FullRepository + ?Sized>(
    repo: &R,
    trainings: Vec<Training>,
) -> RepositoryResult<Vec<TrainingDetail>> {
    let training_ids: Vec<Uuid> = trainings.iter().map(|t| t.id).collect();
    let classes = repo.list_classes(&training_ids).await?;
    let class_ids: Vec<Uuid> = classes.iter().map(|c| c.id).collect();
    let rows = repo.list_class_athletes(&class_ids).await?;

    let athlete_ids: Vec<Uuid> = rows.iter().map(|r| r.athlete_id).collect();
    let athletes: HashMap<Uuid, AthleteSummary> = repo
        .get_athletes(&athlete_ids)
        .await?
        .iter()
        .map(|a| (a.id, AthleteSummary::from(a)))
        .collect();

    let mut by_class: HashMap<Uuid, Vec<ClassAthleteDetail>> = HashMap::new();
    for row in rows {
        if let Some(athlete) = athletes.get(&row.athlete_id).cloned() {
            by_class
                .entry(row.training_class_id)
                .or_default()
                .push(ClassAthleteDetail { row, athlete });
        }
    }

    let mut by_training: HashMap<Uuid, Vec<TrainingClassDetail>> = HashMap::new();
    for class in classes {
        let athlete_stats = by_class.remove(&class.id).unwrap_or_default();
        by_training
            .entry(class.training_id)
            .or_default()
            .push(TrainingClassDetail {
                class,
                athlete_stats,
            });
    }

    Ok(trainings
        .into_iter()
        .map(|training| TrainingDetail {
            classes: by_training.remove(&training.id).unwrap_or_default(),
            training,
        })
        .collect())
}

// ==================== Trainings ====================

pub async fn list_trainings<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    query: TrainingListQuery,
) -> RepositoryResult<Vec<TrainingDetail>> {
    require_owner(repo, user_id, team_id, "list_trainings").await?;
    let filter = parse_filter(query)?;
    let trainings = repo.list_trainings(team_id, filter).await?;
    with_classes(repo, trainings).await
}

pub async fn create_training<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    request: CreateTrainingRequest,
) -> RepositoryResult<Training> {
    require_owner(repo, user_id, team_id, "create_training").await?;
    let training = repo.create_training(team_id, request.date).await?;
    info!("Scheduled training {} for team {}", training.id, team_id);
    Ok(training)
}

pub async fn get_training<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
) -> RepositoryResult<TrainingDetail> {
    require_owner(repo, user_id, team_id, "get_training").await?;
    let training = repo.get_training(team_id, training_id).await?;
    let mut details = with_classes(repo, vec![training]).await?;
    details.pop().ok_or_else(|| {
        RepositoryError::internal_with_context(
            "Training vanished while loading",
            ErrorContext::new("get_training").with_entity_id(training_id),
        )
    })
}

pub async fn update_training<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    patch: TrainingPatch,
) -> RepositoryResult<Training> {
    require_owner(repo, user_id, team_id, "update_training").await?;
    repo.get_training(team_id, training_id).await?;
    if patch.is_empty() {
        return Err(empty_patch("update_training"));
    }
    repo.update_training(team_id, training_id, patch).await
}

/// Delete a training with its classes and attendance rows.
pub async fn delete_training<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
) -> RepositoryResult<()> {
    require_owner(repo, user_id, team_id, "delete_training").await?;
    repo.delete_training(team_id, training_id).await?;
    info!("Deleted training {} of team {}", training_id, team_id);
    Ok(())
}

// ==================== Classes ====================

fn validate_class_text(
    title: Option<&str>,
    description: Option<&str>,
    notes: Option<&str>,
) -> RepositoryResult<()> {
    validate::optional_length("title", title, 3, 1024)?;
    validate::optional_length("description", description, 0, NOTES_MAX)?;
    validate::optional_length("notes", notes, 0, NOTES_MAX)
}

pub async fn create_class<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class: NewTrainingClass,
) -> RepositoryResult<TrainingClass> {
    require_owner(repo, user_id, team_id, "create_class").await?;
    repo.get_training(team_id, training_id).await?;
    validate_class_text(
        Some(&class.title),
        class.description.as_deref(),
        class.notes.as_deref(),
    )?;
    repo.create_class(training_id, class).await
}

pub async fn get_class<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
) -> RepositoryResult<TrainingClassDetail> {
    require_owner(repo, user_id, team_id, "get_class").await?;
    let training = repo.get_training(team_id, training_id).await?;
    let class = repo.get_class(training.id, class_id).await?;

    let rows = repo.list_class_athletes(&[class.id]).await?;
    let athlete_ids: Vec<Uuid> = rows.iter().map(|r| r.athlete_id).collect();
    let athletes: HashMap<Uuid, AthleteSummary> = repo
        .get_athletes(&athlete_ids)
        .await?
        .iter()
        .map(|a| (a.id, AthleteSummary::from(a)))
        .collect();

    let athlete_stats = rows
        .into_iter()
        .filter_map(|row| {
            athletes
                .get(&row.athlete_id)
                .cloned()
                .map(|athlete| ClassAthleteDetail { row, athlete })
        })
        .collect();
    Ok(TrainingClassDetail {
        class,
        athlete_stats,
    })
}

/// Patch a class. An empty patch is a `BadRequest`.
pub async fn update_class<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
    patch: TrainingClassPatch,
) -> RepositoryResult<TrainingClass> {
    require_owner(repo, user_id, team_id, "update_class").await?;
    repo.get_training(team_id, training_id).await?;
    repo.get_class(training_id, class_id).await?;
    if patch.is_empty() {
        return Err(empty_patch("update_class"));
    }
    validate_class_text(
        patch.title.as_deref(),
        patch.description.as_deref(),
        patch.notes.as_deref(),
    )?;
    repo.update_class(training_id, class_id, patch).await
}

pub async fn delete_class<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
) -> RepositoryResult<()> {
    require_owner(repo, user_id, team_id, "delete_class").await?;
    repo.get_training(team_id, training_id).await?;
    repo.delete_class(training_id, class_id).await
}

// ==================== Class attendance ====================

/// Resolve team → training → class, failing with `NotFound` on any mismatch.
async fn resolve_class<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
    operation: &str,
) -> RepositoryResult<TrainingClass> {
    require_owner(repo, user_id, team_id, operation).await?;
    repo.get_training(team_id, training_id).await?;
    repo.get_class(training_id, class_id).await
}

/// Register an athlete of the team in a class.
pub async fn add_class_athlete<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
    request: NewClassAthlete,
) -> RepositoryResult<ClassAthlete> {
    let class = resolve_class(
        repo,
        user_id,
        team_id,
        training_id,
        class_id,
        "add_class_athlete",
    )
    .await?;
    validate::optional_length("notes", request.notes.as_deref(), 0, NOTES_MAX)?;
    validate::json_object("stats", request.stats.as_ref())?;

    if repo
        .find_open_career(request.athlete_id, team_id)
        .await?
        .is_none()
    {
        return Err(RepositoryError::bad_request_with_context(
            "Athlete has no active career with this team",
            ErrorContext::new("add_class_athlete")
                .with_entity("career")
                .with_entity_id(request.athlete_id),
        ));
    }

    repo.add_class_athlete(ClassAthlete {
        training_class_id: class.id,
        athlete_id: request.athlete_id,
        present: request.present,
        notes: request.notes,
        stats: request.stats,
    })
    .await
}

/// Patch attendance. An empty patch is a `BadRequest`.
pub async fn update_class_athlete<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
    athlete_id: Uuid,
    patch: ClassAthletePatch,
) -> RepositoryResult<ClassAthlete> {
    resolve_class(
        repo,
        user_id,
        team_id,
        training_id,
        class_id,
        "update_class_athlete",
    )
    .await?;
    if patch.is_empty() {
        return Err(empty_patch("update_class_athlete"));
    }
    validate::optional_length("notes", patch.notes.as_deref(), 0, NOTES_MAX)?;
    validate::json_object("stats", patch.stats.as_ref())?;
    repo.update_class_athlete(class_id, athlete_id, patch).await
}

pub async fn remove_class_athlete<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    training_id: Uuid,
    class_id: Uuid,
    athlete_id: Uuid,
) -> RepositoryResult<()> {
    resolve_class(
        repo,
        user_id,
        team_id,
        training_id,
        class_id,
        "remove_class_athlete",
    )
    .await?;
    repo.remove_class_athlete(class_id, athlete_id).await
}

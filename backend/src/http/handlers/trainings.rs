//! Training, class and attendance endpoints, all scoped to a team owned by
//! the caller. Bodies are wrapped in [`Envelope`].

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::HandlerResult;
use crate::db::services::trainings;
use crate::http::dto::{
    ClassAthlete, ClassAthletePatch, CreateTrainingRequest, Deleted, Envelope, NewClassAthlete,
    NewTrainingClass, Training, TrainingClass, TrainingClassDetail, TrainingClassPatch,
    TrainingDetail, TrainingListQuery, TrainingPatch,
};
use crate::http::error::AppError;
use crate::http::extract::{AppJson, AppPath, AppQuery, AuthUser};
use crate::http::state::AppState;

type EnvelopeResult<T> = HandlerResult<Envelope<T>>;
type CreatedEnvelope<T> = Result<(StatusCode, Json<Envelope<T>>), AppError>;

fn wrap<T>(data: T) -> EnvelopeResult<T> {
    Ok(Json(Envelope::ok(data)))
}

fn wrap_created<T>(data: T) -> CreatedEnvelope<T> {
    Ok((StatusCode::CREATED, Json(Envelope::ok(data))))
}

/// GET /v1/teams/{team_id}/trainings?from&to&concluded
pub async fn list_trainings(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(team_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TrainingListQuery>,
) -> EnvelopeResult<Vec<TrainingDetail>> {
    wrap(trainings::list_trainings(state.repository.as_ref(), user.id, team_id, query).await?)
}

/// POST /v1/teams/{team_id}/trainings
pub async fn create_training(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(team_id): AppPath<Uuid>,
    AppJson(request): AppJson<CreateTrainingRequest>,
) -> CreatedEnvelope<Training> {
    wrap_created(
        trainings::create_training(state.repository.as_ref(), user.id, team_id, request).await?,
    )
}

/// GET /v1/teams/{team_id}/trainings/{training_id}
pub async fn get_training(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id)): AppPath<(Uuid, Uuid)>,
) -> EnvelopeResult<TrainingDetail> {
    wrap(trainings::get_training(state.repository.as_ref(), user.id, team_id, training_id).await?)
}

/// PATCH /v1/teams/{team_id}/trainings/{training_id}
pub async fn update_training(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id)): AppPath<(Uuid, Uuid)>,
    AppJson(patch): AppJson<TrainingPatch>,
) -> EnvelopeResult<Training> {
    wrap(
        trainings::update_training(
            state.repository.as_ref(),
            user.id,
            team_id,
            training_id,
            patch,
        )
        .await?,
    )
}

/// DELETE /v1/teams/{team_id}/trainings/{training_id}
pub async fn delete_training(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id)): AppPath<(Uuid, Uuid)>,
) -> HandlerResult<Deleted> {
    trainings::delete_training(state.repository.as_ref(), user.id, team_id, training_id).await?;
    Ok(Json(Deleted::ok()))
}

/// POST /v1/teams/{team_id}/trainings/{training_id}/classes
pub async fn create_class(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id)): AppPath<(Uuid, Uuid)>,
    AppJson(class): AppJson<NewTrainingClass>,
) -> CreatedEnvelope<TrainingClass> {
    wrap_created(
        trainings::create_class(
            state.repository.as_ref(),
            user.id,
            team_id,
            training_id,
            class,
        )
        .await?,
    )
}

/// GET …/classes/{class_id}
pub async fn get_class(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id, class_id)): AppPath<(Uuid, Uuid, Uuid)>,
) -> EnvelopeResult<TrainingClassDetail> {
    wrap(
        trainings::get_class(
            state.repository.as_ref(),
            user.id,
            team_id,
            training_id,
            class_id,
        )
        .await?,
    )
}

/// PATCH …/classes/{class_id}
pub async fn update_class(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id, class_id)): AppPath<(Uuid, Uuid, Uuid)>,
    AppJson(patch): AppJson<TrainingClassPatch>,
) -> EnvelopeResult<TrainingClass> {
    wrap(
        trainings::update_class(
            state.repository.as_ref(),
            user.id,
            team_id,
            training_id,
            class_id,
            patch,
        )
        .await?,
    )
}

/// DELETE …/classes/{class_id}
pub async fn delete_class(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id, class_id)): AppPath<(Uuid, Uuid, Uuid)>,
) -> HandlerResult<Deleted> {
    trainings::delete_class(
        state.repository.as_ref(),
        user.id,
        team_id,
        training_id,
        class_id,
    )
    .await?;
    Ok(Json(Deleted::ok()))
}

/// POST …/classes/{class_id}/athletes
pub async fn add_class_athlete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id, class_id)): AppPath<(Uuid, Uuid, Uuid)>,
    AppJson(request): AppJson<NewClassAthlete>,
) -> CreatedEnvelope<ClassAthlete> {
    wrap_created(
        trainings::add_class_athlete(
            state.repository.as_ref(),
            user.id,
            team_id,
            training_id,
            class_id,
            request,
        )
        .await?,
    )
}

/// PATCH …/classes/{class_id}/athletes/{athlete_id}
pub async fn update_class_athlete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id, class_id, athlete_id)): AppPath<(Uuid, Uuid, Uuid, Uuid)>,
    AppJson(patch): AppJson<ClassAthletePatch>,
) -> EnvelopeResult<ClassAthlete> {
    wrap(
        trainings::update_class_athlete(
            state.repository.as_ref(),
            user.id,
            team_id,
            training_id,
            class_id,
            athlete_id,
            patch,
        )
        .await?,
    )
}

/// DELETE …/classes/{class_id}/athletes/{athlete_id}
pub async fn remove_class_athlete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, training_id, class_id, athlete_id)): AppPath<(Uuid, Uuid, Uuid, Uuid)>,
) -> HandlerResult<Deleted> {
    trainings::remove_class_athlete(
        state.repository.as_ref(),
        user.id,
        team_id,
        training_id,
        class_id,
        athlete_id,
    )
    .await?;
    Ok(Json(Deleted::ok()))
}

//! Team athlete endpoints and the athlete detail view.

use axum::{extract::State, Json};
use uuid::Uuid;

use super::{created, CreatedResult, HandlerResult};
use crate::api::AthleteCareer;
use crate::db::services::athletes;
use crate::http::dto::{
    AthleteDetail, AthleteTeamStats, AthleteTrainings, AthleteTrainingsQuery, AthleteWithCareer,
    CreateTeamAthleteRequest, PageQuery, TeamAthleteFilter, TransferAthleteRequest,
};
use crate::http::extract::{AppJson, AppPath, AppQuery, AuthUser};
use crate::http::state::AppState;

/// GET /v1/teams/{team_id}/athletes
pub async fn list_team_athletes(
    State(state): State<AppState>,
    AppPath(team_id): AppPath<Uuid>,
    AppQuery(filter): AppQuery<TeamAthleteFilter>,
) -> HandlerResult<Vec<AthleteWithCareer>> {
    Ok(Json(
        athletes::list_team_athletes(state.repository.as_ref(), team_id, &filter).await?,
    ))
}

/// POST /v1/teams/{team_id}/athletes
pub async fn create_team_athlete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(team_id): AppPath<Uuid>,
    AppJson(request): AppJson<CreateTeamAthleteRequest>,
) -> CreatedResult<AthleteWithCareer> {
    created(
        athletes::create_team_athlete(state.repository.as_ref(), user.id, team_id, request).await?,
    )
}

/// POST /v1/teams/{team_id}/athletes/{athlete_id}/transfer
pub async fn transfer_athlete(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((team_id, athlete_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<TransferAthleteRequest>,
) -> CreatedResult<AthleteCareer> {
    created(
        athletes::transfer_athlete(
            state.repository.as_ref(),
            user.id,
            athlete_id,
            team_id,
            request,
        )
        .await?,
    )
}

/// GET /v1/teams/{team_id}/athletes/{athlete_id}/stats
pub async fn athlete_team_stats(
    State(state): State<AppState>,
    AppPath((team_id, athlete_id)): AppPath<(Uuid, Uuid)>,
) -> HandlerResult<AthleteTeamStats> {
    Ok(Json(
        athletes::athlete_team_stats(state.repository.as_ref(), team_id, athlete_id).await?,
    ))
}

/// GET /v1/teams/{team_id}/athletes/{athlete_id}/trainings
pub async fn athlete_team_trainings(
    State(state): State<AppState>,
    AppPath((team_id, athlete_id)): AppPath<(Uuid, Uuid)>,
    AppQuery(query): AppQuery<AthleteTrainingsQuery>,
) -> HandlerResult<AthleteTrainings> {
    Ok(Json(
        athletes::athlete_team_trainings(state.repository.as_ref(), team_id, athlete_id, query)
            .await?,
    ))
}

/// GET /v1/athletes/{athlete_id}?limit&offset
pub async fn athlete_detail(
    State(state): State<AppState>,
    AppPath(athlete_id): AppPath<Uuid>,
    AppQuery(page): AppQuery<PageQuery>,
) -> HandlerResult<AthleteDetail> {
    Ok(Json(
        athletes::athlete_detail(state.repository.as_ref(), athlete_id, page).await?,
    ))
}

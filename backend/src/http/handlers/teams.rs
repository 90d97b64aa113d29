//! Team endpoints.

use axum::{extract::State, Json};
use uuid::Uuid;

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::teams;
use crate::http::dto::{NewTeam, Team, TeamDetail, TeamPatch, TeamWithOwner};
use crate::http::extract::{AppJson, AppPath, AuthUser};
use crate::http::state::AppState;

/// GET /v1/teams
///
/// Teams owned by the caller.
pub async fn own_teams(State(state): State<AppState>, user: AuthUser) -> HandlerResult<Vec<Team>> {
    Ok(Json(teams::own_teams(state.repository.as_ref(), user.id).await?))
}

/// POST /v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(team): AppJson<NewTeam>,
) -> CreatedResult<Team> {
    created(teams::create_team(state.repository.as_ref(), user.id, team).await?)
}

/// GET /v1/teams/all
pub async fn all_teams(State(state): State<AppState>) -> HandlerResult<Vec<TeamWithOwner>> {
    Ok(Json(teams::all_teams(state.repository.as_ref()).await?))
}

/// GET /v1/teams/{team_id}
pub async fn team_detail(
    State(state): State<AppState>,
    AppPath(team_id): AppPath<Uuid>,
) -> HandlerResult<TeamDetail> {
    Ok(Json(teams::team_detail(state.repository.as_ref(), team_id).await?))
}

/// PATCH /v1/teams/{team_id}
pub async fn update_team(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(team_id): AppPath<Uuid>,
    AppJson(patch): AppJson<TeamPatch>,
) -> HandlerResult<Team> {
    Ok(Json(
        teams::update_team(state.repository.as_ref(), user.id, team_id, patch).await?,
    ))
}

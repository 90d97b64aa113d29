//! Flat player endpoints. Update and delete address one career through `?teamId=`.

use axum::{extract::State, Json};
use uuid::Uuid;

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::players;
use crate::http::dto::{
    AthleteWithCareer, CreatePlayerRequest, Deleted, PlayerFilter, TeamIdQuery,
    UpdatePlayerRequest,
};
use crate::http::extract::{AppJson, AppPath, AppQuery, AuthUser};
use crate::http::state::AppState;

/// GET /v1/players?teamId&position&name
pub async fn list_players(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<PlayerFilter>,
) -> HandlerResult<Vec<AthleteWithCareer>> {
    Ok(Json(players::list_players(state.repository.as_ref(), &filter).await?))
}

/// POST /v1/players
pub async fn create_player(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreatePlayerRequest>,
) -> CreatedResult<AthleteWithCareer> {
    created(players::create_player(state.repository.as_ref(), user.id, request).await?)
}

/// GET /v1/players/{athlete_id}
pub async fn get_player(
    State(state): State<AppState>,
    AppPath(athlete_id): AppPath<Uuid>,
) -> HandlerResult<AthleteWithCareer> {
    Ok(Json(players::get_player(state.repository.as_ref(), athlete_id).await?))
}

/// PUT /v1/players/{athlete_id}?teamId=
pub async fn update_player(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(athlete_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TeamIdQuery>,
    AppJson(request): AppJson<UpdatePlayerRequest>,
) -> HandlerResult<AthleteWithCareer> {
    Ok(Json(
        players::update_player(
            state.repository.as_ref(),
            user.id,
            athlete_id,
            query.team_id,
            request,
        )
        .await?,
    ))
}

/// DELETE /v1/players/{athlete_id}?teamId=
pub async fn delete_player(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(athlete_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TeamIdQuery>,
) -> HandlerResult<Deleted> {
    players::delete_player(state.repository.as_ref(), user.id, athlete_id, query.team_id).await?;
    Ok(Json(Deleted::ok()))
}

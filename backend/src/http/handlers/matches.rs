//! Match endpoints.

use axum::{extract::State, Json};
use uuid::Uuid;

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::matches;
use crate::http::dto::{
    CreateMatchRequest, Match, MatchDetail, MatchFilter, MatchWithTeams, UpdateMatchRequest,
};
use crate::http::extract::{AppJson, AppPath, AppQuery, AuthUser};
use crate::http::state::AppState;

/// GET /v1/matches?teamId&from&to
pub async fn list_matches(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<MatchFilter>,
) -> HandlerResult<Vec<MatchWithTeams>> {
    Ok(Json(matches::list_matches(state.repository.as_ref(), filter).await?))
}

/// POST /v1/matches
///
/// Records the match together with every athlete's performance.
pub async fn create_match(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateMatchRequest>,
) -> CreatedResult<Match> {
    created(matches::create_match(state.repository.as_ref(), user.id, request).await?)
}

/// GET /v1/matches/{match_id}
pub async fn match_detail(
    State(state): State<AppState>,
    AppPath(match_id): AppPath<Uuid>,
) -> HandlerResult<MatchDetail> {
    Ok(Json(matches::match_detail(state.repository.as_ref(), match_id).await?))
}

/// PATCH /v1/matches/{match_id}
pub async fn update_match(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(match_id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateMatchRequest>,
) -> HandlerResult<Match> {
    Ok(Json(
        matches::update_match(state.repository.as_ref(), user.id, match_id, request).await?,
    ))
}

use axum::{extract::State, Json};
use uuid::Uuid;

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::stats;
use crate::http::dto::{EvolutionPoint, MatchAthlete, PerformanceFilter, PlayerPerformance};
use crate::http::extract::{AppJson, AppPath, AppQuery, AuthUser};
use crate::http::state::AppState;

/// GET /v1/stats?athleteId&matchId&teamId
pub async fn list_stats(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<PerformanceFilter>,
) -> HandlerResult<Vec<MatchAthlete>> {
    Ok(Json(stats::list_stats(state.repository.as_ref(), filter).await?))
}

/// POST /v1/stats
pub async fn create_stat(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(row): AppJson<MatchAthlete>,
) -> CreatedResult<MatchAthlete> {
    created(stats::create_stat(state.repository.as_ref(), user.id, row).await?)
}

/// GET /v1/stats/player/{athlete_id}
pub async fn player_stats(
    State(state): State<AppState>,
    AppPath(athlete_id): AppPath<Uuid>,
) -> HandlerResult<Vec<PlayerPerformance>> {
    Ok(Json(stats::player_stats(state.repository.as_ref(), athlete_id).await?))
}

/// GET /v1/stats/player/{athlete_id}/evolution
pub async fn player_evolution(
    State(state): State<AppState>,
    AppPath(athlete_id): AppPath<Uuid>,
) -> HandlerResult<Vec<EvolutionPoint>> {
    Ok(Json(
        stats::player_evolution(state.repository.as_ref(), athlete_id).await?,
    ))
}

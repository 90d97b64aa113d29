use axum::{extract::State, Json};

use super::HandlerResult;
use crate::db::services::dashboard;
use crate::http::dto::{DashboardQuery, DashboardSummary};
use crate::http::extract::AppQuery;
use crate::http::state::AppState;

/// GET /v1/dashboard?teamId
pub async fn dashboard_summary(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DashboardQuery>,
) -> HandlerResult<DashboardSummary> {
    Ok(Json(
        dashboard::dashboard_summary(state.repository.as_ref(), query.team_id).await?,
    ))
}

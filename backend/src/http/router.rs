//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (session auth, CORS,
//! compression, tracing), and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::middleware::{log_request_timing, require_auth};
use super::state::AppState;

/// Request bodies above this size are rejected with 413.
const BODY_LIMIT: usize = 1024 * 1024;

const TRAININGS: &str = "/teams/{team_id}/trainings";
const TRAINING: &str = "/teams/{team_id}/trainings/{training_id}";
const CLASSES: &str = "/teams/{team_id}/trainings/{training_id}/classes";
const CLASS: &str = "/teams/{team_id}/trainings/{training_id}/classes/{class_id}";
const CLASS_ATHLETES: &str =
    "/teams/{team_id}/trainings/{training_id}/classes/{class_id}/athletes";
const CLASS_ATHLETE: &str =
    "/teams/{team_id}/trainings/{training_id}/classes/{class_id}/athletes/{athlete_id}";

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Routes that need a session.
fn protected_routes(state: &AppState) -> Router<AppState> {
    use handlers::{athletes, auth, dashboard, matches, players, stats, teams, trainings};

    Router::new()
        .route("/auth/me", get(auth::me))
        // Teams and their athletes
        .route("/teams", get(teams::own_teams).post(teams::create_team))
        .route("/teams/all", get(teams::all_teams))
        .route(
            "/teams/{team_id}",
            get(teams::team_detail).patch(teams::update_team),
        )
        .route(
            "/teams/{team_id}/athletes",
            get(athletes::list_team_athletes).post(athletes::create_team_athlete),
        )
        .route(
            "/teams/{team_id}/athletes/{athlete_id}/transfer",
            post(athletes::transfer_athlete),
        )
        .route(
            "/teams/{team_id}/athletes/{athlete_id}/stats",
            get(athletes::athlete_team_stats),
        )
        .route(
            "/teams/{team_id}/athletes/{athlete_id}/trainings",
            get(athletes::athlete_team_trainings),
        )
        // Trainings
        .route(
            TRAININGS,
            get(trainings::list_trainings).post(trainings::create_training),
        )
        .route(
            TRAINING,
            get(trainings::get_training)
                .patch(trainings::update_training)
                .delete(trainings::delete_training),
        )
        .route(CLASSES, post(trainings::create_class))
        .route(
            CLASS,
            get(trainings::get_class)
                .patch(trainings::update_class)
                .delete(trainings::delete_class),
        )
        .route(CLASS_ATHLETES, post(trainings::add_class_athlete))
        .route(
            CLASS_ATHLETE,
            axum::routing::patch(trainings::update_class_athlete)
                .delete(trainings::remove_class_athlete),
        )
        // Athletes
        .route("/athletes/{athlete_id}", get(athletes::athlete_detail))
        // Matches and statistics
        .route(
            "/matches",
            get(matches::list_matches).post(matches::create_match),
        )
        .route(
            "/matches/{match_id}",
            get(matches::match_detail).patch(matches::update_match),
        )
        .route("/stats", get(stats::list_stats).post(stats::create_stat))
        .route("/stats/player/{athlete_id}", get(stats::player_stats))
        .route(
            "/stats/player/{athlete_id}/evolution",
            get(stats::player_evolution),
        )
        // Players
        .route(
            "/players",
            get(players::list_players).post(players::create_player),
        )
        .route(
            "/players/{athlete_id}",
            get(players::get_player)
                .put(players::update_player)
                .delete(players::delete_player),
        )
        .route("/dashboard", get(dashboard::dashboard_summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    let public = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/sign-up", post(handlers::auth::register))
        .route("/auth/sign-in", post(handlers::auth::sign_in));

    let api_v1 = public.merge(protected_routes(&state));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request_timing))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

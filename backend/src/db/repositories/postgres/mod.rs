//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database
//! whose schema lives in the embedded `migrations/` directory.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use uuid::Uuid;

use crate::api::*;
use crate::db::ledger::{self, CareerDelta};
use crate::db::repository::{
    AthleteRepository, ErrorContext, MatchRepository, RepositoryError, RepositoryResult,
    TeamRepository, TrainingRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// Blocking: call from `spawn_blocking` when inside a runtime.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        if !applied.is_empty() {
            log::info!("Applied {} database migration(s)", applied.len());
        }
        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The closure is re-run from scratch on each attempt, so multi-step
    /// writes must live inside a single `conn.transaction`.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::debug!("Retrying after transient error: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Returns `(is_healthy, latency_ms, error_message)`.
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        let result = self.health_check().await;
        let latency = Some(start.elapsed().as_millis() as u64);
        match result {
            Ok(true) => (true, latency, None),
            Ok(false) => (false, latency, Some("Health check returned false".to_string())),
            Err(e) => (false, latency, Some(e.to_string())),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn not_found(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} not found", entity),
        ErrorContext::new(operation)
            .with_entity(entity.to_lowercase())
            .with_entity_id(id),
    )
}

fn shirt_conflict(shirt_number: i32, operation: &str) -> RepositoryError {
    RepositoryError::conflict_with_context(
        format!("Shirt number {} is already in use", shirt_number),
        ErrorContext::new(operation).with_entity("career"),
    )
}

fn open_shirt_holder(
    conn: &mut PgConnection,
    team_id: Uuid,
    shirt_number: i32,
) -> RepositoryResult<Option<CareerRow>> {
    athlete_career::table
        .filter(athlete_career::team_id.eq(team_id))
        .filter(athlete_career::shirt_number.eq(shirt_number))
        .filter(athlete_career::finished_at.is_null())
        .select(CareerRow::as_select())
        .first::<CareerRow>(conn)
        .optional()
        .map_err(map_diesel_error)
}

/// Lock the careers touched by `deltas` and compute their new counters.
///
/// Fails with `BadRequest` when a delta has no career row and with
/// `ValidationError` when a counter would leave the `integer` range.
fn settle_careers(
    conn: &mut PgConnection,
    deltas: &[CareerDelta],
    matches_delta: i32,
    operation: &str,
) -> RepositoryResult<Vec<AthleteCareer>> {
    let mut settled = Vec::with_capacity(deltas.len());
    for d in deltas {
        let career: AthleteCareer = athlete_career::table
            .find((d.athlete_id, d.team_id))
            .select(CareerRow::as_select())
            .for_update()
            .first::<CareerRow>(conn)
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| {
                RepositoryError::bad_request_with_context(
                    format!(
                        "Athlete {} has no career with team {}",
                        d.athlete_id, d.team_id
                    ),
                    ErrorContext::new(operation).with_entity("career"),
                )
            })?
            .into();
        settled.push(
            d.apply_to(&career, matches_delta)
                .map_err(|e| e.with_operation(operation))?,
        );
    }
    Ok(settled)
}

/// Write the counters computed by [`settle_careers`].
fn store_careers(conn: &mut PgConnection, careers: &[AthleteCareer]) -> RepositoryResult<()> {
    for c in careers {
        diesel::update(athlete_career::table.find((c.athlete_id, c.team_id)))
            .set((
                athlete_career::matches.eq(c.matches),
                athlete_career::goals.eq(c.goals),
                athlete_career::assists.eq(c.assists),
                athlete_career::yellow_cards.eq(c.yellow_cards),
                athlete_career::red_cards.eq(c.red_cards),
            ))
            .execute(conn)
            .map_err(map_diesel_error)?;
    }
    Ok(())
}

fn load_match_rows(conn: &mut PgConnection, match_id: Uuid) -> RepositoryResult<Vec<MatchAthlete>> {
    let rows = match_athletes::table
        .filter(match_athletes::match_id.eq(match_id))
        .order((match_athletes::team_id, match_athletes::athlete_id))
        .select(MatchAthleteRow::as_select())
        .load::<MatchAthleteRow>(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(Into::into).collect())
}

fn insert_match_rows(conn: &mut PgConnection, rows: &[MatchAthlete]) -> RepositoryResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let values: Vec<MatchAthleteRow> = rows.iter().cloned().map(Into::into).collect();
    diesel::insert_into(match_athletes::table)
        .values(&values)
        .execute(conn)
        .map_err(map_diesel_error)?;
    Ok(())
}

fn training_in_team(
    conn: &mut PgConnection,
    team_id: Uuid,
    training_id: Uuid,
) -> RepositoryResult<TrainingRow> {
    trainings::table
        .filter(trainings::id.eq(training_id))
        .filter(trainings::team_id.eq(team_id))
        .select(TrainingRow::as_select())
        .first::<TrainingRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Training not found or does not belong to the team",
                ErrorContext::new("get_training")
                    .with_entity("training")
                    .with_entity_id(training_id),
            )
        })
}

fn class_in_training(
    conn: &mut PgConnection,
    training_id: Uuid,
    class_id: Uuid,
) -> RepositoryResult<TrainingClassRow> {
    training_classes::table
        .filter(training_classes::id.eq(class_id))
        .filter(training_classes::training_id.eq(training_id))
        .select(TrainingClassRow::as_select())
        .first::<TrainingClassRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Training class not found or does not belong to the training",
                ErrorContext::new("get_class")
                    .with_entity("training_class")
                    .with_entity_id(class_id),
            )
        })
}

// =============================================================================
// Users & teams
// =============================================================================

#[async_trait]
impl TeamRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result::<UserRow>(conn)
                .map(Into::into)
                .map_err(|e| match map_diesel_error(e) {
                    RepositoryError::Conflict { context, .. } => RepositoryError::Conflict {
                        message: "Email already registered".to_string(),
                        context,
                    },
                    other => other,
                })
        })
        .await
    }

    async fn get_user(&self, id: Uuid) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            users::table
                .find(id)
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Into::into)
                .ok_or_else(|| not_found("User", id, "get_user"))
        })
        .await
    }

    async fn get_users(&self, ids: &[Uuid]) -> RepositoryResult<Vec<User>> {
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let rows = users::table
                .filter(users::id.eq_any(&ids))
                .select(UserRow::as_select())
                .load::<UserRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            users::table
                .filter(users::email.eq(&email))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map(|row| row.map(Into::into))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_team(&self, owner_id: Uuid, team: NewTeam) -> RepositoryResult<Team> {
        let row = TeamRow {
            id: Uuid::new_v4(),
            full_name: team.full_name,
            short_name: team.short_name,
            icon_url: team.icon_url,
            main_color_hex: team.main_color_hex,
            secondary_color_hex: team.secondary_color_hex,
            created_by: owner_id,
            created_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(teams::table)
                .values(&row)
                .returning(TeamRow::as_returning())
                .get_result::<TeamRow>(conn)
                .map(Into::into)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_team(&self, id: Uuid) -> RepositoryResult<Team> {
        self.with_conn(move |conn| {
            teams::table
                .find(id)
                .select(TeamRow::as_select())
                .first::<TeamRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Into::into)
                .ok_or_else(|| not_found("Team", id, "get_team"))
        })
        .await
    }

    async fn get_teams(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Team>> {
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let rows = teams::table
                .filter(teams::id.eq_any(&ids))
                .select(TeamRow::as_select())
                .load::<TeamRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn list_teams(&self) -> RepositoryResult<Vec<Team>> {
        self.with_conn(|conn| {
            let rows = teams::table
                .order(teams::full_name.asc())
                .select(TeamRow::as_select())
                .load::<TeamRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn list_teams_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Team>> {
        self.with_conn(move |conn| {
            let rows = teams::table
                .filter(teams::created_by.eq(owner_id))
                .order(teams::full_name.asc())
                .select(TeamRow::as_select())
                .load::<TeamRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn update_team(&self, id: Uuid, patch: TeamPatch) -> RepositoryResult<Team> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut team: Team = teams::table
                    .find(id)
                    .select(TeamRow::as_select())
                    .for_update()
                    .first::<TeamRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| not_found("Team", id, "update_team"))?
                    .into();
                patch.apply_to(&mut team);

                diesel::update(teams::table.find(id))
                    .set(&TeamRow::from(team))
                    .returning(TeamRow::as_returning())
                    .get_result::<TeamRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn owned_team_ids(
        &self,
        owner_id: Uuid,
        team_ids: &[Uuid],
    ) -> RepositoryResult<Vec<Uuid>> {
        let ids = team_ids.to_vec();
        self.with_conn(move |conn| {
            teams::table
                .filter(teams::id.eq_any(&ids))
                .filter(teams::created_by.eq(owner_id))
                .select(teams::id)
                .load::<Uuid>(conn)
                .map_err(map_diesel_error)
        })
        .await
    }
}

// =============================================================================
// Athletes & careers
// =============================================================================

#[async_trait]
impl AthleteRepository for PostgresRepository {
    async fn create_athlete_with_career(
        &self,
        athlete: NewAthlete,
        career: NewCareer,
        started_at: NaiveDate,
    ) -> RepositoryResult<(Athlete, AthleteCareer)> {
        let athlete_row = AthleteRow {
            id: Uuid::new_v4(),
            name: athlete.name,
            birthdate: athlete.birthdate,
            created_at: Utc::now(),
        };
        let career_row: CareerRow = AthleteCareer::open(
            athlete_row.id,
            career.team_id,
            career.shirt_number,
            career.position,
            started_at,
        )
        .into();

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if open_shirt_holder(tx, career_row.team_id, career_row.shirt_number)?.is_some() {
                    return Err(shirt_conflict(
                        career_row.shirt_number,
                        "create_athlete_with_career",
                    ));
                }

                let athlete: AthleteRow = diesel::insert_into(athletes::table)
                    .values(&athlete_row)
                    .returning(AthleteRow::as_returning())
                    .get_result::<AthleteRow>(tx)
                    .map_err(map_diesel_error)?;
                let career: CareerRow = diesel::insert_into(athlete_career::table)
                    .values(&career_row)
                    .returning(CareerRow::as_returning())
                    .get_result::<CareerRow>(tx)
                    .map_err(map_diesel_error)?;

                Ok((athlete.into(), career.into()))
            })
        })
        .await
    }

    async fn get_athlete(&self, id: Uuid) -> RepositoryResult<Athlete> {
        self.with_conn(move |conn| {
            athletes::table
                .find(id)
                .select(AthleteRow::as_select())
                .first::<AthleteRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Into::into)
                .ok_or_else(|| not_found("Athlete", id, "get_athlete"))
        })
        .await
    }

    async fn get_athletes(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Athlete>> {
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let rows = athletes::table
                .filter(athletes::id.eq_any(&ids))
                .select(AthleteRow::as_select())
                .load::<AthleteRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn list_athletes(&self) -> RepositoryResult<Vec<Athlete>> {
        self.with_conn(|conn| {
            let rows = athletes::table
                .order(athletes::name.asc())
                .select(AthleteRow::as_select())
                .load::<AthleteRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn get_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
    ) -> RepositoryResult<Option<AthleteCareer>> {
        self.with_conn(move |conn| {
            athlete_career::table
                .find((athlete_id, team_id))
                .select(CareerRow::as_select())
                .first::<CareerRow>(conn)
                .optional()
                .map(|row| row.map(Into::into))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn find_open_career_by_shirt(
        &self,
        team_id: Uuid,
        shirt_number: i32,
    ) -> RepositoryResult<Option<AthleteCareer>> {
        self.with_conn(move |conn| {
            Ok(open_shirt_holder(conn, team_id, shirt_number)?.map(Into::into))
        })
        .await
    }

    async fn list_team_careers(
        &self,
        team_id: Uuid,
    ) -> RepositoryResult<Vec<(Athlete, AthleteCareer)>> {
        self.with_conn(move |conn| {
            let rows = athlete_career::table
                .inner_join(athletes::table)
                .filter(athlete_career::team_id.eq(team_id))
                .order(athletes::name.asc())
                .select((AthleteRow::as_select(), CareerRow::as_select()))
                .load::<(AthleteRow, CareerRow)>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect())
        })
        .await
    }

    async fn list_athlete_careers(
        &self,
        athlete_id: Uuid,
    ) -> RepositoryResult<Vec<AthleteCareer>> {
        self.with_conn(move |conn| {
            let rows = athlete_career::table
                .filter(athlete_career::athlete_id.eq(athlete_id))
                .order(athlete_career::started_at.desc())
                .select(CareerRow::as_select())
                .load::<CareerRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn list_careers(&self) -> RepositoryResult<Vec<(Athlete, AthleteCareer)>> {
        self.with_conn(|conn| {
            let rows = athlete_career::table
                .inner_join(athletes::table)
                .order(athletes::name.asc())
                .select((AthleteRow::as_select(), CareerRow::as_select()))
                .load::<(AthleteRow, CareerRow)>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect())
        })
        .await
    }

    async fn update_athlete_with_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
        athlete: AthletePatch,
        career: CareerPatch,
    ) -> RepositoryResult<(Athlete, AthleteCareer)> {
        const OPERATION: &str = "update_athlete_with_career";
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut current_career: AthleteCareer = athlete_career::table
                    .find((athlete_id, team_id))
                    .select(CareerRow::as_select())
                    .for_update()
                    .first::<CareerRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| not_found("Career", athlete_id, OPERATION))?
                    .into();
                let mut current_athlete: Athlete = athletes::table
                    .find(athlete_id)
                    .select(AthleteRow::as_select())
                    .for_update()
                    .first::<AthleteRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| not_found("Athlete", athlete_id, OPERATION))?
                    .into();

                if let Some(shirt) = career.shirt_number {
                    if current_career.is_open() {
                        let holder = open_shirt_holder(tx, team_id, shirt)?;
                        if holder.is_some_and(|h| h.athlete_id != athlete_id) {
                            return Err(shirt_conflict(shirt, OPERATION));
                        }
                    }
                    current_career.shirt_number = shirt;
                }
                if let Some(position) = career.position.clone() {
                    current_career.position = position;
                }
                if let Some(name) = athlete.name.clone() {
                    current_athlete.name = name;
                }
                if let Some(birthdate) = athlete.birthdate {
                    current_athlete.birthdate = birthdate;
                }

                let stored_career: AthleteCareer =
                    diesel::update(athlete_career::table.find((athlete_id, team_id)))
                        .set(&CareerRow::from(current_career))
                        .returning(CareerRow::as_returning())
                        .get_result::<CareerRow>(tx)
                        .map_err(map_diesel_error)?
                        .into();
                let stored_athlete: Athlete = diesel::update(athletes::table.find(athlete_id))
                    .set(&AthleteRow::from(current_athlete))
                    .returning(AthleteRow::as_returning())
                    .get_result::<AthleteRow>(tx)
                    .map_err(map_diesel_error)?
                    .into();
                Ok((stored_athlete, stored_career))
            })
        })
        .await
    }

    async fn delete_career(&self, athlete_id: Uuid, team_id: Uuid) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let deleted =
                    diesel::delete(athlete_career::table.find((athlete_id, team_id)))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                if deleted == 0 {
                    return Err(not_found("Career", athlete_id, "delete_career"));
                }

                let remaining: i64 = athlete_career::table
                    .filter(athlete_career::athlete_id.eq(athlete_id))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if remaining > 0 {
                    let team_trainings = trainings::table
                        .filter(trainings::team_id.eq(team_id))
                        .select(trainings::id);
                    let team_classes: Vec<Uuid> = training_classes::table
                        .filter(training_classes::training_id.eq_any(team_trainings))
                        .select(training_classes::id)
                        .load(tx)
                        .map_err(map_diesel_error)?;
                    diesel::delete(
                        match_athletes::table
                            .filter(match_athletes::athlete_id.eq(athlete_id))
                            .filter(match_athletes::team_id.eq(team_id)),
                    )
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                    diesel::delete(
                        athlete_training_class_stats::table
                            .filter(athlete_training_class_stats::athlete_id.eq(athlete_id))
                            .filter(
                                athlete_training_class_stats::training_class_id
                                    .eq_any(&team_classes),
                            ),
                    )
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                    return Ok(false);
                }

                // Performance and attendance rows cascade.
                diesel::delete(athletes::table.find(athlete_id))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(true)
            })
        })
        .await
    }

    async fn transfer_athlete(&self, request: TransferRequest) -> RepositoryResult<AthleteCareer> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let ctx = || {
                    ErrorContext::new("transfer_athlete")
                        .with_entity("career")
                        .with_entity_id(request.athlete_id)
                };

                let source = athlete_career::table
                    .find((request.athlete_id, request.source_team_id))
                    .select(CareerRow::as_select())
                    .for_update()
                    .first::<CareerRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;
                if !source.is_some_and(|c| c.finished_at.is_none()) {
                    return Err(RepositoryError::not_found_with_context(
                        "Athlete has no active career at the source team",
                        ctx(),
                    ));
                }

                let target_exists: i64 = athlete_career::table
                    .filter(athlete_career::athlete_id.eq(request.athlete_id))
                    .filter(athlete_career::team_id.eq(request.target_team_id))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if target_exists > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        "Athlete already has a career at the target team",
                        ctx(),
                    ));
                }

                if open_shirt_holder(tx, request.target_team_id, request.shirt_number)?.is_some() {
                    return Err(RepositoryError::conflict_with_context(
                        format!(
                            "Shirt number {} is already in use at the target team",
                            request.shirt_number
                        ),
                        ctx(),
                    ));
                }

                diesel::update(
                    athlete_career::table.find((request.athlete_id, request.source_team_id)),
                )
                .set(athlete_career::finished_at.eq(Some(request.finished_at)))
                .execute(tx)
                .map_err(map_diesel_error)?;

                let target: CareerRow = AthleteCareer::open(
                    request.athlete_id,
                    request.target_team_id,
                    request.shirt_number,
                    request.position.clone(),
                    request.finished_at,
                )
                .into();
                diesel::insert_into(athlete_career::table)
                    .values(&target)
                    .returning(CareerRow::as_returning())
                    .get_result::<CareerRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }
}

// =============================================================================
// Matches
// =============================================================================

#[async_trait]
impl MatchRepository for PostgresRepository {
    async fn create_match(
        &self,
        new_match: NewMatch,
        performances: Vec<PerformanceEntry>,
    ) -> RepositoryResult<Match> {
        let row = MatchRow {
            id: Uuid::new_v4(),
            home_team_id: new_match.home_team_id,
            away_team_id: new_match.away_team_id,
            played_at: new_match.timestamp,
            home_score: new_match.home_score,
            away_score: new_match.away_score,
            created_at: Utc::now(),
        };
        let rows: Vec<MatchAthlete> = ledger::merge_performances(&performances)?
            .iter()
            .map(|p| MatchAthlete::from_entry(row.id, p))
            .collect();
        let deltas = ledger::career_deltas(&rows)?;

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                for team_id in [row.home_team_id, row.away_team_id] {
                    let exists: i64 = teams::table
                        .filter(teams::id.eq(team_id))
                        .count()
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                    if exists == 0 {
                        return Err(not_found("Team", team_id, "create_match"));
                    }
                }

                let careers = settle_careers(tx, &deltas, 1, "create_match")?;

                let inserted: MatchRow = diesel::insert_into(matches::table)
                    .values(&row)
                    .returning(MatchRow::as_returning())
                    .get_result::<MatchRow>(tx)
                    .map_err(map_diesel_error)?;
                insert_match_rows(tx, &rows)?;
                store_careers(tx, &careers)?;
                Ok(inserted.into())
            })
        })
        .await
    }

    async fn update_match(
        &self,
        id: Uuid,
        patch: MatchPatch,
        performances: Option<Vec<PerformanceEntry>>,
    ) -> RepositoryResult<Match> {
        let new_rows: Option<Vec<MatchAthlete>> = match performances {
            Some(entries) => Some(
                ledger::merge_performances(&entries)?
                    .iter()
                    .map(|p| MatchAthlete::from_entry(id, p))
                    .collect(),
            ),
            None => None,
        };

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut current: Match = matches::table
                    .find(id)
                    .select(MatchRow::as_select())
                    .for_update()
                    .first::<MatchRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| not_found("Match", id, "update_match"))?
                    .into();

                if let Some(new_rows) = &new_rows {
                    let old_rows = load_match_rows(tx, id)?;
                    let careers = settle_careers(
                        tx,
                        &ledger::replacement_deltas(&old_rows, new_rows)?,
                        0,
                        "update_match",
                    )?;
                    diesel::delete(match_athletes::table.filter(match_athletes::match_id.eq(id)))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                    insert_match_rows(tx, new_rows)?;
                    store_careers(tx, &careers)?;
                }

                if patch.is_empty() {
                    return Ok(current);
                }
                patch.apply_to(&mut current);
                diesel::update(matches::table.find(id))
                    .set(&MatchRow::from(current))
                    .returning(MatchRow::as_returning())
                    .get_result::<MatchRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn get_match(&self, id: Uuid) -> RepositoryResult<Match> {
        self.with_conn(move |conn| {
            matches::table
                .find(id)
                .select(MatchRow::as_select())
                .first::<MatchRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Into::into)
                .ok_or_else(|| not_found("Match", id, "get_match"))
        })
        .await
    }

    async fn get_matches(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Match>> {
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let rows = matches::table
                .filter(matches::id.eq_any(&ids))
                .select(MatchRow::as_select())
                .load::<MatchRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn list_matches(&self, filter: MatchFilter) -> RepositoryResult<Vec<Match>> {
        self.with_conn(move |conn| {
            let mut query = matches::table.into_boxed();
            if let Some(team) = filter.team_id {
                query = query.filter(
                    matches::home_team_id
                        .eq(team)
                        .or(matches::away_team_id.eq(team)),
                );
            }
            if let Some(from) = filter.from {
                query = query.filter(matches::played_at.ge(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(matches::played_at.le(to));
            }
            let rows = query
                .order(matches::played_at.desc())
                .select(MatchRow::as_select())
                .load::<MatchRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn list_match_athletes(&self, match_id: Uuid) -> RepositoryResult<Vec<MatchAthlete>> {
        self.with_conn(move |conn| load_match_rows(conn, match_id))
            .await
    }

    async fn create_match_athlete(&self, row: MatchAthlete) -> RepositoryResult<MatchAthlete> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let match_exists: i64 = matches::table
                    .filter(matches::id.eq(row.match_id))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if match_exists == 0 {
                    return Err(not_found("Match", row.match_id, "create_match_athlete"));
                }
                let careers = settle_careers(
                    tx,
                    &ledger::career_deltas(std::slice::from_ref(&row))?,
                    1,
                    "create_match_athlete",
                )?;

                let inserted: MatchAthleteRow = diesel::insert_into(match_athletes::table)
                    .values(&MatchAthleteRow::from(row.clone()))
                    .returning(MatchAthleteRow::as_returning())
                    .get_result::<MatchAthleteRow>(tx)
                    .map_err(|e| match map_diesel_error(e) {
                        RepositoryError::Conflict { context, .. } => RepositoryError::Conflict {
                            message: "Performance already recorded for this athlete in this match"
                                .to_string(),
                            context,
                        },
                        other => other,
                    })?;

                store_careers(tx, &careers)?;
                Ok(inserted.into())
            })
        })
        .await
    }

    async fn list_performances(
        &self,
        filter: PerformanceFilter,
    ) -> RepositoryResult<Vec<MatchAthlete>> {
        self.with_conn(move |conn| {
            let mut query = match_athletes::table.into_boxed();
            if let Some(id) = filter.athlete_id {
                query = query.filter(match_athletes::athlete_id.eq(id));
            }
            if let Some(id) = filter.match_id {
                query = query.filter(match_athletes::match_id.eq(id));
            }
            if let Some(id) = filter.team_id {
                query = query.filter(match_athletes::team_id.eq(id));
            }
            let rows = query
                .order((
                    match_athletes::match_id,
                    match_athletes::team_id,
                    match_athletes::athlete_id,
                ))
                .select(MatchAthleteRow::as_select())
                .load::<MatchAthleteRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }
}

// =============================================================================
// Trainings
// =============================================================================

#[async_trait]
impl TrainingRepository for PostgresRepository {
    async fn create_training(&self, team_id: Uuid, date: NaiveDate) -> RepositoryResult<Training> {
        let row = TrainingRow {
            id: Uuid::new_v4(),
            team_id,
            training_date: date,
            concluded: false,
            concluded_at: None,
            created_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(trainings::table)
                .values(&row)
                .returning(TrainingRow::as_returning())
                .get_result::<TrainingRow>(conn)
                .map(Into::into)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_training(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<Training> {
        self.with_conn(move |conn| Ok(training_in_team(conn, team_id, training_id)?.into()))
            .await
    }

    async fn list_trainings(
        &self,
        team_id: Uuid,
        filter: TrainingFilter,
    ) -> RepositoryResult<Vec<Training>> {
        self.with_conn(move |conn| {
            let mut query = trainings::table
                .filter(trainings::team_id.eq(team_id))
                .into_boxed();
            if let Some(from) = filter.from {
                query = query.filter(trainings::training_date.ge(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(trainings::training_date.le(to));
            }
            if let Some(concluded) = filter.concluded {
                query = query.filter(trainings::concluded.eq(concluded));
            }
            let rows = query
                .order((trainings::training_date.desc(), trainings::created_at.desc()))
                .select(TrainingRow::as_select())
                .load::<TrainingRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn update_training(
        &self,
        team_id: Uuid,
        training_id: Uuid,
        patch: TrainingPatch,
    ) -> RepositoryResult<Training> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut training: Training = training_in_team(tx, team_id, training_id)?.into();
                patch.apply_to(&mut training, Utc::now());
                diesel::update(trainings::table.find(training_id))
                    .set(&TrainingRow::from(training))
                    .returning(TrainingRow::as_returning())
                    .get_result::<TrainingRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn delete_training(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                training_in_team(tx, team_id, training_id)?;
                diesel::delete(trainings::table.find(training_id))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }

    async fn create_class(
        &self,
        training_id: Uuid,
        class: NewTrainingClass,
    ) -> RepositoryResult<TrainingClass> {
        let row = TrainingClassRow {
            id: Uuid::new_v4(),
            training_id,
            title: class.title,
            description: class.description,
            notes: class.notes,
            concluded: false,
            created_at: Utc::now(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(training_classes::table)
                .values(&row)
                .returning(TrainingClassRow::as_returning())
                .get_result::<TrainingClassRow>(conn)
                .map(Into::into)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_class(
        &self,
        training_id: Uuid,
        class_id: Uuid,
    ) -> RepositoryResult<TrainingClass> {
        self.with_conn(move |conn| Ok(class_in_training(conn, training_id, class_id)?.into()))
            .await
    }

    async fn list_classes(&self, training_ids: &[Uuid]) -> RepositoryResult<Vec<TrainingClass>> {
        let ids = training_ids.to_vec();
        self.with_conn(move |conn| {
            let rows = training_classes::table
                .filter(training_classes::training_id.eq_any(&ids))
                .order(training_classes::created_at.asc())
                .select(TrainingClassRow::as_select())
                .load::<TrainingClassRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn update_class(
        &self,
        training_id: Uuid,
        class_id: Uuid,
        patch: TrainingClassPatch,
    ) -> RepositoryResult<TrainingClass> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut class: TrainingClass = class_in_training(tx, training_id, class_id)?.into();
                patch.apply_to(&mut class);
                diesel::update(training_classes::table.find(class_id))
                    .set(&TrainingClassRow::from(class))
                    .returning(TrainingClassRow::as_returning())
                    .get_result::<TrainingClassRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn delete_class(&self, training_id: Uuid, class_id: Uuid) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                class_in_training(tx, training_id, class_id)?;
                diesel::delete(training_classes::table.find(class_id))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }

    async fn add_class_athlete(&self, row: ClassAthlete) -> RepositoryResult<ClassAthlete> {
        self.with_conn(move |conn| {
            diesel::insert_into(athlete_training_class_stats::table)
                .values(&ClassAthleteRow::from(row.clone()))
                .returning(ClassAthleteRow::as_returning())
                .get_result::<ClassAthleteRow>(conn)
                .map(Into::into)
                .map_err(|e| match map_diesel_error(e) {
                    RepositoryError::Conflict { context, .. } => RepositoryError::Conflict {
                        message: "Athlete already added to this training class".to_string(),
                        context,
                    },
                    other => other,
                })
        })
        .await
    }

    async fn list_class_athletes(
        &self,
        class_ids: &[Uuid],
    ) -> RepositoryResult<Vec<ClassAthlete>> {
        let ids = class_ids.to_vec();
        self.with_conn(move |conn| {
            let rows = athlete_training_class_stats::table
                .filter(athlete_training_class_stats::training_class_id.eq_any(&ids))
                .order((
                    athlete_training_class_stats::training_class_id,
                    athlete_training_class_stats::athlete_id,
                ))
                .select(ClassAthleteRow::as_select())
                .load::<ClassAthleteRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn update_class_athlete(
        &self,
        class_id: Uuid,
        athlete_id: Uuid,
        patch: ClassAthletePatch,
    ) -> RepositoryResult<ClassAthlete> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut row: ClassAthlete = athlete_training_class_stats::table
                    .find((class_id, athlete_id))
                    .select(ClassAthleteRow::as_select())
                    .for_update()
                    .first::<ClassAthleteRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| {
                        not_found("Athlete training stats", athlete_id, "update_class_athlete")
                    })?
                    .into();
                patch.apply_to(&mut row);
                diesel::update(athlete_training_class_stats::table.find((class_id, athlete_id)))
                    .set(&ClassAthleteRow::from(row))
                    .returning(ClassAthleteRow::as_returning())
                    .get_result::<ClassAthleteRow>(tx)
                    .map(Into::into)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn remove_class_athlete(
        &self,
        class_id: Uuid,
        athlete_id: Uuid,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(athlete_training_class_stats::table.find((class_id, athlete_id)))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(not_found(
                    "Athlete training stats",
                    athlete_id,
                    "remove_class_athlete",
                ));
            }
            Ok(())
        })
        .await
    }
}

//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory using HashMap structures, providing fast, deterministic, and
//! isolated execution.
//!
//! Every mutating method takes the write lock once, validates everything it
//! needs, and only then mutates. That makes each call all-or-nothing, which
//! is what the transactional methods of the repository traits require.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::*;
use crate::db::ledger;
use crate::db::repository::*;

/// In-memory local repository.
///
/// # Example
/// ```
/// use squad_backend::db::repositories::LocalRepository;
/// use squad_backend::db::repository::TeamRepository;
///
/// # tokio_test_block();
/// # fn tokio_test_block() {
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     assert!(repo.health_check().await.unwrap());
/// });
/// # }
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

type CareerKey = (Uuid, Uuid);
type PerformanceKey = (Uuid, Uuid, Uuid);
type AttendanceKey = (Uuid, Uuid);

struct LocalData {
    users: HashMap<Uuid, User>,
    teams: HashMap<Uuid, Team>,
    athletes: HashMap<Uuid, Athlete>,
    /// Keyed by (athlete_id, team_id)
    careers: HashMap<CareerKey, AthleteCareer>,
    matches: HashMap<Uuid, Match>,
    /// Keyed by (athlete_id, match_id, team_id)
    match_athletes: HashMap<PerformanceKey, MatchAthlete>,
    trainings: HashMap<Uuid, Training>,
    classes: HashMap<Uuid, TrainingClass>,
    /// Keyed by (training_class_id, athlete_id)
    class_athletes: HashMap<AttendanceKey, ClassAthlete>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            teams: HashMap::new(),
            athletes: HashMap::new(),
            careers: HashMap::new(),
            matches: HashMap::new(),
            match_athletes: HashMap::new(),
            trainings: HashMap::new(),
            classes: HashMap::new(),
            class_athletes: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn shirt_taken(&self, team_id: Uuid, shirt_number: i32, except: Option<Uuid>) -> bool {
        self.careers.values().any(|c| {
            c.team_id == team_id
                && c.is_open()
                && c.shirt_number == shirt_number
                && Some(c.athlete_id) != except
        })
    }

    fn match_rows(&self, match_id: Uuid) -> Vec<MatchAthlete> {
        let mut rows: Vec<MatchAthlete> = self
            .match_athletes
            .values()
            .filter(|r| r.match_id == match_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.team_id, r.athlete_id));
        rows
    }

    /// Careers as they will be after `deltas`, computed without mutating.
    ///
    /// Fails with `BadRequest` when a delta has no career and with
    /// `ValidationError` when a counter would leave the `i32` range.
    fn settle_careers(
        &self,
        deltas: &[ledger::CareerDelta],
        matches_delta: i32,
        operation: &str,
    ) -> RepositoryResult<Vec<AthleteCareer>> {
        deltas
            .iter()
            .map(|delta| {
                let career = self.careers.get(&delta.key()).ok_or_else(|| {
                    RepositoryError::bad_request_with_context(
                        format!(
                            "Athlete {} has no career with team {}",
                            delta.athlete_id, delta.team_id
                        ),
                        ErrorContext::new(operation).with_entity("career"),
                    )
                })?;
                delta
                    .apply_to(career, matches_delta)
                    .map_err(|e| e.with_operation(operation))
            })
            .collect()
    }

    fn store_careers(&mut self, careers: Vec<AthleteCareer>) {
        for career in careers {
            self.careers
                .insert((career.athlete_id, career.team_id), career);
        }
    }

    fn training_in_team(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<&Training> {
        self.trainings
            .get(&training_id)
            .filter(|t| t.team_id == team_id)
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
        &self,
        training_id: Uuid,
        class_id: Uuid,
    ) -> RepositoryResult<&TrainingClass> {
        self.classes
            .get(&class_id)
            .filter(|c| c.training_id == training_id)
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Training class not found or does not belong to the training",
                    ErrorContext::new("get_class")
                        .with_entity("training_class")
                        .with_entity_id(class_id),
                )
            })
    }

    fn remove_class_cascade(&mut self, class_id: Uuid) {
        self.classes.remove(&class_id);
        self.class_athletes.retain(|(cid, _), _| *cid != class_id);
    }
}

fn sort_teams(teams: &mut [Team]) {
    teams.sort_by(|a, b| a.full_name.cmp(&b.full_name));
}

fn not_found(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} not found", entity),
        ErrorContext::new(operation)
            .with_entity(entity.to_lowercase())
            .with_entity_id(id),
    )
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Number of stored matches.
    pub fn match_count(&self) -> usize {
        self.data.read().matches.len()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Local repository marked unhealthy"))
        }
    }
}

// =============================================================================
// Users & teams
// =============================================================================

#[async_trait]
impl TeamRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::conflict_with_context(
                "Email already registered",
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        data.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: Uuid) -> RepositoryResult<User> {
        self.check_health()?;
        self.data
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("User", id, "get_user"))
    }

    async fn get_users(&self, ids: &[Uuid]) -> RepositoryResult<Vec<User>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(ids.iter().filter_map(|id| data.users.get(id).cloned()).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_team(&self, owner_id: Uuid, team: NewTeam) -> RepositoryResult<Team> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.users.contains_key(&owner_id) {
            return Err(RepositoryError::validation_with_context(
                "Team owner does not exist",
                ErrorContext::new("create_team").with_entity_id(owner_id),
            ));
        }
        let record = Team {
            id: Uuid::new_v4(),
            full_name: team.full_name,
            short_name: team.short_name,
            icon_url: team.icon_url,
            main_color_hex: team.main_color_hex,
            secondary_color_hex: team.secondary_color_hex,
            created_by: owner_id,
            created_at: Utc::now(),
        };
        data.teams.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_team(&self, id: Uuid) -> RepositoryResult<Team> {
        self.check_health()?;
        self.data
            .read()
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Team", id, "get_team"))
    }

    async fn get_teams(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Team>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(ids.iter().filter_map(|id| data.teams.get(id).cloned()).collect())
    }

    async fn list_teams(&self) -> RepositoryResult<Vec<Team>> {
        self.check_health()?;
        let mut teams: Vec<Team> = self.data.read().teams.values().cloned().collect();
        sort_teams(&mut teams);
        Ok(teams)
    }

    async fn list_teams_by_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Team>> {
        self.check_health()?;
        let mut teams: Vec<Team> = self
            .data
            .read()
            .teams
            .values()
            .filter(|t| t.created_by == owner_id)
            .cloned()
            .collect();
        sort_teams(&mut teams);
        Ok(teams)
    }

    async fn update_team(&self, id: Uuid, patch: TeamPatch) -> RepositoryResult<Team> {
        self.check_health()?;
        let mut data = self.data.write();
        let team = data
            .teams
            .get_mut(&id)
            .ok_or_else(|| not_found("Team", id, "update_team"))?;
        patch.apply_to(team);
        Ok(team.clone())
    }

    async fn owned_team_ids(
        &self,
        owner_id: Uuid,
        team_ids: &[Uuid],
    ) -> RepositoryResult<Vec<Uuid>> {
        self.check_health()?;
        let data = self.data.read();
        let mut owned: Vec<Uuid> = team_ids
            .iter()
            .filter(|id| data.teams.get(id).is_some_and(|t| t.created_by == owner_id))
            .copied()
            .collect();
        owned.dedup();
        Ok(owned)
    }
}

// =============================================================================
// Athletes & careers
// =============================================================================

#[async_trait]
impl AthleteRepository for LocalRepository {
    async fn create_athlete_with_career(
        &self,
        athlete: NewAthlete,
        career: NewCareer,
        started_at: NaiveDate,
    ) -> RepositoryResult<(Athlete, AthleteCareer)> {
        self.check_health()?;
        let mut data = self.data.write();

        if !data.teams.contains_key(&career.team_id) {
            return Err(not_found("Team", career.team_id, "create_athlete_with_career"));
        }
        if data.shirt_taken(career.team_id, career.shirt_number, None) {
            return Err(RepositoryError::conflict_with_context(
                format!("Shirt number {} is already in use", career.shirt_number),
                ErrorContext::new("create_athlete_with_career")
                    .with_entity("career")
                    .with_entity_id(career.team_id),
            ));
        }

        let athlete = Athlete {
            id: Uuid::new_v4(),
            name: athlete.name,
            birthdate: athlete.birthdate,
            created_at: Utc::now(),
        };
        let career = AthleteCareer::open(
            athlete.id,
            career.team_id,
            career.shirt_number,
            career.position,
            started_at,
        );

        data.athletes.insert(athlete.id, athlete.clone());
        data.careers
            .insert((career.athlete_id, career.team_id), career.clone());
        Ok((athlete, career))
    }

    async fn get_athlete(&self, id: Uuid) -> RepositoryResult<Athlete> {
        self.check_health()?;
        self.data
            .read()
            .athletes
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Athlete", id, "get_athlete"))
    }

    async fn get_athletes(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Athlete>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.athletes.get(id).cloned())
            .collect())
    }

    async fn list_athletes(&self) -> RepositoryResult<Vec<Athlete>> {
        self.check_health()?;
        let mut athletes: Vec<Athlete> = self.data.read().athletes.values().cloned().collect();
        athletes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(athletes)
    }

    async fn get_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
    ) -> RepositoryResult<Option<AthleteCareer>> {
        self.check_health()?;
        Ok(self.data.read().careers.get(&(athlete_id, team_id)).cloned())
    }

    async fn find_open_career_by_shirt(
        &self,
        team_id: Uuid,
        shirt_number: i32,
    ) -> RepositoryResult<Option<AthleteCareer>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .careers
            .values()
            .find(|c| c.team_id == team_id && c.is_open() && c.shirt_number == shirt_number)
            .cloned())
    }

    async fn list_team_careers(
        &self,
        team_id: Uuid,
    ) -> RepositoryResult<Vec<(Athlete, AthleteCareer)>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<(Athlete, AthleteCareer)> = data
            .careers
            .values()
            .filter(|c| c.team_id == team_id)
            .filter_map(|c| data.athletes.get(&c.athlete_id).map(|a| (a.clone(), c.clone())))
            .collect();
        rows.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_athlete_careers(
        &self,
        athlete_id: Uuid,
    ) -> RepositoryResult<Vec<AthleteCareer>> {
        self.check_health()?;
        let mut careers: Vec<AthleteCareer> = self
            .data
            .read()
            .careers
            .values()
            .filter(|c| c.athlete_id == athlete_id)
            .cloned()
            .collect();
        careers.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(careers)
    }

    async fn list_careers(&self) -> RepositoryResult<Vec<(Athlete, AthleteCareer)>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<(Athlete, AthleteCareer)> = data
            .careers
            .values()
            .filter_map(|c| data.athletes.get(&c.athlete_id).map(|a| (a.clone(), c.clone())))
            .collect();
        rows.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn update_athlete_with_career(
        &self,
        athlete_id: Uuid,
        team_id: Uuid,
        athlete: AthletePatch,
        career: CareerPatch,
    ) -> RepositoryResult<(Athlete, AthleteCareer)> {
        self.check_health()?;
        let mut data = self.data.write();
        let operation = "update_athlete_with_career";
        let is_open = data
            .careers
            .get(&(athlete_id, team_id))
            .ok_or_else(|| not_found("Career", athlete_id, operation))?
            .is_open();
        if !data.athletes.contains_key(&athlete_id) {
            return Err(not_found("Athlete", athlete_id, operation));
        }
        if let Some(shirt) = career.shirt_number {
            if is_open && data.shirt_taken(team_id, shirt, Some(athlete_id)) {
                return Err(RepositoryError::conflict_with_context(
                    format!("Shirt number {} is already in use", shirt),
                    ErrorContext::new(operation).with_entity("career"),
                ));
            }
        }

        let updated_career = {
            let record = data
                .careers
                .get_mut(&(athlete_id, team_id))
                .ok_or_else(|| not_found("Career", athlete_id, operation))?;
            if let Some(shirt) = career.shirt_number {
                record.shirt_number = shirt;
            }
            if let Some(position) = career.position {
                record.position = position;
            }
            record.clone()
        };
        let record = data
            .athletes
            .get_mut(&athlete_id)
            .ok_or_else(|| not_found("Athlete", athlete_id, operation))?;
        if let Some(name) = athlete.name {
            record.name = name;
        }
        if let Some(birthdate) = athlete.birthdate {
            record.birthdate = birthdate;
        }
        Ok((record.clone(), updated_career))
    }

    async fn delete_career(&self, athlete_id: Uuid, team_id: Uuid) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.careers.remove(&(athlete_id, team_id)).is_none() {
            return Err(not_found("Career", athlete_id, "delete_career"));
        }

        let has_other = data.careers.keys().any(|(a, _)| *a == athlete_id);
        if has_other {
            let team_classes: Vec<Uuid> = data
                .classes
                .values()
                .filter(|c| {
                    data.trainings
                        .get(&c.training_id)
                        .is_some_and(|t| t.team_id == team_id)
                })
                .map(|c| c.id)
                .collect();
            data.match_athletes
                .retain(|(a, _, t), _| !(*a == athlete_id && *t == team_id));
            data.class_athletes
                .retain(|(c, a), _| !(*a == athlete_id && team_classes.contains(c)));
            return Ok(false);
        }

        data.athletes.remove(&athlete_id);
        data.match_athletes.retain(|(a, _, _), _| *a != athlete_id);
        data.class_athletes.retain(|(_, a), _| *a != athlete_id);
        Ok(true)
    }

    async fn transfer_athlete(&self, request: TransferRequest) -> RepositoryResult<AthleteCareer> {
        self.check_health()?;
        let mut data = self.data.write();
        let ctx = || {
            ErrorContext::new("transfer_athlete")
                .with_entity("career")
                .with_entity_id(request.athlete_id)
        };

        let source_key = (request.athlete_id, request.source_team_id);
        let target_key = (request.athlete_id, request.target_team_id);

        match data.careers.get(&source_key) {
            Some(c) if c.is_open() => {}
            _ => {
                return Err(RepositoryError::not_found_with_context(
                    "Athlete has no active career at the source team",
                    ctx(),
                ))
            }
        }
        if data.careers.contains_key(&target_key) {
            return Err(RepositoryError::conflict_with_context(
                "Athlete already has a career at the target team",
                ctx(),
            ));
        }
        if data.shirt_taken(request.target_team_id, request.shirt_number, None) {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "Shirt number {} is already in use at the target team",
                    request.shirt_number
                ),
                ctx(),
            ));
        }

        if let Some(source) = data.careers.get_mut(&source_key) {
            source.finished_at = Some(request.finished_at);
        }
        let career = AthleteCareer::open(
            request.athlete_id,
            request.target_team_id,
            request.shirt_number,
            request.position,
            request.finished_at,
        );
        data.careers.insert(target_key, career.clone());
        Ok(career)
    }
}

// =============================================================================
// Matches
// =============================================================================

#[async_trait]
impl MatchRepository for LocalRepository {
    async fn create_match(
        &self,
        new_match: NewMatch,
        performances: Vec<PerformanceEntry>,
    ) -> RepositoryResult<Match> {
        self.check_health()?;
        let mut data = self.data.write();

        for team_id in [new_match.home_team_id, new_match.away_team_id] {
            if !data.teams.contains_key(&team_id) {
                return Err(not_found("Team", team_id, "create_match"));
            }
        }

        let record = Match {
            id: Uuid::new_v4(),
            home_team_id: new_match.home_team_id,
            away_team_id: new_match.away_team_id,
            timestamp: new_match.timestamp,
            home_score: new_match.home_score,
            away_score: new_match.away_score,
            created_at: Utc::now(),
        };
        let rows: Vec<MatchAthlete> = ledger::merge_performances(&performances)?
            .iter()
            .map(|p| MatchAthlete::from_entry(record.id, p))
            .collect();
        let careers = data.settle_careers(&ledger::career_deltas(&rows)?, 1, "create_match")?;

        data.matches.insert(record.id, record.clone());
        for row in rows {
            data.match_athletes
                .insert((row.athlete_id, row.match_id, row.team_id), row);
        }
        data.store_careers(careers);
        Ok(record)
    }

    async fn update_match(
        &self,
        id: Uuid,
        patch: MatchPatch,
        performances: Option<Vec<PerformanceEntry>>,
    ) -> RepositoryResult<Match> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.matches.contains_key(&id) {
            return Err(not_found("Match", id, "update_match"));
        }

        if let Some(performances) = performances {
            let old_rows = data.match_rows(id);
            let new_rows: Vec<MatchAthlete> = ledger::merge_performances(&performances)?
                .iter()
                .map(|p| MatchAthlete::from_entry(id, p))
                .collect();
            // Netted deltas carry every new pair, so this also rejects rows
            // without a career.
            let careers = data.settle_careers(
                &ledger::replacement_deltas(&old_rows, &new_rows)?,
                0,
                "update_match",
            )?;

            data.match_athletes.retain(|(_, m, _), _| *m != id);
            for row in new_rows {
                data.match_athletes
                    .insert((row.athlete_id, row.match_id, row.team_id), row);
            }
            data.store_careers(careers);
        }

        let record = data
            .matches
            .get_mut(&id)
            .ok_or_else(|| not_found("Match", id, "update_match"))?;
        patch.apply_to(record);
        Ok(record.clone())
    }

    async fn get_match(&self, id: Uuid) -> RepositoryResult<Match> {
        self.check_health()?;
        self.data
            .read()
            .matches
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Match", id, "get_match"))
    }

    async fn get_matches(&self, ids: &[Uuid]) -> RepositoryResult<Vec<Match>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.matches.get(id).cloned())
            .collect())
    }

    async fn list_matches(&self, filter: MatchFilter) -> RepositoryResult<Vec<Match>> {
        self.check_health()?;
        let mut matches: Vec<Match> = self
            .data
            .read()
            .matches
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matches)
    }

    async fn list_match_athletes(&self, match_id: Uuid) -> RepositoryResult<Vec<MatchAthlete>> {
        self.check_health()?;
        Ok(self.data.read().match_rows(match_id))
    }

    async fn create_match_athlete(&self, row: MatchAthlete) -> RepositoryResult<MatchAthlete> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.matches.contains_key(&row.match_id) {
            return Err(not_found("Match", row.match_id, "create_match_athlete"));
        }
        let key = (row.athlete_id, row.match_id, row.team_id);
        if data.match_athletes.contains_key(&key) {
            return Err(RepositoryError::conflict_with_context(
                "Performance already recorded for this athlete in this match",
                ErrorContext::new("create_match_athlete").with_entity("match_athlete"),
            ));
        }
        let careers = data.settle_careers(
            &ledger::career_deltas(std::slice::from_ref(&row))?,
            1,
            "create_match_athlete",
        )?;

        data.match_athletes.insert(key, row.clone());
        data.store_careers(careers);
        Ok(row)
    }

    async fn list_performances(
        &self,
        filter: PerformanceFilter,
    ) -> RepositoryResult<Vec<MatchAthlete>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<MatchAthlete> = data
            .match_athletes
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.match_id, r.team_id, r.athlete_id));
        Ok(rows)
    }
}

// =============================================================================
// Trainings
// =============================================================================

#[async_trait]
impl TrainingRepository for LocalRepository {
    async fn create_training(&self, team_id: Uuid, date: NaiveDate) -> RepositoryResult<Training> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.teams.contains_key(&team_id) {
            return Err(not_found("Team", team_id, "create_training"));
        }
        let training = Training {
            id: Uuid::new_v4(),
            team_id,
            date,
            concluded: false,
            concluded_at: None,
            created_at: Utc::now(),
        };
        data.trainings.insert(training.id, training.clone());
        Ok(training)
    }

    async fn get_training(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<Training> {
        self.check_health()?;
        self.data
            .read()
            .training_in_team(team_id, training_id)
            .cloned()
    }

    async fn list_trainings(
        &self,
        team_id: Uuid,
        filter: TrainingFilter,
    ) -> RepositoryResult<Vec<Training>> {
        self.check_health()?;
        let mut trainings: Vec<Training> = self
            .data
            .read()
            .trainings
            .values()
            .filter(|t| t.team_id == team_id && filter.matches(t))
            .cloned()
            .collect();
        trainings.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(trainings)
    }

    async fn update_training(
        &self,
        team_id: Uuid,
        training_id: Uuid,
        patch: TrainingPatch,
    ) -> RepositoryResult<Training> {
        self.check_health()?;
        let mut data = self.data.write();
        data.training_in_team(team_id, training_id)?;
        let training = data
            .trainings
            .get_mut(&training_id)
            .ok_or_else(|| not_found("Training", training_id, "update_training"))?;
        patch.apply_to(training, Utc::now());
        Ok(training.clone())
    }

    async fn delete_training(&self, team_id: Uuid, training_id: Uuid) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        data.training_in_team(team_id, training_id)?;
        let class_ids: Vec<Uuid> = data
            .classes
            .values()
            .filter(|c| c.training_id == training_id)
            .map(|c| c.id)
            .collect();
        for class_id in class_ids {
            data.remove_class_cascade(class_id);
        }
        data.trainings.remove(&training_id);
        Ok(())
    }

    async fn create_class(
        &self,
        training_id: Uuid,
        class: NewTrainingClass,
    ) -> RepositoryResult<TrainingClass> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.trainings.contains_key(&training_id) {
            return Err(not_found("Training", training_id, "create_class"));
        }
        let record = TrainingClass {
            id: Uuid::new_v4(),
            training_id,
            title: class.title,
            description: class.description,
            notes: class.notes,
            concluded: false,
            created_at: Utc::now(),
        };
        data.classes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_class(
        &self,
        training_id: Uuid,
        class_id: Uuid,
    ) -> RepositoryResult<TrainingClass> {
        self.check_health()?;
        self.data
            .read()
            .class_in_training(training_id, class_id)
            .cloned()
    }

    async fn list_classes(&self, training_ids: &[Uuid]) -> RepositoryResult<Vec<TrainingClass>> {
        self.check_health()?;
        let mut classes: Vec<TrainingClass> = self
            .data
            .read()
            .classes
            .values()
            .filter(|c| training_ids.contains(&c.training_id))
            .cloned()
            .collect();
        classes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(classes)
    }

    async fn update_class(
        &self,
        training_id: Uuid,
        class_id: Uuid,
        patch: TrainingClassPatch,
    ) -> RepositoryResult<TrainingClass> {
        self.check_health()?;
        let mut data = self.data.write();
        data.class_in_training(training_id, class_id)?;
        let class = data
            .classes
            .get_mut(&class_id)
            .ok_or_else(|| not_found("Training class", class_id, "update_class"))?;
        patch.apply_to(class);
        Ok(class.clone())
    }

    async fn delete_class(&self, training_id: Uuid, class_id: Uuid) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        data.class_in_training(training_id, class_id)?;
        data.remove_class_cascade(class_id);
        Ok(())
    }

    async fn add_class_athlete(&self, row: ClassAthlete) -> RepositoryResult<ClassAthlete> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.classes.contains_key(&row.training_class_id) {
            return Err(not_found("Training class", row.training_class_id, "add_class_athlete"));
        }
        let key = (row.training_class_id, row.athlete_id);
        if data.class_athletes.contains_key(&key) {
            return Err(RepositoryError::conflict_with_context(
                "Athlete already added to this training class",
                ErrorContext::new("add_class_athlete")
                    .with_entity("class_athlete")
                    .with_entity_id(row.athlete_id),
            ));
        }
        data.class_athletes.insert(key, row.clone());
        Ok(row)
    }

    async fn list_class_athletes(
        &self,
        class_ids: &[Uuid],
    ) -> RepositoryResult<Vec<ClassAthlete>> {
        self.check_health()?;
        let mut rows: Vec<ClassAthlete> = self
            .data
            .read()
            .class_athletes
            .values()
            .filter(|r| class_ids.contains(&r.training_class_id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.training_class_id, r.athlete_id));
        Ok(rows)
    }

    async fn update_class_athlete(
        &self,
        class_id: Uuid,
        athlete_id: Uuid,
        patch: ClassAthletePatch,
    ) -> RepositoryResult<ClassAthlete> {
        self.check_health()?;
        let mut data = self.data.write();
        let row = data
            .class_athletes
            .get_mut(&(class_id, athlete_id))
            .ok_or_else(|| not_found("Athlete training stats", athlete_id, "update_class_athlete"))?;
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn remove_class_athlete(
        &self,
        class_id: Uuid,
        athlete_id: Uuid,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .class_athletes
            .remove(&(class_id, athlete_id))
            .map(|_| ())
            .ok_or_else(|| not_found("Athlete training stats", athlete_id, "remove_class_athlete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_team(repo: &LocalRepository) -> Team {
        let owner = repo
            .create_user(NewUser {
                name: "Owner".into(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        repo.create_team(
            owner.id,
            NewTeam {
                full_name: "Local FC".into(),
                short_name: "LFC".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[tokio::test]
    async fn test_health_toggle_and_clear() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        assert!(repo.list_teams().await.is_err());

        repo.set_healthy(true);
        seed_team(&repo).await;
        repo.clear();
        assert!(repo.list_teams().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = LocalRepository::new();
        let user = NewUser {
            name: "A".into(),
            email: "dup@example.com".into(),
            password_hash: "x".into(),
        };
        repo.create_user(user.clone()).await.unwrap();
        let err = repo.create_user(user).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_shirt_number_unique_among_open_careers() {
        let repo = LocalRepository::new();
        let team = seed_team(&repo).await;
        let career = |n| NewCareer {
            team_id: team.id,
            shirt_number: n,
            position: "DF".into(),
        };
        let athlete = || NewAthlete {
            name: "Player".into(),
            birthdate: NaiveDate::from_ymd_opt(2000, 5, 1).unwrap(),
        };

        repo.create_athlete_with_career(athlete(), career(4), today())
            .await
            .unwrap();
        let err = repo
            .create_athlete_with_career(athlete(), career(4), today())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
        assert_eq!(repo.list_athletes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_match_rolls_back_on_missing_career() {
        let repo = LocalRepository::new();
        let home = seed_team(&repo).await;
        let away = seed_team(&repo).await;

        let result = repo
            .create_match(
                NewMatch {
                    home_team_id: home.id,
                    away_team_id: away.id,
                    timestamp: Utc::now(),
                    home_score: 1,
                    away_score: 0,
                },
                vec![PerformanceEntry {
                    athlete_id: Uuid::new_v4(),
                    team_id: home.id,
                    position: "FW".into(),
                    goals: 1,
                    assists: 0,
                    yellow_cards: 0,
                    red_cards: 0,
                }],
            )
            .await;

        assert!(matches!(result, Err(RepositoryError::BadRequest { .. })));
        assert_eq!(repo.match_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_last_career_removes_athlete() {
        let repo = LocalRepository::new();
        let team = seed_team(&repo).await;
        let (athlete, _) = repo
            .create_athlete_with_career(
                NewAthlete {
                    name: "Solo".into(),
                    birthdate: NaiveDate::from_ymd_opt(1999, 1, 1).unwrap(),
                },
                NewCareer {
                    team_id: team.id,
                    shirt_number: 9,
                    position: "FW".into(),
                },
                today(),
            )
            .await
            .unwrap();

        assert!(repo.delete_career(athlete.id, team.id).await.unwrap());
        assert!(repo.get_athlete(athlete.id).await.is_err());
        assert!(repo.delete_career(athlete.id, team.id).await.is_err());
    }

    #[tokio::test]
    async fn test_training_scoped_by_team() {
        let repo = LocalRepository::new();
        let team = seed_team(&repo).await;
        let other = seed_team(&repo).await;
        let training = repo.create_training(team.id, today()).await.unwrap();

        assert!(repo.get_training(team.id, training.id).await.is_ok());
        let err = repo.get_training(other.id, training.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    async fn seed_athlete(repo: &LocalRepository, team: &Team, shirt: i32) -> Athlete {
        repo.create_athlete_with_career(
            NewAthlete {
                name: format!("Player {}", shirt),
                birthdate: NaiveDate::from_ymd_opt(2001, 3, 3).unwrap(),
            },
            NewCareer {
                team_id: team.id,
                shirt_number: shirt,
                position: "FW".into(),
            },
            today(),
        )
        .await
        .unwrap()
        .0
    }

    fn scoring(athlete: &Athlete, team: &Team, goals: i32) -> PerformanceEntry {
        PerformanceEntry {
            athlete_id: athlete.id,
            team_id: team.id,
            position: "FW".into(),
            goals,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    fn fixture(home: &Team, away: &Team) -> NewMatch {
        NewMatch {
            home_team_id: home.id,
            away_team_id: away.id,
            timestamp: Utc::now(),
            home_score: 0,
            away_score: 0,
        }
    }

    #[tokio::test]
    async fn test_counter_overflow_writes_nothing() {
        let repo = LocalRepository::new();
        let home = seed_team(&repo).await;
        let away = seed_team(&repo).await;
        let x = seed_athlete(&repo, &home, 9).await;

        let first = repo
            .create_match(fixture(&home, &away), vec![scoring(&x, &home, 1)])
            .await
            .unwrap();

        let err = repo
            .create_match(fixture(&home, &away), vec![scoring(&x, &home, i32::MAX)])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(repo.match_count(), 1);

        let err = repo
            .update_match(
                first.id,
                MatchPatch::default(),
                Some(vec![scoring(&x, &home, i32::MAX), scoring(&x, &home, 1)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let career = repo.get_career(x.id, home.id).await.unwrap().unwrap();
        assert_eq!((career.matches, career.goals), (1, 1));
        let rows = repo.list_match_athletes(first.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].goals, 1);
    }

    #[tokio::test]
    async fn test_delete_one_career_drops_its_team_rows() {
        let repo = LocalRepository::new();
        let home = seed_team(&repo).await;
        let away = seed_team(&repo).await;
        let x = seed_athlete(&repo, &home, 9).await;

        repo.create_match(fixture(&home, &away), vec![scoring(&x, &home, 2)])
            .await
            .unwrap();
        let training = repo.create_training(home.id, today()).await.unwrap();
        let class = repo
            .create_class(
                training.id,
                NewTrainingClass {
                    title: "Finishing".into(),
                    description: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        repo.add_class_athlete(ClassAthlete {
            training_class_id: class.id,
            athlete_id: x.id,
            present: true,
            notes: None,
            stats: None,
        })
        .await
        .unwrap();

        repo.transfer_athlete(TransferRequest {
            athlete_id: x.id,
            source_team_id: home.id,
            target_team_id: away.id,
            shirt_number: 9,
            position: "FW".into(),
            finished_at: today(),
        })
        .await
        .unwrap();

        assert!(!repo.delete_career(x.id, home.id).await.unwrap());
        assert!(repo.get_athlete(x.id).await.is_ok());
        let rows = repo
            .list_performances(PerformanceFilter {
                athlete_id: Some(x.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert!(repo.list_class_athletes(&[class.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_athlete_and_career_patch_is_atomic() {
        let repo = LocalRepository::new();
        let team = seed_team(&repo).await;
        let x = seed_athlete(&repo, &team, 9).await;
        seed_athlete(&repo, &team, 4).await;

        let err = repo
            .update_athlete_with_career(
                x.id,
                team.id,
                AthletePatch {
                    name: Some("Renamed".into()),
                    birthdate: None,
                },
                CareerPatch {
                    shirt_number: Some(4),
                    position: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
        assert_eq!(repo.get_athlete(x.id).await.unwrap().name, "Player 9");

        let (athlete, career) = repo
            .update_athlete_with_career(
                x.id,
                team.id,
                AthletePatch {
                    name: Some("Renamed".into()),
                    birthdate: None,
                },
                CareerPatch {
                    shirt_number: Some(10),
                    position: Some("MF".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(athlete.name, "Renamed");
        assert_eq!((career.shirt_number, career.position.as_str()), (10, "MF"));
    }
}

//! Public API surface for the squad backend.
//!
//! This file consolidates the domain types shared by the repository layer,
//! the service layer and the HTTP API. All types derive Serialize/Deserialize
//! and use camelCase field names on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// Users & Teams
// =============================================================================

/// Registered user. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub full_name: String,
    pub short_name: String,
    pub icon_url: Option<String>,
    pub main_color_hex: Option<String>,
    pub secondary_color_hex: Option<String>,
    /// Owning user
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub full_name: String,
    pub short_name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub main_color_hex: Option<String>,
    #[serde(default)]
    pub secondary_color_hex: Option<String>,
}

/// Partial team update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub main_color_hex: Option<String>,
    #[serde(default)]
    pub secondary_color_hex: Option<String>,
}

impl TeamPatch {
    pub fn apply_to(&self, team: &mut Team) {
        if let Some(v) = &self.full_name {
            team.full_name = v.clone();
        }
        if let Some(v) = &self.short_name {
            team.short_name = v.clone();
        }
        if let Some(v) = &self.icon_url {
            team.icon_url = Some(v.clone());
        }
        if let Some(v) = &self.main_color_hex {
            team.main_color_hex = Some(v.clone());
        }
        if let Some(v) = &self.secondary_color_hex {
            team.secondary_color_hex = Some(v.clone());
        }
    }
}

/// Display-only projection of a team, embedded in match and career payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: Uuid,
    pub full_name: String,
    pub short_name: String,
    pub icon_url: Option<String>,
    pub main_color_hex: Option<String>,
    pub secondary_color_hex: Option<String>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            full_name: team.full_name.clone(),
            short_name: team.short_name.clone(),
            icon_url: team.icon_url.clone(),
            main_color_hex: team.main_color_hex.clone(),
            secondary_color_hex: team.secondary_color_hex.clone(),
        }
    }
}

// =============================================================================
// Athletes & Careers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    pub id: Uuid,
    pub name: String,
    pub birthdate: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteSummary {
    pub id: Uuid,
    pub name: String,
    pub birthdate: NaiveDate,
}

impl From<&Athlete> for AthleteSummary {
    fn from(athlete: &Athlete) -> Self {
        Self {
            id: athlete.id,
            name: athlete.name.clone(),
            birthdate: athlete.birthdate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAthlete {
    pub name: String,
    pub birthdate: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct AthletePatch {
    pub name: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

/// Tenure of an athlete at a team, keyed by `(athlete_id, team_id)`.
///
/// Counters are denormalized from the `MatchAthlete` rows recorded for the
/// same pair and must always equal their sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteCareer {
    pub athlete_id: Uuid,
    pub team_id: Uuid,
    pub shirt_number: i32,
    pub position: String,
    pub matches: i32,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub started_at: NaiveDate,
    pub finished_at: Option<NaiveDate>,
}

impl AthleteCareer {
    /// Fresh career with zeroed counters.
    pub fn open(
        athlete_id: Uuid,
        team_id: Uuid,
        shirt_number: i32,
        position: impl Into<String>,
        started_at: NaiveDate,
    ) -> Self {
        Self {
            athlete_id,
            team_id,
            shirt_number,
            position: position.into(),
            matches: 0,
            goals: 0,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
            started_at,
            finished_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.finished_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewCareer {
    pub team_id: Uuid,
    pub shirt_number: i32,
    pub position: String,
}

#[derive(Debug, Clone, Default)]
pub struct CareerPatch {
    pub shirt_number: Option<i32>,
    pub position: Option<String>,
}

/// Input of an athlete transfer between two teams.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub athlete_id: Uuid,
    pub source_team_id: Uuid,
    pub target_team_id: Uuid,
    pub shirt_number: i32,
    pub position: String,
    pub finished_at: NaiveDate,
}

// =============================================================================
// Matches
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub home_score: i32,
    pub away_score: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub home_score: i32,
    pub away_score: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    pub timestamp: Option<DateTime<Utc>>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl MatchPatch {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none() && self.home_score.is_none() && self.away_score.is_none()
    }

    pub fn apply_to(&self, m: &mut Match) {
        if let Some(ts) = self.timestamp {
            m.timestamp = ts;
        }
        if let Some(s) = self.home_score {
            m.home_score = s;
        }
        if let Some(s) = self.away_score {
            m.away_score = s;
        }
    }
}

/// Query of `GET /v1/matches`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFilter {
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl MatchFilter {
    pub fn matches(&self, m: &Match) -> bool {
        if let Some(team) = self.team_id {
            if m.home_team_id != team && m.away_team_id != team {
                return false;
            }
        }
        if let Some(from) = self.from {
            if m.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if m.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// One athlete's appearance in a match as submitted with the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    pub athlete_id: Uuid,
    pub team_id: Uuid,
    pub position: String,
    #[serde(default)]
    pub goals: i32,
    #[serde(default)]
    pub assists: i32,
    #[serde(default)]
    pub yellow_cards: i32,
    #[serde(default)]
    pub red_cards: i32,
}

/// Persisted performance row, keyed by `(athlete_id, match_id, team_id)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAthlete {
    pub athlete_id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub position: String,
    #[serde(default)]
    pub minutes_played: i32,
    #[serde(default)]
    pub goals: i32,
    #[serde(default)]
    pub assists: i32,
    #[serde(default)]
    pub shots: i32,
    #[serde(default)]
    pub shots_on_target: i32,
    #[serde(default)]
    pub accurate_passes: i32,
    #[serde(default)]
    pub inaccurate_passes: i32,
    #[serde(default)]
    pub tackles: i32,
    #[serde(default)]
    pub interceptions: i32,
    #[serde(default)]
    pub fouls_committed: i32,
    #[serde(default)]
    pub fouls_suffered: i32,
    #[serde(default)]
    pub yellow_cards: i32,
    #[serde(default)]
    pub red_cards: i32,
    #[serde(default)]
    pub performance_rating: Option<i32>,
    #[serde(default)]
    pub observations: Option<String>,
}

impl MatchAthlete {
    pub fn from_entry(match_id: Uuid, entry: &PerformanceEntry) -> Self {
        Self {
            athlete_id: entry.athlete_id,
            match_id,
            team_id: entry.team_id,
            position: entry.position.clone(),
            goals: entry.goals,
            assists: entry.assists,
            yellow_cards: entry.yellow_cards,
            red_cards: entry.red_cards,
            ..Default::default()
        }
    }
}

/// Query of `GET /v1/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceFilter {
    #[serde(default)]
    pub athlete_id: Option<Uuid>,
    #[serde(default)]
    pub match_id: Option<Uuid>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

impl PerformanceFilter {
    pub fn matches(&self, row: &MatchAthlete) -> bool {
        self.athlete_id.is_none_or(|id| row.athlete_id == id)
            && self.match_id.is_none_or(|id| row.match_id == id)
            && self.team_id.is_none_or(|id| row.team_id == id)
    }
}

// =============================================================================
// Trainings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: Uuid,
    pub team_id: Uuid,
    pub date: NaiveDate,
    pub concluded: bool,
    pub concluded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub concluded: Option<bool>,
}

impl TrainingFilter {
    pub fn matches(&self, t: &Training) -> bool {
        self.from.is_none_or(|from| t.date >= from)
            && self.to.is_none_or(|to| t.date <= to)
            && self.concluded.is_none_or(|c| t.concluded == c)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPatch {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub concluded: Option<bool>,
}

impl TrainingPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.concluded.is_none()
    }

    pub fn apply_to(&self, training: &mut Training, now: DateTime<Utc>) {
        if let Some(date) = self.date {
            training.date = date;
        }
        if let Some(concluded) = self.concluded {
            if concluded && !training.concluded {
                training.concluded_at = Some(now);
            } else if !concluded {
                training.concluded_at = None;
            }
            training.concluded = concluded;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingClass {
    pub id: Uuid,
    pub training_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub concluded: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrainingClass {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingClassPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub concluded: Option<bool>,
}

impl TrainingClassPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.concluded.is_none()
    }

    pub fn apply_to(&self, class: &mut TrainingClass) {
        if let Some(v) = &self.title {
            class.title = v.clone();
        }
        if let Some(v) = &self.description {
            class.description = Some(v.clone());
        }
        if let Some(v) = &self.notes {
            class.notes = Some(v.clone());
        }
        if let Some(v) = self.concluded {
            class.concluded = v;
        }
    }
}

/// Attendance and free-form stats of one athlete in one training class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAthlete {
    pub training_class_id: Uuid,
    pub athlete_id: Uuid,
    pub present: bool,
    pub notes: Option<String>,
    pub stats: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAthletePatch {
    #[serde(default)]
    pub present: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub stats: Option<Value>,
}

impl ClassAthletePatch {
    pub fn is_empty(&self) -> bool {
        self.present.is_none() && self.notes.is_none() && self.stats.is_none()
    }

    pub fn apply_to(&self, row: &mut ClassAthlete) {
        if let Some(v) = self.present {
            row.present = v;
        }
        if let Some(v) = &self.notes {
            row.notes = Some(v.clone());
        }
        if let Some(v) = &self.stats {
            row.stats = Some(v.clone());
        }
    }
}

// =============================================================================
// Request payloads
// =============================================================================

/// Body of `POST /v1/matches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub home_score: i32,
    pub away_score: i32,
    #[serde(default)]
    pub athletes: Vec<PerformanceEntry>,
}

impl CreateMatchRequest {
    pub fn new_match(&self) -> NewMatch {
        NewMatch {
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            timestamp: self.timestamp,
            home_score: self.home_score,
            away_score: self.away_score,
        }
    }
}

/// Body of `PATCH /v1/matches/{id}`. A present `athletes` list replaces
/// every performance row of the match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub home_score: Option<i32>,
    #[serde(default)]
    pub away_score: Option<i32>,
    #[serde(default)]
    pub athletes: Option<Vec<PerformanceEntry>>,
}

impl UpdateMatchRequest {
    pub fn patch(&self) -> MatchPatch {
        MatchPatch {
            timestamp: self.timestamp,
            home_score: self.home_score,
            away_score: self.away_score,
        }
    }
}

/// Body of `POST /v1/teams/{teamId}/athletes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamAthleteRequest {
    pub name: String,
    pub birthdate: NaiveDate,
    pub shirt_number: i32,
    pub position: String,
}

/// Query of `GET /v1/teams/{teamId}/athletes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAthleteFilter {
    /// Only open careers
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    /// Careers started on or after this date
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Careers finished on or before this date
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl TeamAthleteFilter {
    pub fn matches(&self, athlete: &Athlete, career: &AthleteCareer) -> bool {
        if self.current && !career.is_open() {
            return false;
        }
        if let Some(from) = self.from {
            if career.started_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            match career.finished_at {
                Some(finished) if finished <= to => {}
                _ => return false,
            }
        }
        if let Some(position) = &self.position {
            if &career.position != position {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_ignore_case(&athlete.name, name) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Body of `POST /v1/teams/{teamId}/athletes/{athleteId}/transfer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAthleteRequest {
    pub target_team_id: Uuid,
    /// Defaults to the source career's shirt number
    #[serde(default)]
    pub shirt_number: Option<i32>,
    /// Defaults to the source career's position
    #[serde(default)]
    pub position: Option<String>,
}

/// Query of `GET /v1/teams/{teamId}/athletes/{athleteId}/trainings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteTrainingsQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Pagination of `GET /v1/athletes/{id}`. Signed so out-of-range values
/// reach validation instead of failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainingRequest {
    pub date: NaiveDate,
}

/// Query of `GET /v1/teams/{teamId}/trainings`. `concluded` stays a string
/// so anything but `true`/`false` can be reported as a validation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingListQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub concluded: Option<String>,
}

/// Body of `POST …/classes/{classId}/athletes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassAthlete {
    pub athlete_id: Uuid,
    #[serde(default = "default_present")]
    pub present: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub stats: Option<Value>,
}

fn default_present() -> bool {
    true
}

/// Query of `GET /v1/players`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFilter {
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    pub name: String,
    pub birthdate: NaiveDate,
    pub team_id: Uuid,
    pub shirt_number: i32,
    pub position: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub shirt_number: Option<i32>,
    #[serde(default)]
    pub position: Option<String>,
}

// =============================================================================
// Composed views
// =============================================================================

/// Match with display summaries of both teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWithTeams {
    #[serde(flatten)]
    pub record: Match,
    pub home_team: TeamSummary,
    pub away_team: TeamSummary,
}

/// Performance row joined with its athlete and team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPerformance {
    #[serde(flatten)]
    pub row: MatchAthlete,
    pub athlete: AthleteSummary,
    pub team: TeamSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetail {
    #[serde(flatten)]
    pub record: Match,
    pub home_team: TeamSummary,
    pub away_team: TeamSummary,
    pub athletes: Vec<MatchPerformance>,
}

/// Athlete and one of its careers merged into a flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteWithCareer {
    #[serde(flatten)]
    pub athlete: Athlete,
    #[serde(flatten)]
    pub career: AthleteCareer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerInfo {
    pub shirt_number: i32,
    pub position: String,
    pub started_at: NaiveDate,
    pub finished_at: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerStats {
    pub matches: i32,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub goals_per_match: f64,
    pub assists_per_match: f64,
}

/// Stats of one athlete at one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteTeamStats {
    pub athlete: AthleteSummary,
    pub career: CareerInfo,
    pub stats: CareerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendedClass {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub concluded: bool,
    pub present: bool,
    pub notes: Option<String>,
    pub stats: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendedTraining {
    pub id: Uuid,
    pub date: NaiveDate,
    pub concluded: bool,
    pub concluded_at: Option<DateTime<Utc>>,
    pub classes: Vec<AttendedClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_trainings: usize,
    pub total_classes: usize,
    pub attended_classes: usize,
    pub missed_classes: usize,
    /// Percentage with one decimal
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteTrainings {
    pub trainings: Vec<AttendedTraining>,
    pub summary: AttendanceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerWithTeam {
    #[serde(flatten)]
    pub career: AthleteCareer,
    pub team: TeamSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthletePerformance {
    #[serde(flatten)]
    pub row: MatchAthlete,
    #[serde(rename = "match")]
    pub played: MatchWithTeams,
    pub team: TeamSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerTotals {
    pub matches: i32,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteDetail {
    #[serde(flatten)]
    pub athlete: Athlete,
    pub teams: Vec<CareerWithTeam>,
    pub match_performances: Vec<AthletePerformance>,
    pub career_totals: CareerTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithOwner {
    #[serde(flatten)]
    pub team: Team,
    pub owner: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub owner: User,
    pub athletes: Vec<AthleteCareer>,
    pub home_matches: Vec<MatchWithTeams>,
    pub away_matches: Vec<MatchWithTeams>,
    pub trainings: Vec<Training>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAthleteDetail {
    #[serde(flatten)]
    pub row: ClassAthlete,
    pub athlete: AthleteSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingClassDetail {
    #[serde(flatten)]
    pub class: TrainingClass,
    pub athlete_stats: Vec<ClassAthleteDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDetail {
    #[serde(flatten)]
    pub training: Training,
    pub classes: Vec<TrainingClassDetail>,
}

/// Performance row joined with the match it was recorded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPerformance {
    #[serde(flatten)]
    pub row: MatchAthlete,
    pub match_date: DateTime<Utc>,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub home_score: i32,
    pub away_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionPoint {
    pub match_id: Uuid,
    pub date: DateTime<Utc>,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub cumulative_goals: i32,
    pub cumulative_assists: i32,
    pub cumulative_yellow_cards: i32,
    pub cumulative_red_cards: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub id: Uuid,
    pub name: String,
    pub position: String,
    pub goals: i32,
    pub assists: i32,
    pub matches: i32,
    /// Goals per match
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCount {
    pub position: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_players: usize,
    pub total_matches: usize,
    pub total_goals: i64,
    pub overall_average: f64,
    pub top_performers: Vec<TopPerformer>,
    pub recent_matches: Vec<Match>,
    pub position_distribution: Vec<PositionCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(home: Uuid, away: Uuid, ts: DateTime<Utc>) -> Match {
        Match {
            id: Uuid::new_v4(),
            home_team_id: home,
            away_team_id: away,
            timestamp: ts,
            home_score: 0,
            away_score: 0,
            created_at: ts,
        }
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$2b$12$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ana@example.com");
    }

    #[test]
    fn test_match_filter_by_team_and_range() {
        let home = Uuid::new_v4();
        let away = Uuid::new_v4();
        let ts = "2025-03-10T18:00:00Z".parse().unwrap();
        let m = sample_match(home, away, ts);

        assert!(MatchFilter::default().matches(&m));
        assert!(MatchFilter { team_id: Some(away), ..Default::default() }.matches(&m));
        assert!(!MatchFilter { team_id: Some(Uuid::new_v4()), ..Default::default() }.matches(&m));
        assert!(!MatchFilter {
            from: Some("2025-03-11T00:00:00Z".parse().unwrap()),
            ..Default::default()
        }
        .matches(&m));
    }

    #[test]
    fn test_training_patch_tracks_conclusion_time() {
        let now = Utc::now();
        let mut training = Training {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            concluded: false,
            concluded_at: None,
            created_at: now,
        };

        TrainingPatch { date: None, concluded: Some(true) }.apply_to(&mut training, now);
        assert!(training.concluded);
        assert_eq!(training.concluded_at, Some(now));

        TrainingPatch { date: None, concluded: Some(false) }.apply_to(&mut training, now);
        assert!(!training.concluded);
        assert!(training.concluded_at.is_none());
    }
}

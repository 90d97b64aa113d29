use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{
    athlete_career, athlete_training_class_stats, athletes, match_athletes, matches, teams,
    training_classes, trainings, users,
};
use crate::api;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for api::User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TeamRow {
    pub id: Uuid,
    pub full_name: String,
    pub short_name: String,
    pub icon_url: Option<String>,
    pub main_color_hex: Option<String>,
    pub secondary_color_hex: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<TeamRow> for api::Team {
    fn from(row: TeamRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            short_name: row.short_name,
            icon_url: row.icon_url,
            main_color_hex: row.main_color_hex,
            secondary_color_hex: row.secondary_color_hex,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

impl From<api::Team> for TeamRow {
    fn from(team: api::Team) -> Self {
        Self {
            id: team.id,
            full_name: team.full_name,
            short_name: team.short_name,
            icon_url: team.icon_url,
            main_color_hex: team.main_color_hex,
            secondary_color_hex: team.secondary_color_hex,
            created_by: team.created_by,
            created_at: team.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = athletes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AthleteRow {
    pub id: Uuid,
    pub name: String,
    pub birthdate: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<AthleteRow> for api::Athlete {
    fn from(row: AthleteRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            birthdate: row.birthdate,
            created_at: row.created_at,
        }
    }
}

impl From<api::Athlete> for AthleteRow {
    fn from(a: api::Athlete) -> Self {
        Self {
            id: a.id,
            name: a.name,
            birthdate: a.birthdate,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = athlete_career)]
#[diesel(primary_key(athlete_id, team_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct CareerRow {
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

impl From<CareerRow> for api::AthleteCareer {
    fn from(row: CareerRow) -> Self {
        Self {
            athlete_id: row.athlete_id,
            team_id: row.team_id,
            shirt_number: row.shirt_number,
            position: row.position,
            matches: row.matches,
            goals: row.goals,
            assists: row.assists,
            yellow_cards: row.yellow_cards,
            red_cards: row.red_cards,
            started_at: row.started_at,
            finished_at: row.finished_at,
        }
    }
}

impl From<api::AthleteCareer> for CareerRow {
    fn from(c: api::AthleteCareer) -> Self {
        Self {
            athlete_id: c.athlete_id,
            team_id: c.team_id,
            shirt_number: c.shirt_number,
            position: c.position,
            matches: c.matches,
            goals: c.goals,
            assists: c.assists,
            yellow_cards: c.yellow_cards,
            red_cards: c.red_cards,
            started_at: c.started_at,
            finished_at: c.finished_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchRow {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub played_at: DateTime<Utc>,
    pub home_score: i32,
    pub away_score: i32,
    pub created_at: DateTime<Utc>,
}

impl From<MatchRow> for api::Match {
    fn from(row: MatchRow) -> Self {
        Self {
            id: row.id,
            home_team_id: row.home_team_id,
            away_team_id: row.away_team_id,
            timestamp: row.played_at,
            home_score: row.home_score,
            away_score: row.away_score,
            created_at: row.created_at,
        }
    }
}

impl From<api::Match> for MatchRow {
    fn from(m: api::Match) -> Self {
        Self {
            id: m.id,
            home_team_id: m.home_team_id,
            away_team_id: m.away_team_id,
            played_at: m.timestamp,
            home_score: m.home_score,
            away_score: m.away_score,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = match_athletes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchAthleteRow {
    pub athlete_id: Uuid,
    pub match_id: Uuid,
    pub team_id: Uuid,
    pub position: String,
    pub minutes_played: i32,
    pub goals: i32,
    pub assists: i32,
    pub shots: i32,
    pub shots_on_target: i32,
    pub accurate_passes: i32,
    pub inaccurate_passes: i32,
    pub tackles: i32,
    pub interceptions: i32,
    pub fouls_committed: i32,
    pub fouls_suffered: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub performance_rating: Option<i32>,
    pub observations: Option<String>,
}

impl From<MatchAthleteRow> for api::MatchAthlete {
    fn from(row: MatchAthleteRow) -> Self {
        Self {
            athlete_id: row.athlete_id,
            match_id: row.match_id,
            team_id: row.team_id,
            position: row.position,
            minutes_played: row.minutes_played,
            goals: row.goals,
            assists: row.assists,
            shots: row.shots,
            shots_on_target: row.shots_on_target,
            accurate_passes: row.accurate_passes,
            inaccurate_passes: row.inaccurate_passes,
            tackles: row.tackles,
            interceptions: row.interceptions,
            fouls_committed: row.fouls_committed,
            fouls_suffered: row.fouls_suffered,
            yellow_cards: row.yellow_cards,
            red_cards: row.red_cards,
            performance_rating: row.performance_rating,
            observations: row.observations,
        }
    }
}

impl From<api::MatchAthlete> for MatchAthleteRow {
    fn from(m: api::MatchAthlete) -> Self {
        Self {
            athlete_id: m.athlete_id,
            match_id: m.match_id,
            team_id: m.team_id,
            position: m.position,
            minutes_played: m.minutes_played,
            goals: m.goals,
            assists: m.assists,
            shots: m.shots,
            shots_on_target: m.shots_on_target,
            accurate_passes: m.accurate_passes,
            inaccurate_passes: m.inaccurate_passes,
            tackles: m.tackles,
            interceptions: m.interceptions,
            fouls_committed: m.fouls_committed,
            fouls_suffered: m.fouls_suffered,
            yellow_cards: m.yellow_cards,
            red_cards: m.red_cards,
            performance_rating: m.performance_rating,
            observations: m.observations,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = trainings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TrainingRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub training_date: NaiveDate,
    pub concluded: bool,
    pub concluded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<TrainingRow> for api::Training {
    fn from(row: TrainingRow) -> Self {
        Self {
            id: row.id,
            team_id: row.team_id,
            date: row.training_date,
            concluded: row.concluded,
            concluded_at: row.concluded_at,
            created_at: row.created_at,
        }
    }
}

impl From<api::Training> for TrainingRow {
    fn from(t: api::Training) -> Self {
        Self {
            id: t.id,
            team_id: t.team_id,
            training_date: t.date,
            concluded: t.concluded,
            concluded_at: t.concluded_at,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = training_classes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TrainingClassRow {
    pub id: Uuid,
    pub training_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub concluded: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TrainingClassRow> for api::TrainingClass {
    fn from(row: TrainingClassRow) -> Self {
        Self {
            id: row.id,
            training_id: row.training_id,
            title: row.title,
            description: row.description,
            notes: row.notes,
            concluded: row.concluded,
            created_at: row.created_at,
        }
    }
}

impl From<api::TrainingClass> for TrainingClassRow {
    fn from(c: api::TrainingClass) -> Self {
        Self {
            id: c.id,
            training_id: c.training_id,
            title: c.title,
            description: c.description,
            notes: c.notes,
            concluded: c.concluded,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable, AsChangeset)]
#[diesel(table_name = athlete_training_class_stats)]
#[diesel(primary_key(training_class_id, athlete_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ClassAthleteRow {
    pub training_class_id: Uuid,
    pub athlete_id: Uuid,
    pub present: bool,
    pub notes: Option<String>,
    pub stats: Option<Value>,
}

impl From<ClassAthleteRow> for api::ClassAthlete {
    fn from(row: ClassAthleteRow) -> Self {
        Self {
            training_class_id: row.training_class_id,
            athlete_id: row.athlete_id,
            present: row.present,
            notes: row.notes,
            stats: row.stats,
        }
    }
}

impl From<api::ClassAthlete> for ClassAthleteRow {
    fn from(r: api::ClassAthlete) -> Self {
        Self {
            training_class_id: r.training_class_id,
            athlete_id: r.athlete_id,
            present: r.present,
            notes: r.notes,
            stats: r.stats,
        }
    }
}

//! Data Transfer Objects for the HTTP API.
//!
//! Request and response bodies are the domain types from [`crate::api`] and
//! [`crate::auth`]; this module re-exports them and adds the few shapes that
//! only exist on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::api::{
    // Athletes
    AthleteDetail, AthleteTeamStats, AthleteTrainings, AthleteTrainingsQuery, AthleteWithCareer,
    CreateTeamAthleteRequest, PageQuery, TeamAthleteFilter, TransferAthleteRequest,
    // Matches
    CreateMatchRequest, Match, MatchDetail, MatchFilter, MatchWithTeams, UpdateMatchRequest,
    // Stats
    EvolutionPoint, MatchAthlete, PerformanceFilter, PlayerPerformance,
    // Players
    CreatePlayerRequest, PlayerFilter, UpdatePlayerRequest,
    // Dashboard
    DashboardSummary,
    // Teams
    NewTeam, Team, TeamDetail, TeamPatch, TeamWithOwner, User,
    // Trainings
    ClassAthlete, ClassAthletePatch, CreateTrainingRequest, NewClassAthlete, NewTrainingClass,
    Training, TrainingClass, TrainingClassDetail, TrainingClassPatch, TrainingDetail,
    TrainingListQuery, TrainingPatch,
};
pub use crate::auth::{AuthResponse, RegisterRequest, SignInRequest};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// `{ success: true, data }` wrapper used by the training endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body of delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted {
    pub success: bool,
}

impl Deleted {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// `?teamId=` of player update and delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamIdQuery {
    pub team_id: Uuid,
}

/// `?teamId=` of the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

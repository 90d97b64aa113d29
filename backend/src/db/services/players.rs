//! Flat player view: one athlete joined with one of its careers.

use chrono::Utc;
use log::info;
use uuid::Uuid;

use super::athletes::{no_career, shirt_taken};
use super::{require_owner, validate};
use crate::api::{
    contains_ignore_case, AthletePatch, AthleteWithCareer, CareerPatch, CreatePlayerRequest,
    NewAthlete, NewCareer, PlayerFilter, UpdatePlayerRequest,
};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

fn validate_shirt(shirt_number: i32) -> RepositoryResult<()> {
    validate::range("shirtNumber", shirt_number, 1, 99)
}

fn validate_position(position: &str) -> RepositoryResult<()> {
    validate::length("position", position, 1, 32)
}

/// Every career matching `filter`, in athlete name order.
pub async fn list_players<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &PlayerFilter,
) -> RepositoryResult<Vec<AthleteWithCareer>> {
    let rows = repo.list_careers().await?;
    Ok(rows
        .into_iter()
        .filter(|(athlete, career)| {
            filter.team_id.is_none_or(|id| career.team_id == id)
                && filter
                    .position
                    .as_deref()
                    .is_none_or(|p| career.position == p)
                && filter
                    .name
                    .as_deref()
                    .is_none_or(|n| contains_ignore_case(&athlete.name, n))
        })
        .map(|(athlete, career)| AthleteWithCareer { athlete, career })
        .collect())
}

/// The athlete with its most recent career.
pub async fn get_player<R: FullRepository + ?Sized>(
    repo: &R,
    athlete_id: Uuid,
) -> RepositoryResult<AthleteWithCareer> {
    let athlete = repo.get_athlete(athlete_id).await?;
    let career = repo
        .list_athlete_careers(athlete_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Player not found",
                ErrorContext::new("get_player")
                    .with_entity("player")
                    .with_entity_id(athlete_id),
            )
        })?;
    Ok(AthleteWithCareer { athlete, career })
}

pub async fn create_player<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    request: CreatePlayerRequest,
) -> RepositoryResult<AthleteWithCareer> {
    validate::length("name", &request.name, 1, 255)?;
    validate_shirt(request.shirt_number)?;
    validate_position(&request.position)?;
    require_owner(repo, user_id, request.team_id, "create_player").await?;

    if repo
        .find_open_career_by_shirt(request.team_id, request.shirt_number)
        .await?
        .is_some()
    {
        return Err(shirt_taken(request.shirt_number, "create_player"));
    }

    let (athlete, career) = repo
        .create_athlete_with_career(
            NewAthlete {
                name: request.name,
                birthdate: request.birthdate,
            },
            NewCareer {
                team_id: request.team_id,
                shirt_number: request.shirt_number,
                position: request.position,
            },
            Utc::now().date_naive(),
        )
        .await?;
    info!("Created player {} at team {}", athlete.id, career.team_id);
    Ok(AthleteWithCareer { athlete, career })
}

/// Patch the athlete and its career at `team_id`.
///
/// Both records are written in one repository transaction, so a rejected
/// shirt number leaves the athlete untouched.
pub async fn update_player<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    athlete_id: Uuid,
    team_id: Uuid,
    request: UpdatePlayerRequest,
) -> RepositoryResult<AthleteWithCareer> {
    require_owner(repo, user_id, team_id, "update_player").await?;
    if repo.get_career(athlete_id, team_id).await?.is_none() {
        return Err(no_career(athlete_id, "update_player"));
    }

    validate::optional_length("name", request.name.as_deref(), 1, 255)?;
    if let Some(shirt) = request.shirt_number {
        validate_shirt(shirt)?;
    }
    if let Some(position) = &request.position {
        validate_position(position)?;
    }

    let (athlete, career) = repo
        .update_athlete_with_career(
            athlete_id,
            team_id,
            AthletePatch {
                name: request.name,
                birthdate: request.birthdate,
            },
            CareerPatch {
                shirt_number: request.shirt_number,
                position: request.position,
            },
        )
        .await?;

    Ok(AthleteWithCareer { athlete, career })
}

/// Remove the career at `team_id`; the athlete goes with its last career.
pub async fn delete_player<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    athlete_id: Uuid,
    team_id: Uuid,
) -> RepositoryResult<()> {
    require_owner(repo, user_id, team_id, "delete_player").await?;
    let athlete_removed = repo.delete_career(athlete_id, team_id).await?;
    info!(
        "Removed player {} from team {} (athlete deleted: {})",
        athlete_id, team_id, athlete_removed
    );
    Ok(())
}

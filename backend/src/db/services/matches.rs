//! Match creation, update and read views.
//!
//! Creation and update run their checks here in a fixed order, so the caller
//! always sees the first failing rule. The career counter arithmetic happens
//! inside the repository transaction (see [`crate::db::ledger`]).

use std::collections::HashMap;

use log::{debug, info};
use uuid::Uuid;

use super::{require_any_owner, validate};
use crate::api::{
    AthleteSummary, CreateMatchRequest, Match, MatchDetail, MatchFilter, MatchPerformance,
    MatchWithTeams, PerformanceEntry, Team, TeamSummary, UpdateMatchRequest,
};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

fn validate_entry(entry: &PerformanceEntry) -> RepositoryResult<()> {
    validate::length("position", &entry.position, 2, 255)?;
    validate::non_negative("goals", entry.goals)?;
    validate::non_negative("assists", entry.assists)?;
    validate::range("yellowCards", entry.yellow_cards, 0, 2)?;
    validate::range("redCards", entry.red_cards, 0, 1)
}

/// Every entry must name an athlete with an open career at the stated team.
async fn require_active_careers<R: FullRepository + ?Sized>(
    repo: &R,
    entries: &[PerformanceEntry],
    operation: &str,
) -> RepositoryResult<()> {
    for entry in entries {
        if repo
            .find_open_career(entry.athlete_id, entry.team_id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::bad_request_with_context(
                format!(
                    "Athlete {} has no active career with team {}",
                    entry.athlete_id, entry.team_id
                ),
                ErrorContext::new(operation)
                    .with_entity("career")
                    .with_entity_id(entry.athlete_id),
            ));
        }
    }
    Ok(())
}

/// Create a match and apply its performances to the athletes' careers.
///
/// Checks, in order:
/// 1. home and away teams differ (`ValidationError`, before any read)
/// 2. field ranges (`ValidationError`)
/// 3. the caller owns at least one of the teams (`PermissionDenied`)
/// 4. every athlete has an open career at its team (`BadRequest`)
pub async fn create_match<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    request: CreateMatchRequest,
) -> RepositoryResult<Match> {
    if request.home_team_id == request.away_team_id {
        return Err(RepositoryError::validation_with_context(
            "Home and away teams must be different",
            ErrorContext::new("create_match").with_entity("awayTeamId"),
        ));
    }
    validate::non_negative("homeScore", request.home_score)?;
    validate::non_negative("awayScore", request.away_score)?;
    for entry in &request.athletes {
        validate_entry(entry)?;
    }

    let teams = [request.home_team_id, request.away_team_id];
    require_any_owner(repo, user_id, &teams, "create_match").await?;
    require_active_careers(repo, &request.athletes, "create_match").await?;

    let new_match = request.new_match();
    let record = repo.create_match(new_match, request.athletes).await?;
    info!(
        "Created match {} ({} vs {})",
        record.id, record.home_team_id, record.away_team_id
    );
    Ok(record)
}

/// Patch a match and optionally replace its performance rows.
///
/// An empty request returns the match unchanged.
pub async fn update_match<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    match_id: Uuid,
    request: UpdateMatchRequest,
) -> RepositoryResult<Match> {
    let existing = repo.get_match(match_id).await?;
    require_any_owner(
        repo,
        user_id,
        &[existing.home_team_id, existing.away_team_id],
        "update_match",
    )
    .await?;

    if let Some(score) = request.home_score {
        validate::non_negative("homeScore", score)?;
    }
    if let Some(score) = request.away_score {
        validate::non_negative("awayScore", score)?;
    }

    let patch = request.patch();
    if patch.is_empty() && request.athletes.is_none() {
        debug!("Empty update for match {}", match_id);
        return Ok(existing);
    }

    if let Some(entries) = &request.athletes {
        for entry in entries {
            validate_entry(entry)?;
        }
        require_active_careers(repo, entries, "update_match").await?;
    }

    let record = repo.update_match(match_id, patch, request.athletes).await?;
    info!("Updated match {}", match_id);
    Ok(record)
}

/// Matches passing `filter`, newest first, with both team summaries.
pub async fn list_matches<R: FullRepository + ?Sized>(
    repo: &R,
    filter: MatchFilter,
) -> RepositoryResult<Vec<MatchWithTeams>> {
    let matches = repo.list_matches(filter).await?;
    with_teams(repo, matches).await
}

/// Attach home/away team summaries to each match.
pub(crate) async fn with_teams<R: FullRepository + ?Sized>(
    repo: &R,
    matches: Vec<Match>,
) -> RepositoryResult<Vec<MatchWithTeams>> {
    let mut ids: Vec<Uuid> = matches
        .iter()
        .flat_map(|m| [m.home_team_id, m.away_team_id])
        .collect();
    ids.sort();
    ids.dedup();
    let teams = team_summaries(repo.get_teams(&ids).await?);

    matches
        .into_iter()
        .map(|record| {
            Ok(MatchWithTeams {
                home_team: summary_for(&teams, record.home_team_id)?,
                away_team: summary_for(&teams, record.away_team_id)?,
                record,
            })
        })
        .collect()
}

pub(crate) fn team_summaries(teams: Vec<Team>) -> HashMap<Uuid, TeamSummary> {
    teams
        .iter()
        .map(|t| (t.id, TeamSummary::from(t)))
        .collect()
}

pub(crate) fn summary_for(
    teams: &HashMap<Uuid, TeamSummary>,
    id: Uuid,
) -> RepositoryResult<TeamSummary> {
    teams.get(&id).cloned().ok_or_else(|| {
        RepositoryError::internal_with_context(
            "Referenced team is missing",
            ErrorContext::default().with_entity("team").with_entity_id(id),
        )
    })
}

/// A match with its teams and every performance row.
pub async fn match_detail<R: FullRepository + ?Sized>(
    repo: &R,
    match_id: Uuid,
) -> RepositoryResult<MatchDetail> {
    let record = repo.get_match(match_id).await?;
    let rows = repo.list_match_athletes(match_id).await?;

    let mut team_ids: Vec<Uuid> = rows.iter().map(|r| r.team_id).collect();
    team_ids.extend([record.home_team_id, record.away_team_id]);
    team_ids.sort();
    team_ids.dedup();
    let teams = team_summaries(repo.get_teams(&team_ids).await?);

    let athlete_ids: Vec<Uuid> = rows.iter().map(|r| r.athlete_id).collect();
    let athletes: HashMap<Uuid, AthleteSummary> = repo
        .get_athletes(&athlete_ids)
        .await?
        .iter()
        .map(|a| (a.id, AthleteSummary::from(a)))
        .collect();

    let mut performances = Vec::with_capacity(rows.len());
    for row in rows {
        let athlete = athletes.get(&row.athlete_id).cloned().ok_or_else(|| {
            RepositoryError::internal_with_context(
                "Referenced athlete is missing",
                ErrorContext::new("match_detail")
                    .with_entity("athlete")
                    .with_entity_id(row.athlete_id),
            )
        })?;
        performances.push(MatchPerformance {
            team: summary_for(&teams, row.team_id)?,
            athlete,
            row,
        });
    }

    Ok(MatchDetail {
        home_team: summary_for(&teams, record.home_team_id)?,
        away_team: summary_for(&teams, record.away_team_id)?,
        record,
        athletes: performances,
    })
}

//! Standalone performance rows and per-player statistics.

use std::collections::HashMap;

use log::info;
use uuid::Uuid;

use super::{require_owner, validate};
use crate::api::{EvolutionPoint, Match, MatchAthlete, PerformanceFilter, PlayerPerformance};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

fn validate_row(row: &MatchAthlete) -> RepositoryResult<()> {
    validate::length("position", &row.position, 1, 255)?;
    validate::range("minutesPlayed", row.minutes_played, 0, 120)?;
    for (field, value) in [
        ("goals", row.goals),
        ("assists", row.assists),
        ("shots", row.shots),
        ("shotsOnTarget", row.shots_on_target),
        ("accuratePasses", row.accurate_passes),
        ("inaccuratePasses", row.inaccurate_passes),
        ("tackles", row.tackles),
        ("interceptions", row.interceptions),
        ("foulsCommitted", row.fouls_committed),
        ("foulsSuffered", row.fouls_suffered),
    ] {
        validate::non_negative(field, value)?;
    }
    validate::range("yellowCards", row.yellow_cards, 0, 2)?;
    validate::range("redCards", row.red_cards, 0, 1)?;
    if let Some(rating) = row.performance_rating {
        validate::range("performanceRating", rating, 0, 100)?;
    }
    validate::optional_length("observations", row.observations.as_deref(), 0, 4096)
}

pub async fn list_stats<R: FullRepository + ?Sized>(
    repo: &R,
    filter: PerformanceFilter,
) -> RepositoryResult<Vec<MatchAthlete>> {
    repo.list_performances(filter).await
}

/// Record one performance row and add it to the athlete's career.
///
/// Fails with `PermissionDenied` unless the caller owns the row's team, then
/// with `NotFound` for a missing match, `BadRequest` without an open career
/// and `Conflict` for a duplicate row.
pub async fn create_stat<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    row: MatchAthlete,
) -> RepositoryResult<MatchAthlete> {
    validate_row(&row)?;
    require_owner(repo, user_id, row.team_id, "create_stat").await?;
    repo.get_match(row.match_id).await?;
    if repo
        .find_open_career(row.athlete_id, row.team_id)
        .await?
        .is_none()
    {
        return Err(RepositoryError::bad_request_with_context(
            "Athlete has no active career with this team",
            ErrorContext::new("create_stat")
                .with_entity("career")
                .with_entity_id(row.athlete_id),
        ));
    }

    let row = repo.create_match_athlete(row).await?;
    info!(
        "Recorded stats of athlete {} in match {}",
        row.athlete_id, row.match_id
    );
    Ok(row)
}

/// Performances of one athlete joined with their matches, in chronological order.
async fn performances_by_date<R: FullRepository + ?Sized>(
    repo: &R,
    athlete_id: Uuid,
) -> RepositoryResult<Vec<PlayerPerformance>> {
    let rows = repo
        .list_performances(PerformanceFilter {
            athlete_id: Some(athlete_id),
            ..Default::default()
        })
        .await?;

    let match_ids: Vec<Uuid> = rows.iter().map(|r| r.match_id).collect();
    let matches: HashMap<Uuid, Match> = repo
        .get_matches(&match_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut joined = rows
        .into_iter()
        .map(|row| {
            let played = matches.get(&row.match_id).ok_or_else(|| {
                RepositoryError::internal_with_context(
                    "Referenced match is missing",
                    ErrorContext::new("player_stats")
                        .with_entity("match")
                        .with_entity_id(row.match_id),
                )
            })?;
            Ok(PlayerPerformance {
                match_date: played.timestamp,
                home_team_id: played.home_team_id,
                away_team_id: played.away_team_id,
                home_score: played.home_score,
                away_score: played.away_score,
                row,
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()?;

    joined.sort_by_key(|p| (p.match_date, p.row.match_id));
    Ok(joined)
}

/// An athlete's performances, newest match first.
pub async fn player_stats<R: FullRepository + ?Sized>(
    repo: &R,
    athlete_id: Uuid,
) -> RepositoryResult<Vec<PlayerPerformance>> {
    let mut rows = performances_by_date(repo, athlete_id).await?;
    rows.reverse();
    Ok(rows)
}

/// Oldest-first series with running totals.
pub async fn player_evolution<R: FullRepository + ?Sized>(
    repo: &R,
    athlete_id: Uuid,
) -> RepositoryResult<Vec<EvolutionPoint>> {
    let rows = performances_by_date(repo, athlete_id).await?;
    Ok(evolution(&rows))
}

fn evolution(rows: &[PlayerPerformance]) -> Vec<EvolutionPoint> {
    let (mut goals, mut assists, mut yellow, mut red) = (0, 0, 0, 0);
    rows.iter()
        .map(|p| {
            goals += p.row.goals;
            assists += p.row.assists;
            yellow += p.row.yellow_cards;
            red += p.row.red_cards;
            EvolutionPoint {
                match_id: p.row.match_id,
                date: p.match_date,
                goals: p.row.goals,
                assists: p.row.assists,
                yellow_cards: p.row.yellow_cards,
                red_cards: p.row.red_cards,
                cumulative_goals: goals,
                cumulative_assists: assists,
                cumulative_yellow_cards: yellow,
                cumulative_red_cards: red,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CreateMatchRequest;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::AthleteRepository;
    use crate::db::services::{matches, test_support};

    async fn empty_match(
        repo: &LocalRepository,
        user: Uuid,
        home: Uuid,
        away: Uuid,
        timestamp: &str,
    ) -> Match {
        matches::create_match(
            repo,
            user,
            CreateMatchRequest {
                home_team_id: home,
                away_team_id: away,
                timestamp: timestamp.parse().unwrap(),
                home_score: 1,
                away_score: 0,
                athletes: vec![],
            },
        )
        .await
        .unwrap()
    }

    fn row(athlete_id: Uuid, match_id: Uuid, team_id: Uuid, goals: i32) -> MatchAthlete {
        MatchAthlete {
            athlete_id,
            match_id,
            team_id,
            position: "FW".into(),
            minutes_played: 90,
            goals,
            assists: 1,
            yellow_cards: 1,
            performance_rating: Some(78),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_stat_updates_career() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;
        let m = empty_match(&repo, owner.id, home.id, away.id, "2025-02-01T18:00:00Z").await;

        create_stat(&repo, owner.id, row(x.id, m.id, home.id, 2)).await.unwrap();

        let career = repo.get_career(x.id, home.id).await.unwrap().unwrap();
        assert_eq!(career.matches, 1);
        assert_eq!(career.goals, 2);
        assert_eq!(career.yellow_cards, 1);

        let err = create_stat(&repo, owner.id, row(x.id, m.id, home.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        let listed = list_stats(
            &repo,
            PerformanceFilter {
                match_id: Some(m.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].performance_rating, Some(78));
    }

    #[tokio::test]
    async fn test_create_stat_rules() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let stranger = test_support::user(&repo, "Stranger").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;
        let m = empty_match(&repo, owner.id, home.id, away.id, "2025-02-01T18:00:00Z").await;

        let mut bad = row(x.id, m.id, home.id, 0);
        bad.minutes_played = 121;
        let err = create_stat(&repo, owner.id, bad).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let err = create_stat(&repo, stranger.id, row(x.id, m.id, home.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::PermissionDenied { .. }));

        let err = create_stat(&repo, owner.id, row(x.id, Uuid::new_v4(), home.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        let err = create_stat(&repo, owner.id, row(x.id, m.id, away.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_player_stats_and_evolution_order() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;

        let late = empty_match(&repo, owner.id, home.id, away.id, "2025-03-01T18:00:00Z").await;
        let early = empty_match(&repo, owner.id, away.id, home.id, "2025-01-01T18:00:00Z").await;
        create_stat(&repo, owner.id, row(x.id, late.id, home.id, 3)).await.unwrap();
        create_stat(&repo, owner.id, row(x.id, early.id, home.id, 1)).await.unwrap();

        let newest_first = player_stats(&repo, x.id).await.unwrap();
        assert_eq!(newest_first[0].row.match_id, late.id);
        assert_eq!(newest_first[1].home_team_id, away.id);

        let series = player_evolution(&repo, x.id).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].match_id, early.id);
        assert_eq!(series[0].cumulative_goals, 1);
        assert_eq!(series[1].cumulative_goals, 4);
        assert_eq!(series[1].cumulative_assists, 2);
        assert_eq!(series[1].cumulative_yellow_cards, 2);

        assert!(player_evolution(&repo, Uuid::new_v4()).await.unwrap().is_empty());
    }
}

//! Aggregated figures for the dashboard, for one team or across all teams.

use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use super::{ratio, round_to};
use crate::api::{
    Athlete, AthleteCareer, DashboardSummary, MatchFilter, PerformanceFilter, PositionCount,
    TopPerformer,
};
use crate::db::repository::{FullRepository, RepositoryResult};

const TOP_PERFORMERS: usize = 10;
const RECENT_MATCHES: usize = 5;

pub async fn dashboard_summary<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: Option<Uuid>,
) -> RepositoryResult<DashboardSummary> {
    let careers = match team_id {
        Some(id) => repo.list_team_careers(id).await?,
        None => repo.list_careers().await?,
    };

    let total_players = match team_id {
        Some(_) => careers.len(),
        None => repo.list_athletes().await?.len(),
    };

    let total_matches = match team_id {
        Some(id) => repo
            .list_performances(PerformanceFilter {
                team_id: Some(id),
                ..Default::default()
            })
            .await?
            .iter()
            .map(|r| r.match_id)
            .collect::<HashSet<_>>()
            .len(),
        None => repo.list_matches(MatchFilter::default()).await?.len(),
    };

    let total_goals: i64 = careers.iter().map(|(_, c)| i64::from(c.goals)).sum();

    let mut recent_matches = repo
        .list_matches(MatchFilter {
            team_id,
            ..Default::default()
        })
        .await?;
    recent_matches.truncate(RECENT_MATCHES);

    Ok(DashboardSummary {
        total_players,
        total_matches,
        total_goals,
        overall_average: ratio(total_goals, total_matches as i64, 2),
        top_performers: top_performers(&careers, team_id.is_none()),
        recent_matches,
        position_distribution: position_distribution(&careers),
    })
}

#[derive(Default)]
struct Tally {
    name: String,
    positions: BTreeSet<String>,
    goals: i32,
    assists: i32,
    matches: i32,
}

/// Rank by goals. Across all teams the careers of one athlete are summed and
/// their positions joined.
fn top_performers(careers: &[(Athlete, AthleteCareer)], per_athlete: bool) -> Vec<TopPerformer> {
    let mut tallies: HashMap<(Uuid, Option<Uuid>), Tally> = HashMap::new();
    let mut keys: Vec<(Uuid, Option<Uuid>)> = Vec::new();

    for (athlete, career) in careers {
        let key = if per_athlete {
            (athlete.id, None)
        } else {
            (athlete.id, Some(career.team_id))
        };
        let tally = tallies.entry(key).or_insert_with(|| {
            keys.push(key);
            Tally {
                name: athlete.name.clone(),
                ..Default::default()
            }
        });
        tally.positions.insert(career.position.clone());
        tally.goals += career.goals;
        tally.assists += career.assists;
        tally.matches += career.matches;
    }

    let mut performers: Vec<TopPerformer> = keys
        .into_iter()
        .filter_map(|key| tallies.remove(&key).map(|t| (key.0, t)))
        .map(|(id, t)| TopPerformer {
            id,
            average: round_to(f64::from(t.goals) / f64::from(t.matches.max(1)), 2),
            position: t.positions.into_iter().collect::<Vec<_>>().join(", "),
            name: t.name,
            goals: t.goals,
            assists: t.assists,
            matches: t.matches,
        })
        .collect();

    // Stable: ties keep name order from the repository.
    performers.sort_by(|a, b| b.goals.cmp(&a.goals));
    performers.truncate(TOP_PERFORMERS);
    performers
}

fn position_distribution(careers: &[(Athlete, AthleteCareer)]) -> Vec<PositionCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, career) in careers {
        *counts.entry(career.position.as_str()).or_default() += 1;
    }
    let mut distribution: Vec<PositionCount> = counts
        .into_iter()
        .map(|(position, count)| PositionCount {
            position: position.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.position.cmp(&b.position)));
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CreateMatchRequest, PerformanceEntry, TransferAthleteRequest};
    use crate::db::repositories::LocalRepository;
    use crate::db::services::{athletes, matches, test_support};

    fn entry(athlete_id: Uuid, team_id: Uuid, goals: i32) -> PerformanceEntry {
        PerformanceEntry {
            athlete_id,
            team_id,
            position: "FW".into(),
            goals,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let repo = LocalRepository::new();
        let summary = dashboard_summary(&repo, None).await.unwrap();
        assert_eq!(summary.total_players, 0);
        assert_eq!(summary.total_matches, 0);
        assert_eq!(summary.overall_average, 0.0);
        assert!(summary.top_performers.is_empty());
    }

    #[tokio::test]
    async fn test_team_and_global_summary() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;
        let (y, _) = test_support::athlete(&repo, &home, "Yuri", 4, "DF").await;
        let (z, _) = test_support::athlete(&repo, &away, "Zeca", 8, "MF").await;

        for (goals_x, goals_z) in [(2, 1), (1, 0), (0, 0)] {
            matches::create_match(
                &repo,
                owner.id,
                CreateMatchRequest {
                    home_team_id: home.id,
                    away_team_id: away.id,
                    timestamp: chrono::Utc::now(),
                    home_score: goals_x,
                    away_score: goals_z,
                    athletes: vec![entry(x.id, home.id, goals_x), entry(z.id, away.id, goals_z)],
                },
            )
            .await
            .unwrap();
        }

        let team = dashboard_summary(&repo, Some(home.id)).await.unwrap();
        assert_eq!(team.total_players, 2);
        assert_eq!(team.total_matches, 3);
        assert_eq!(team.total_goals, 3);
        assert_eq!(team.overall_average, 1.0);
        assert_eq!(team.top_performers[0].id, x.id);
        assert_eq!(team.top_performers[0].average, 1.0);
        assert_eq!(team.top_performers[1].id, y.id);
        assert_eq!(team.top_performers[1].average, 0.0);
        assert_eq!(team.recent_matches.len(), 3);
        assert_eq!(team.position_distribution.len(), 2);

        let global = dashboard_summary(&repo, None).await.unwrap();
        assert_eq!(global.total_players, 3);
        assert_eq!(global.total_goals, 4);
        assert_eq!(global.overall_average, 1.33);
    }

    #[tokio::test]
    async fn test_global_top_performers_merge_careers() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;

        matches::create_match(
            &repo,
            owner.id,
            CreateMatchRequest {
                home_team_id: home.id,
                away_team_id: away.id,
                timestamp: chrono::Utc::now(),
                home_score: 3,
                away_score: 0,
                athletes: vec![entry(x.id, home.id, 3)],
            },
        )
        .await
        .unwrap();
        athletes::transfer_athlete(
            &repo,
            owner.id,
            x.id,
            home.id,
            TransferAthleteRequest {
                target_team_id: away.id,
                shirt_number: None,
                position: Some("MF".into()),
            },
        )
        .await
        .unwrap();

        let global = dashboard_summary(&repo, None).await.unwrap();
        assert_eq!(global.top_performers.len(), 1);
        assert_eq!(global.top_performers[0].goals, 3);
        assert_eq!(global.top_performers[0].position, "FW, MF");

        let distribution = &global.position_distribution;
        assert_eq!(distribution.len(), 2);
        assert!(distribution.iter().all(|p| p.count == 1));
    }
}

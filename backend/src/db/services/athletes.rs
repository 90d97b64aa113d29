//! Team athletes, transfers and athlete views.

use std::collections::HashMap;

use chrono::Utc;
use log::info;
use uuid::Uuid;

use super::matches::{summary_for, team_summaries, with_teams};
use super::{ratio, require_all_owned, require_owner, validate};
use crate::api::{
    AthleteCareer, AthleteDetail, AthletePerformance, AthleteSummary, AthleteTeamStats,
    AthleteTrainings, AthleteTrainingsQuery, AthleteWithCareer, AttendanceSummary, AttendedClass,
    AttendedTraining, CareerInfo, CareerStats, CareerTotals, CareerWithTeam,
    CreateTeamAthleteRequest, NewAthlete, NewCareer, PageQuery, PerformanceFilter,
    TeamAthleteFilter, TrainingFilter, TransferAthleteRequest, TransferRequest,
};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

const DEFAULT_PAGE_SIZE: usize = 20;

pub(crate) fn shirt_taken(shirt_number: i32, operation: &str) -> RepositoryError {
    RepositoryError::conflict_with_context(
        format!("Shirt number {} is already in use by another athlete", shirt_number),
        ErrorContext::new(operation).with_entity("career"),
    )
}

pub(crate) fn no_career(athlete_id: Uuid, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        "Athlete has no career at this team",
        ErrorContext::new(operation)
            .with_entity("career")
            .with_entity_id(athlete_id),
    )
}

/// Register a new athlete directly into a team.
pub async fn create_team_athlete<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    request: CreateTeamAthleteRequest,
) -> RepositoryResult<AthleteWithCareer> {
    validate::length("name", &request.name, 1, 255)?;
    validate::range("shirtNumber", request.shirt_number, 0, 99)?;
    validate::length("position", &request.position, 1, 255)?;
    require_owner(repo, user_id, team_id, "create_team_athlete").await?;

    if repo
        .find_open_career_by_shirt(team_id, request.shirt_number)
        .await?
        .is_some()
    {
        return Err(shirt_taken(request.shirt_number, "create_team_athlete"));
    }

    let (athlete, career) = repo
        .create_athlete_with_career(
            NewAthlete {
                name: request.name,
                birthdate: request.birthdate,
            },
            NewCareer {
                team_id,
                shirt_number: request.shirt_number,
                position: request.position,
            },
            Utc::now().date_naive(),
        )
        .await?;
    info!("Athlete {} joined team {}", athlete.id, team_id);
    Ok(AthleteWithCareer { athlete, career })
}

/// Careers of a team passing `filter`, in athlete name order.
pub async fn list_team_athletes<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: Uuid,
    filter: &TeamAthleteFilter,
) -> RepositoryResult<Vec<AthleteWithCareer>> {
    Ok(repo
        .list_team_careers(team_id)
        .await?
        .into_iter()
        .filter(|(athlete, career)| filter.matches(athlete, career))
        .map(|(athlete, career)| AthleteWithCareer { athlete, career })
        .collect())
}

/// Move an athlete from `source_team_id` to another team owned by the caller.
///
/// Checks, in order: ownership of both teams (403), distinct teams (400),
/// open source career (404), no career row at the target (409) and a free
/// shirt number when one is supplied (409).
pub async fn transfer_athlete<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    athlete_id: Uuid,
    source_team_id: Uuid,
    request: TransferAthleteRequest,
) -> RepositoryResult<AthleteCareer> {
    let target_team_id = request.target_team_id;
    require_all_owned(
        repo,
        user_id,
        &[source_team_id, target_team_id],
        "transfer_athlete",
    )
    .await?;

    if source_team_id == target_team_id {
        return Err(RepositoryError::bad_request_with_context(
            "Source and target teams must be different",
            ErrorContext::new("transfer_athlete").with_entity("team"),
        ));
    }

    let current = repo
        .find_open_career(athlete_id, source_team_id)
        .await?
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Athlete not found at the source team or already transferred",
                ErrorContext::new("transfer_athlete")
                    .with_entity("career")
                    .with_entity_id(athlete_id),
            )
        })?;

    if let Some(existing) = repo.get_career(athlete_id, target_team_id).await? {
        let message = if existing.is_open() {
            "Athlete already has an active career at the target team"
        } else {
            "Athlete already played for the target team"
        };
        return Err(RepositoryError::conflict_with_context(
            message,
            ErrorContext::new("transfer_athlete")
                .with_entity("career")
                .with_entity_id(athlete_id),
        ));
    }

    if let Some(shirt) = request.shirt_number {
        validate::range("shirtNumber", shirt, 0, 99)?;
        if repo
            .find_open_career_by_shirt(target_team_id, shirt)
            .await?
            .is_some()
        {
            return Err(shirt_taken(shirt, "transfer_athlete"));
        }
    }
    if let Some(position) = &request.position {
        validate::length("position", position, 1, 255)?;
    }

    let career = repo
        .transfer_athlete(TransferRequest {
            athlete_id,
            source_team_id,
            target_team_id,
            shirt_number: request.shirt_number.unwrap_or(current.shirt_number),
            position: request.position.unwrap_or(current.position),
            finished_at: Utc::now().date_naive(),
        })
        .await?;
    info!(
        "Transferred athlete {} from {} to {}",
        athlete_id, source_team_id, target_team_id
    );
    Ok(career)
}

/// Career and per-match ratios of an athlete at one team.
pub async fn athlete_team_stats<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: Uuid,
    athlete_id: Uuid,
) -> RepositoryResult<AthleteTeamStats> {
    let athlete = repo.get_athlete(athlete_id).await?;
    let career = repo
        .get_career(athlete_id, team_id)
        .await?
        .ok_or_else(|| no_career(athlete_id, "athlete_team_stats"))?;

    let matches = i64::from(career.matches);
    Ok(AthleteTeamStats {
        athlete: AthleteSummary::from(&athlete),
        career: CareerInfo {
            shirt_number: career.shirt_number,
            position: career.position.clone(),
            started_at: career.started_at,
            finished_at: career.finished_at,
            is_active: career.is_open(),
        },
        stats: CareerStats {
            matches: career.matches,
            goals: career.goals,
            assists: career.assists,
            yellow_cards: career.yellow_cards,
            red_cards: career.red_cards,
            goals_per_match: ratio(i64::from(career.goals), matches, 2),
            assists_per_match: ratio(i64::from(career.assists), matches, 2),
        },
    })
}

/// Training participation of an athlete at one team.
///
/// Pagination applies to class participation rows ordered by training date,
/// latest first. Rows are then grouped by training and summarized.
pub async fn athlete_team_trainings<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: Uuid,
    athlete_id: Uuid,
    query: AthleteTrainingsQuery,
) -> RepositoryResult<AthleteTrainings> {
    if repo.get_career(athlete_id, team_id).await?.is_none() {
        return Err(no_career(athlete_id, "athlete_team_trainings"));
    }

    let trainings = repo
        .list_trainings(
            team_id,
            TrainingFilter {
                from: query.from,
                to: query.to,
                concluded: None,
            },
        )
        .await?;
    let training_ids: Vec<Uuid> = trainings.iter().map(|t| t.id).collect();
    let classes = repo.list_classes(&training_ids).await?;
    let class_ids: Vec<Uuid> = classes.iter().map(|c| c.id).collect();
    let attendance: HashMap<Uuid, _> = repo
        .list_class_athletes(&class_ids)
        .await?
        .into_iter()
        .filter(|row| row.athlete_id == athlete_id)
        .map(|row| (row.training_class_id, row))
        .collect();

    // Trainings arrive latest first and classes oldest first.
    let mut rows = Vec::new();
    for training in &trainings {
        for class in classes.iter().filter(|c| c.training_id == training.id) {
            if let Some(row) = attendance.get(&class.id) {
                rows.push((training, class, row));
            }
        }
    }

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let page: Vec<_> = rows.into_iter().skip(offset).take(limit).collect();

    let mut grouped: Vec<AttendedTraining> = Vec::new();
    for (training, class, row) in &page {
        let entry = AttendedClass {
            id: class.id,
            title: class.title.clone(),
            description: class.description.clone(),
            concluded: class.concluded,
            present: row.present,
            notes: row.notes.clone(),
            stats: row.stats.clone(),
        };
        match grouped.last_mut() {
            Some(last) if last.id == training.id => last.classes.push(entry),
            _ => grouped.push(AttendedTraining {
                id: training.id,
                date: training.date,
                concluded: training.concluded,
                concluded_at: training.concluded_at,
                classes: vec![entry],
            }),
        }
    }

    let total_classes = page.len();
    let attended_classes = page.iter().filter(|(_, _, row)| row.present).count();
    let summary = AttendanceSummary {
        total_trainings: grouped.len(),
        total_classes,
        attended_classes,
        missed_classes: total_classes - attended_classes,
        attendance_rate: ratio(attended_classes as i64 * 100, total_classes as i64, 1),
    };

    Ok(AthleteTrainings {
        trainings: grouped,
        summary,
    })
}

/// Full history of an athlete across teams.
///
/// `limit` must be within 1..=100 and `offset` non-negative.
pub async fn athlete_detail<R: FullRepository + ?Sized>(
    repo: &R,
    athlete_id: Uuid,
    page: PageQuery,
) -> RepositoryResult<AthleteDetail> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE as i64);
    let offset = page.offset.unwrap_or(0);
    if !(1..=100).contains(&limit) {
        return Err(RepositoryError::validation_with_context(
            "limit must be between 1 and 100",
            ErrorContext::new("athlete_detail").with_entity("limit"),
        ));
    }
    if offset < 0 {
        return Err(RepositoryError::validation_with_context(
            "offset must be greater than or equal to 0",
            ErrorContext::new("athlete_detail").with_entity("offset"),
        ));
    }

    let athlete = repo.get_athlete(athlete_id).await?;
    let mut careers = repo.list_athlete_careers(athlete_id).await?;
    careers.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    let totals = careers.iter().fold(CareerTotals::default(), |acc, c| CareerTotals {
        matches: acc.matches + c.matches,
        goals: acc.goals + c.goals,
        assists: acc.assists + c.assists,
        yellow_cards: acc.yellow_cards + c.yellow_cards,
        red_cards: acc.red_cards + c.red_cards,
    });

    let rows = repo
        .list_performances(PerformanceFilter {
            athlete_id: Some(athlete_id),
            ..Default::default()
        })
        .await?;
    let match_ids: Vec<Uuid> = rows.iter().map(|r| r.match_id).collect();
    let matches: HashMap<Uuid, _> = with_teams(repo, repo.get_matches(&match_ids).await?)
        .await?
        .into_iter()
        .map(|m| (m.record.id, m))
        .collect();

    let mut team_ids: Vec<Uuid> = careers.iter().map(|c| c.team_id).collect();
    team_ids.extend(rows.iter().map(|r| r.team_id));
    team_ids.sort();
    team_ids.dedup();
    let teams = team_summaries(repo.get_teams(&team_ids).await?);

    let mut performances = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(played) = matches.get(&row.match_id).cloned() else {
            continue;
        };
        performances.push(AthletePerformance {
            team: summary_for(&teams, row.team_id)?,
            played,
            row,
        });
    }
    performances.sort_by(|a, b| b.played.record.timestamp.cmp(&a.played.record.timestamp));
    let performances = performances
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    let teams = careers
        .into_iter()
        .map(|career| {
            Ok(CareerWithTeam {
                team: summary_for(&teams, career.team_id)?,
                career,
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()?;

    Ok(AthleteDetail {
        athlete,
        teams,
        match_performances: performances,
        career_totals: totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::api::{ClassAthlete, CreateMatchRequest, NewTrainingClass, PerformanceEntry};
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{AthleteRepository, TrainingRepository};
    use crate::db::services::{matches, test_support};

    fn new_athlete(name: &str, shirt_number: i32) -> CreateTeamAthleteRequest {
        CreateTeamAthleteRequest {
            name: name.into(),
            birthdate: NaiveDate::from_ymd_opt(2001, 2, 3).unwrap(),
            shirt_number,
            position: "MF".into(),
        }
    }

    #[tokio::test]
    async fn test_second_athlete_with_same_shirt_conflicts() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let team = test_support::team(&repo, &owner, "Home FC").await;

        let created = create_team_athlete(&repo, owner.id, team.id, new_athlete("Ana", 10))
            .await
            .unwrap();
        assert_eq!(created.career.shirt_number, 10);
        assert!(created.career.is_open());

        let err = create_team_athlete(&repo, owner.id, team.id, new_athlete("Bia", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_team_athlete_requires_owner() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let stranger = test_support::user(&repo, "Stranger").await;
        let team = test_support::team(&repo, &owner, "Home FC").await;

        let err = create_team_athlete(&repo, stranger.id, team.id, new_athlete("Ana", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_transfer_closes_source_and_opens_target() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let source = test_support::team(&repo, &owner, "Source FC").await;
        let target = test_support::team(&repo, &owner, "Target FC").await;
        let (x, _) = test_support::athlete(&repo, &source, "Xavier", 7, "FW").await;

        let career = transfer_athlete(
            &repo,
            owner.id,
            x.id,
            source.id,
            TransferAthleteRequest {
                target_team_id: target.id,
                shirt_number: None,
                position: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(career.shirt_number, 7);
        assert_eq!(career.position, "FW");
        assert_eq!((career.matches, career.goals), (0, 0));
        assert!(career.is_open());

        let closed = repo.get_career(x.id, source.id).await.unwrap().unwrap();
        assert!(closed.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_transfer_with_shirt_override() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let source = test_support::team(&repo, &owner, "Source FC").await;
        let target = test_support::team(&repo, &owner, "Target FC").await;
        let (x, _) = test_support::athlete(&repo, &source, "Xavier", 7, "FW").await;
        test_support::athlete(&repo, &target, "Taken", 11, "GK").await;

        let request = |shirt| TransferAthleteRequest {
            target_team_id: target.id,
            shirt_number: Some(shirt),
            position: Some("MF".into()),
        };

        let err = transfer_athlete(&repo, owner.id, x.id, source.id, request(11))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        let career = transfer_athlete(&repo, owner.id, x.id, source.id, request(21))
            .await
            .unwrap();
        assert_eq!((career.shirt_number, career.position.as_str()), (21, "MF"));
    }

    #[tokio::test]
    async fn test_transfer_rule_order() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let stranger = test_support::user(&repo, "Stranger").await;
        let source = test_support::team(&repo, &owner, "Source FC").await;
        let foreign = test_support::team(&repo, &stranger, "Foreign FC").await;
        let target = test_support::team(&repo, &owner, "Target FC").await;
        let (x, _) = test_support::athlete(&repo, &source, "Xavier", 7, "FW").await;

        let to = |team: Uuid| TransferAthleteRequest {
            target_team_id: team,
            shirt_number: None,
            position: None,
        };

        let err = transfer_athlete(&repo, owner.id, x.id, source.id, to(foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::PermissionDenied { .. }));

        let err = transfer_athlete(&repo, owner.id, x.id, source.id, to(source.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::BadRequest { .. }));

        let err = transfer_athlete(&repo, owner.id, Uuid::new_v4(), source.id, to(target.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        transfer_athlete(&repo, owner.id, x.id, source.id, to(target.id))
            .await
            .unwrap();
        // Back to a team the athlete already played for.
        let err = transfer_athlete(&repo, owner.id, x.id, target.id, to(source.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let team = test_support::team(&repo, &owner, "Home FC").await;
        let other = test_support::team(&repo, &owner, "Other FC").await;
        test_support::athlete(&repo, &team, "Ana Lima", 1, "GK").await;
        let (bia, _) = test_support::athlete(&repo, &team, "Bia Souza", 2, "DF").await;
        transfer_athlete(
            &repo,
            owner.id,
            bia.id,
            team.id,
            TransferAthleteRequest {
                target_team_id: other.id,
                shirt_number: None,
                position: None,
            },
        )
        .await
        .unwrap();

        let all = list_team_athletes(&repo, team.id, &TeamAthleteFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let current = TeamAthleteFilter {
            current: true,
            ..Default::default()
        };
        let open = list_team_athletes(&repo, team.id, &current).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].athlete.name, "Ana Lima");

        let by_name = TeamAthleteFilter {
            name: Some("souza".into()),
            ..Default::default()
        };
        assert_eq!(list_team_athletes(&repo, team.id, &by_name).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_team_stats_ratios() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;

        let empty = athlete_team_stats(&repo, home.id, x.id).await.unwrap();
        assert_eq!(empty.stats.goals_per_match, 0.0);

        for goals in [1, 1, 0] {
            matches::create_match(
                &repo,
                owner.id,
                CreateMatchRequest {
                    home_team_id: home.id,
                    away_team_id: away.id,
                    timestamp: Utc::now(),
                    home_score: goals,
                    away_score: 0,
                    athletes: vec![PerformanceEntry {
                        athlete_id: x.id,
                        team_id: home.id,
                        position: "FW".into(),
                        goals,
                        assists: 0,
                        yellow_cards: 0,
                        red_cards: 0,
                    }],
                },
            )
            .await
            .unwrap();
        }

        let stats = athlete_team_stats(&repo, home.id, x.id).await.unwrap();
        assert_eq!(stats.stats.matches, 3);
        assert_eq!(stats.stats.goals_per_match, 0.67);
        assert!(stats.career.is_active);

        let err = athlete_team_stats(&repo, away.id, x.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_trainings_grouped_with_summary() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let team = test_support::team(&repo, &owner, "Home FC").await;
        let (x, _) = test_support::athlete(&repo, &team, "Xavier", 9, "FW").await;

        for (day, present) in [(1, true), (2, false)] {
            let training = repo
                .create_training(team.id, NaiveDate::from_ymd_opt(2025, 3, day).unwrap())
                .await
                .unwrap();
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
                present,
                notes: None,
                stats: Some(json!({"shots": day})),
            })
            .await
            .unwrap();
        }

        let result = athlete_team_trainings(&repo, team.id, x.id, AthleteTrainingsQuery::default())
            .await
            .unwrap();
        assert_eq!(result.trainings.len(), 2);
        assert_eq!(result.trainings[0].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(result.summary.total_classes, 2);
        assert_eq!(result.summary.attended_classes, 1);
        assert_eq!(result.summary.missed_classes, 1);
        assert_eq!(result.summary.attendance_rate, 50.0);

        let paged = athlete_team_trainings(
            &repo,
            team.id,
            x.id,
            AthleteTrainingsQuery {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(paged.trainings.len(), 1);
        assert_eq!(paged.summary.attendance_rate, 100.0);
    }

    #[tokio::test]
    async fn test_detail_totals_and_pagination() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        let (x, _) = test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;

        for day in 1..=3 {
            matches::create_match(
                &repo,
                owner.id,
                CreateMatchRequest {
                    home_team_id: home.id,
                    away_team_id: away.id,
                    timestamp: format!("2025-02-0{}T18:00:00Z", day).parse().unwrap(),
                    home_score: 1,
                    away_score: 0,
                    athletes: vec![PerformanceEntry {
                        athlete_id: x.id,
                        team_id: home.id,
                        position: "FW".into(),
                        goals: 1,
                        assists: 0,
                        yellow_cards: 0,
                        red_cards: 0,
                    }],
                },
            )
            .await
            .unwrap();
        }

        let detail = athlete_detail(
            &repo,
            x.id,
            PageQuery {
                limit: Some(2),
                offset: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(detail.career_totals.goals, 3);
        assert_eq!(detail.career_totals.matches, 3);
        assert_eq!(detail.match_performances.len(), 2);
        assert_eq!(
            detail.match_performances[0].played.record.timestamp.to_rfc3339(),
            "2025-02-03T18:00:00+00:00"
        );
        assert_eq!(detail.teams[0].team.id, home.id);

        let err = athlete_detail(
            &repo,
            x.id,
            PageQuery {
                limit: Some(0),
                offset: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let err = athlete_detail(&repo, Uuid::new_v4(), PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}

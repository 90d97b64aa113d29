//! Team management.

use std::collections::HashMap;

use log::info;
use uuid::Uuid;

use super::matches::with_teams;
use super::{require_owner, validate};
use crate::api::{
    MatchFilter, NewTeam, Team, TeamDetail, TeamPatch, TeamWithOwner, TrainingFilter, User,
};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

fn validate_full_name(value: &str) -> RepositoryResult<()> {
    validate::length("fullName", value, 3, 255)
}

fn validate_short_name(value: &str) -> RepositoryResult<()> {
    validate::length("shortName", value, 2, 4)
}

fn validate_optional_fields(
    icon_url: Option<&str>,
    main_color_hex: Option<&str>,
    secondary_color_hex: Option<&str>,
) -> RepositoryResult<()> {
    if let Some(url) = icon_url {
        validate::http_url("iconUrl", url)?;
    }
    if let Some(hex) = main_color_hex {
        validate::hex_colour("mainColorHex", hex)?;
    }
    if let Some(hex) = secondary_color_hex {
        validate::hex_colour("secondaryColorHex", hex)?;
    }
    Ok(())
}

pub async fn create_team<R: FullRepository + ?Sized>(
    repo: &R,
    owner_id: Uuid,
    team: NewTeam,
) -> RepositoryResult<Team> {
    validate_full_name(&team.full_name)?;
    validate_short_name(&team.short_name)?;
    validate_optional_fields(
        team.icon_url.as_deref(),
        team.main_color_hex.as_deref(),
        team.secondary_color_hex.as_deref(),
    )?;

    let team = repo.create_team(owner_id, team).await?;
    info!("User {} created team {} ({})", owner_id, team.id, team.short_name);
    Ok(team)
}

/// Teams owned by the caller, by full name.
pub async fn own_teams<R: FullRepository + ?Sized>(
    repo: &R,
    owner_id: Uuid,
) -> RepositoryResult<Vec<Team>> {
    repo.list_teams_by_owner(owner_id).await
}

/// Every team with its owner, by full name.
pub async fn all_teams<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<TeamWithOwner>> {
    let teams = repo.list_teams().await?;
    let mut owner_ids: Vec<Uuid> = teams.iter().map(|t| t.created_by).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners: HashMap<Uuid, User> = repo
        .get_users(&owner_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    teams
        .into_iter()
        .map(|team| {
            let owner = owners
                .get(&team.created_by)
                .cloned()
                .ok_or_else(|| missing_owner(&team))?;
            Ok(TeamWithOwner { team, owner })
        })
        .collect()
}

fn missing_owner(team: &Team) -> RepositoryError {
    RepositoryError::internal_with_context(
        "Team owner is missing",
        ErrorContext::default()
            .with_entity("user")
            .with_entity_id(team.created_by),
    )
}

/// A team with its owner, careers, matches and trainings.
pub async fn team_detail<R: FullRepository + ?Sized>(
    repo: &R,
    team_id: Uuid,
) -> RepositoryResult<TeamDetail> {
    let team = repo.get_team(team_id).await?;
    let owner = repo.get_user(team.created_by).await?;
    let athletes = repo
        .list_team_careers(team_id)
        .await?
        .into_iter()
        .map(|(_, career)| career)
        .collect();

    let matches = repo
        .list_matches(MatchFilter {
            team_id: Some(team_id),
            ..Default::default()
        })
        .await?;
    let (home, away): (Vec<_>, Vec<_>) = with_teams(repo, matches)
        .await?
        .into_iter()
        .partition(|m| m.record.home_team_id == team_id);

    let trainings = repo
        .list_trainings(team_id, TrainingFilter::default())
        .await?;

    Ok(TeamDetail {
        team,
        owner,
        athletes,
        home_matches: home,
        away_matches: away,
        trainings,
    })
}

/// Partial update by the team owner.
pub async fn update_team<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    patch: TeamPatch,
) -> RepositoryResult<Team> {
    repo.get_team(team_id).await?;
    require_owner(repo, user_id, team_id, "update_team").await?;

    if let Some(name) = &patch.full_name {
        validate_full_name(name)?;
    }
    if let Some(name) = &patch.short_name {
        validate_short_name(name)?;
    }
    validate_optional_fields(
        patch.icon_url.as_deref(),
        patch.main_color_hex.as_deref(),
        patch.secondary_color_hex.as_deref(),
    )?;

    repo.update_team(team_id, patch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CreateMatchRequest;
    use crate::db::repositories::LocalRepository;
    use crate::db::services::{matches, test_support};

    fn new_team(full_name: &str, short_name: &str) -> NewTeam {
        NewTeam {
            full_name: full_name.into(),
            short_name: short_name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_team_validation() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;

        let err = create_team(&repo, owner.id, new_team("FC", "FC")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let err = create_team(&repo, owner.id, new_team("Grêmio", "GREMIO"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));

        let mut coloured = new_team("Grêmio", "GRE");
        coloured.main_color_hex = Some("#0d80bf".into());
        assert!(create_team(&repo, owner.id, coloured).await.is_err());

        let mut valid = new_team("Grêmio", "GRE");
        valid.main_color_hex = Some("0d80bf".into());
        valid.icon_url = Some("https://example.com/gremio.png".into());
        let team = create_team(&repo, owner.id, valid).await.unwrap();
        assert_eq!(team.created_by, owner.id);
    }

    #[tokio::test]
    async fn test_own_and_all_teams_sorted() {
        let repo = LocalRepository::new();
        let ana = test_support::user(&repo, "Ana").await;
        let bob = test_support::user(&repo, "Bob").await;
        create_team(&repo, ana.id, new_team("Zebra FC", "ZEB")).await.unwrap();
        create_team(&repo, ana.id, new_team("Alpha FC", "ALP")).await.unwrap();
        create_team(&repo, bob.id, new_team("Mid FC", "MID")).await.unwrap();

        let own = own_teams(&repo, ana.id).await.unwrap();
        let names: Vec<_> = own.iter().map(|t| t.full_name.as_str()).collect();
        assert_eq!(names, ["Alpha FC", "Zebra FC"]);

        let all = all_teams(&repo).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].team.full_name, "Mid FC");
        assert_eq!(all[1].owner.id, bob.id);
    }

    #[tokio::test]
    async fn test_update_team_owner_only() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let other = test_support::user(&repo, "Other").await;
        let team = create_team(&repo, owner.id, new_team("Alpha FC", "ALP")).await.unwrap();

        let patch = TeamPatch {
            short_name: Some("ALF".into()),
            ..Default::default()
        };
        let err = update_team(&repo, other.id, team.id, patch.clone()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::PermissionDenied { .. }));

        let err = update_team(&repo, owner.id, Uuid::new_v4(), patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        let updated = update_team(&repo, owner.id, team.id, patch).await.unwrap();
        assert_eq!(updated.short_name, "ALF");
        assert_eq!(updated.full_name, "Alpha FC");
    }

    #[tokio::test]
    async fn test_team_detail_splits_home_and_away() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let home = test_support::team(&repo, &owner, "Home FC").await;
        let away = test_support::team(&repo, &owner, "Away FC").await;
        test_support::athlete(&repo, &home, "Xavier", 9, "FW").await;

        for (h, a) in [(home.id, away.id), (away.id, home.id), (home.id, away.id)] {
            matches::create_match(
                &repo,
                owner.id,
                CreateMatchRequest {
                    home_team_id: h,
                    away_team_id: a,
                    timestamp: chrono::Utc::now(),
                    home_score: 0,
                    away_score: 0,
                    athletes: vec![],
                },
            )
            .await
            .unwrap();
        }

        let detail = team_detail(&repo, home.id).await.unwrap();
        assert_eq!(detail.owner.id, owner.id);
        assert_eq!(detail.athletes.len(), 1);
        assert_eq!(detail.home_matches.len(), 2);
        assert_eq!(detail.away_matches.len(), 1);
        assert_eq!(detail.away_matches[0].home_team.id, away.id);

        let err = team_detail(&repo, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}

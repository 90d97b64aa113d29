//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. They
//! validate input, enforce team ownership and compose the response shapes
//! the API returns. Every service is generic over the repository so it runs
//! unchanged against the local and the Postgres backend:
//!
//! ```ignore
//! let detail = services::matches::match_detail(repo.as_ref(), match_id).await?;
//! ```
//!
//! Multi-step writes are delegated to the transactional repository methods;
//! services only perform the checks that decide which error the caller sees.

pub mod athletes;
pub mod dashboard;
pub mod matches;
pub mod players;
pub mod seed;
pub mod stats;
pub mod teams;
pub mod trainings;
pub mod validate;

use uuid::Uuid;

use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};

/// Basic health check for the configured repository.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Fail with `PermissionDenied` unless `user_id` owns `team_id`.
pub(crate) async fn require_owner<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_id: Uuid,
    operation: &str,
) -> RepositoryResult<()> {
    let owned = repo.owned_team_ids(user_id, &[team_id]).await?;
    if owned.is_empty() {
        return Err(RepositoryError::permission_denied_with_context(
            "You do not have permission to manage this team",
            ErrorContext::new(operation)
                .with_entity("team")
                .with_entity_id(team_id),
        ));
    }
    Ok(())
}

/// Fail with `PermissionDenied` unless `user_id` owns every team in `team_ids`.
pub(crate) async fn require_all_owned<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_ids: &[Uuid],
    operation: &str,
) -> RepositoryResult<()> {
    let owned = repo.owned_team_ids(user_id, team_ids).await?;
    if team_ids.iter().any(|id| !owned.contains(id)) {
        return Err(RepositoryError::permission_denied_with_context(
            "You do not have permission to manage these teams",
            ErrorContext::new(operation).with_entity("team"),
        ));
    }
    Ok(())
}

/// Fail with `PermissionDenied` unless `user_id` owns at least one of `team_ids`.
pub(crate) async fn require_any_owner<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
    team_ids: &[Uuid],
    operation: &str,
) -> RepositoryResult<()> {
    if repo.owned_team_ids(user_id, team_ids).await?.is_empty() {
        return Err(RepositoryError::permission_denied_with_context(
            "You must own one of the teams of this match",
            ErrorContext::new(operation).with_entity("match"),
        ));
    }
    Ok(())
}

/// `numerator / denominator` rounded to `decimals`, or 0 for an empty denominator.
pub(crate) fn ratio(numerator: i64, denominator: i64, decimals: i32) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    round_to(numerator as f64 / denominator as f64, decimals)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use crate::api::{Athlete, AthleteCareer, NewAthlete, NewCareer, NewTeam, NewUser, Team, User};
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{AthleteRepository, TeamRepository};

    pub async fn user(repo: &LocalRepository, name: &str) -> User {
        repo.create_user(NewUser {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "hash".into(),
        })
        .await
        .unwrap()
    }

    pub async fn team(repo: &LocalRepository, owner: &User, full_name: &str) -> Team {
        repo.create_team(
            owner.id,
            NewTeam {
                full_name: full_name.into(),
                short_name: full_name.chars().take(3).collect::<String>().to_uppercase(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    pub async fn athlete(
        repo: &LocalRepository,
        team: &Team,
        name: &str,
        shirt_number: i32,
        position: &str,
    ) -> (Athlete, AthleteCareer) {
        repo.create_athlete_with_career(
            NewAthlete {
                name: name.into(),
                birthdate: NaiveDate::from_ymd_opt(2000, 5, 17).unwrap(),
            },
            NewCareer {
                team_id: team.id,
                shirt_number,
                position: position.into(),
            },
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .await
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;

    #[test]
    fn test_ratio_rounds_and_guards_zero() {
        assert_eq!(ratio(2, 3, 2), 0.67);
        assert_eq!(ratio(5, 0, 2), 0.0);
        assert_eq!(ratio(1, 3, 1), 0.3);
    }

    #[tokio::test]
    async fn test_ownership_helpers() {
        let repo = LocalRepository::new();
        let owner = test_support::user(&repo, "Owner").await;
        let other = test_support::user(&repo, "Other").await;
        let mine = test_support::team(&repo, &owner, "Mine FC").await;
        let theirs = test_support::team(&repo, &other, "Theirs FC").await;

        assert!(require_owner(&repo, owner.id, mine.id, "t").await.is_ok());
        let err = require_owner(&repo, owner.id, theirs.id, "t").await.unwrap_err();
        assert!(matches!(err, RepositoryError::PermissionDenied { .. }));

        assert!(require_any_owner(&repo, owner.id, &[mine.id, theirs.id], "t")
            .await
            .is_ok());
        assert!(require_all_owned(&repo, owner.id, &[mine.id, theirs.id], "t")
            .await
            .is_err());
    }
}

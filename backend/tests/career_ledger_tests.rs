//! Career counters must always equal the sums of the recorded performances,
//! whatever sequence of match creations and replacements produced them.
//!
//! The test keeps its own model of every career in `i64`. A match adds one
//! to `matches` for each distinct `(athlete, team)` pair it records; a
//! replacement moves goals, assists and cards but never `matches`. Any write
//! that would push a counter past `i32::MAX` must fail with a validation
//! error and leave everything as it was.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use squad_backend::api::{
    CreateMatchRequest, NewAthlete, NewCareer, NewTeam, NewUser, PerformanceEntry,
    PerformanceFilter, UpdateMatchRequest,
};
use squad_backend::db::repository::{
    AthleteRepository, MatchRepository, RepositoryError, TeamRepository,
};
use squad_backend::db::services::matches;
use squad_backend::db::LocalRepository;

const SQUAD: usize = 3;

/// Squad slot, goals, assists, yellow cards, red cards.
type Entry = (usize, i32, i32, i32, i32);

/// Home and away entries of one match, plus an optional replacement of both.
type Round = (Vec<Entry>, Vec<Entry>, Option<(Vec<Entry>, Vec<Entry>)>);

type Pair = (Uuid, Uuid);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    matches: i64,
    goals: i64,
    assists: i64,
    yellow_cards: i64,
    red_cards: i64,
}

impl Tally {
    fn plus(self, other: Tally) -> Tally {
        Tally {
            matches: self.matches + other.matches,
            goals: self.goals + other.goals,
            assists: self.assists + other.assists,
            yellow_cards: self.yellow_cards + other.yellow_cards,
            red_cards: self.red_cards + other.red_cards,
        }
    }

    fn minus(self, other: Tally) -> Tally {
        Tally {
            matches: self.matches - other.matches,
            goals: self.goals - other.goals,
            assists: self.assists - other.assists,
            yellow_cards: self.yellow_cards - other.yellow_cards,
            red_cards: self.red_cards - other.red_cards,
        }
    }

    fn fits(&self) -> bool {
        [
            self.matches,
            self.goals,
            self.assists,
            self.yellow_cards,
            self.red_cards,
        ]
        .iter()
        .all(|v| *v <= i64::from(i32::MAX))
    }
}

struct Club {
    team: Uuid,
    squad: Vec<Uuid>,
}

impl Club {
    fn lineup(&self, entries: &[Entry]) -> Vec<PerformanceEntry> {
        entries
            .iter()
            .map(|(slot, goals, assists, yellow, red)| PerformanceEntry {
                athlete_id: self.squad[*slot],
                team_id: self.team,
                position: "FW".into(),
                goals: *goals,
                assists: *assists,
                yellow_cards: *yellow,
                red_cards: *red,
            })
            .collect()
    }
}

/// Stats per pair after duplicate entries are merged; `matches` stays 0.
fn merged(entries: &[PerformanceEntry]) -> HashMap<Pair, Tally> {
    let mut rows: HashMap<Pair, Tally> = HashMap::new();
    for e in entries {
        let row = rows.entry((e.athlete_id, e.team_id)).or_default();
        *row = row.plus(Tally {
            matches: 0,
            goals: e.goals.into(),
            assists: e.assists.into(),
            yellow_cards: e.yellow_cards.into(),
            red_cards: e.red_cards.into(),
        });
    }
    rows
}

async fn run(rounds: Vec<Round>) -> Result<(), TestCaseError> {
    let repo = LocalRepository::new();
    let owner = repo
        .create_user(NewUser {
            name: "Owner".into(),
            email: "owner@example.com".into(),
            password_hash: "hash".into(),
        })
        .await
        .unwrap();

    let mut clubs = Vec::new();
    let mut careers: HashMap<Pair, Tally> = HashMap::new();
    for (t, name) in ["Home FC", "Away FC"].iter().enumerate() {
        let team = repo
            .create_team(
                owner.id,
                NewTeam {
                    full_name: name.to_string(),
                    short_name: name[..3].to_uppercase(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let mut squad = Vec::new();
        for slot in 0..SQUAD {
            let (athlete, _) = repo
                .create_athlete_with_career(
                    NewAthlete {
                        name: format!("Player {}-{}", t, slot),
                        birthdate: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                    },
                    NewCareer {
                        team_id: team.id,
                        shirt_number: slot as i32 + 1,
                        position: "FW".into(),
                    },
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                )
                .await
                .unwrap();
            careers.insert((athlete.id, team.id), Tally::default());
            squad.push(athlete.id);
        }
        clubs.push(Club {
            team: team.id,
            squad,
        });
    }

    let mut stored: HashMap<Uuid, HashMap<Pair, Tally>> = HashMap::new();
    for (day, (home, away, replacement)) in rounds.into_iter().enumerate() {
        let mut athletes = clubs[0].lineup(&home);
        athletes.extend(clubs[1].lineup(&away));
        let rows = merged(&athletes);

        let mut next = careers.clone();
        for (pair, row) in &rows {
            let career = next.entry(*pair).or_default();
            *career = career.plus(*row).plus(Tally {
                matches: 1,
                ..Default::default()
            });
        }
        let fits = rows.values().all(Tally::fits) && next.values().all(Tally::fits);

        let created = matches::create_match(
            &repo,
            owner.id,
            CreateMatchRequest {
                home_team_id: clubs[0].team,
                away_team_id: clubs[1].team,
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
                    + chrono::Duration::days(day as i64),
                home_score: 0,
                away_score: 0,
                athletes,
            },
        )
        .await;

        let record = match created {
            Ok(record) => {
                prop_assert!(fits, "overflowing match was accepted");
                careers = next;
                stored.insert(record.id, rows);
                record
            }
            Err(err) => {
                prop_assert!(!fits, "valid match rejected: {}", err);
                prop_assert!(
                    matches!(err, RepositoryError::ValidationError { .. }),
                    "unexpected error: {}",
                    err
                );
                continue;
            }
        };

        let Some((home, away)) = replacement else {
            continue;
        };
        let mut athletes = clubs[0].lineup(&home);
        athletes.extend(clubs[1].lineup(&away));
        let new_rows = merged(&athletes);
        let old_rows = stored.get(&record.id).cloned().unwrap_or_default();

        let mut next = careers.clone();
        let touched: HashSet<Pair> = old_rows.keys().chain(new_rows.keys()).copied().collect();
        for pair in touched {
            let career = next.entry(pair).or_default();
            *career = career
                .minus(old_rows.get(&pair).copied().unwrap_or_default())
                .plus(new_rows.get(&pair).copied().unwrap_or_default());
        }
        let fits = new_rows.values().all(Tally::fits) && next.values().all(Tally::fits);

        let updated = matches::update_match(
            &repo,
            owner.id,
            record.id,
            UpdateMatchRequest {
                athletes: Some(athletes),
                ..Default::default()
            },
        )
        .await;
        match updated {
            Ok(_) => {
                prop_assert!(fits, "overflowing replacement was accepted");
                careers = next;
                stored.insert(record.id, new_rows);
            }
            Err(err) => {
                prop_assert!(!fits, "valid replacement rejected: {}", err);
                prop_assert!(matches!(err, RepositoryError::ValidationError { .. }), "expected ValidationError, got: {}", err);
            }
        }
    }

    prop_assert_eq!(repo.match_count(), stored.len());
    for (_, career) in repo.list_careers().await.unwrap() {
        let expected = careers[&(career.athlete_id, career.team_id)];
        let actual = Tally {
            matches: career.matches.into(),
            goals: career.goals.into(),
            assists: career.assists.into(),
            yellow_cards: career.yellow_cards.into(),
            red_cards: career.red_cards.into(),
        };
        prop_assert_eq!(actual, expected);

        let rows = repo
            .list_performances(PerformanceFilter {
                athlete_id: Some(career.athlete_id),
                team_id: Some(career.team_id),
                ..Default::default()
            })
            .await
            .unwrap();
        let goals: i64 = rows.iter().map(|r| i64::from(r.goals)).sum();
        let red: i64 = rows.iter().map(|r| i64::from(r.red_cards)).sum();
        prop_assert_eq!(actual.goals, goals);
        prop_assert_eq!(actual.red_cards, red);
    }
    Ok(())
}

fn entry() -> impl Strategy<Value = Entry> {
    (
        0..SQUAD,
        prop_oneof![9 => 0i32..4, 1 => (i32::MAX - 2)..=i32::MAX],
        0i32..3,
        0i32..=2,
        0i32..=1,
    )
}

fn side() -> impl Strategy<Value = Vec<Entry>> {
    // Up to five entries over three slots, so duplicates are common.
    proptest::collection::vec(entry(), 0..5)
}

fn round() -> impl Strategy<Value = Round> {
    (side(), side(), proptest::option::of((side(), side())))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_career_counters_follow_performances(
        rounds in proptest::collection::vec(round(), 1..6)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run(rounds))?;
    }
}

//! Career stats ledger.
//!
//! Pure bookkeeping shared by every repository backend: collapsing submitted
//! performance entries into persisted rows and turning rows into per-career
//! counter deltas. Repositories apply the deltas inside their own transaction.
//!
//! All arithmetic is checked. A sum that leaves the `i32` range is a
//! `ValidationError`, raised before the caller writes anything.

use std::collections::HashMap;

use uuid::Uuid;

use crate::api::{AthleteCareer, MatchAthlete, PerformanceEntry};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

/// `a + b`, or a validation error naming `field` when it overflows.
fn add(field: &str, a: i32, b: i32) -> RepositoryResult<i32> {
    a.checked_add(b).ok_or_else(|| {
        RepositoryError::validation_with_context(
            format!("{} total is out of range", field),
            ErrorContext::new("career_ledger").with_entity(field),
        )
    })
}

/// Counter change for one `(athlete, team)` career.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CareerDelta {
    pub athlete_id: Uuid,
    pub team_id: Uuid,
    pub goals: i32,
    pub assists: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
}

impl CareerDelta {
    fn zero(athlete_id: Uuid, team_id: Uuid) -> Self {
        Self {
            athlete_id,
            team_id,
            goals: 0,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    pub fn key(&self) -> (Uuid, Uuid) {
        (self.athlete_id, self.team_id)
    }

    /// Deltas are built from non-negative rows, so negation cannot overflow.
    pub fn negate(self) -> Self {
        Self {
            goals: -self.goals,
            assists: -self.assists,
            yellow_cards: -self.yellow_cards,
            red_cards: -self.red_cards,
            ..self
        }
    }

    fn accumulate(&mut self, goals: i32, assists: i32, yellow: i32, red: i32) -> RepositoryResult<()> {
        self.goals = add("goals", self.goals, goals)?;
        self.assists = add("assists", self.assists, assists)?;
        self.yellow_cards = add("yellowCards", self.yellow_cards, yellow)?;
        self.red_cards = add("redCards", self.red_cards, red)?;
        Ok(())
    }

    /// The career after this delta, with the match counter moved by
    /// `matches_delta`. `career` itself is left untouched.
    pub fn apply_to(&self, career: &AthleteCareer, matches_delta: i32) -> RepositoryResult<AthleteCareer> {
        Ok(AthleteCareer {
            matches: add("matches", career.matches, matches_delta)?,
            goals: add("goals", career.goals, self.goals)?,
            assists: add("assists", career.assists, self.assists)?,
            yellow_cards: add("yellowCards", career.yellow_cards, self.yellow_cards)?,
            red_cards: add("redCards", career.red_cards, self.red_cards)?,
            ..career.clone()
        })
    }
}

/// Collapse entries submitted for the same `(athlete, team)` into one row.
///
/// Stats are summed and the first submitted position wins. Output order
/// follows first appearance.
pub fn merge_performances(entries: &[PerformanceEntry]) -> RepositoryResult<Vec<PerformanceEntry>> {
    let mut order: Vec<(Uuid, Uuid)> = Vec::new();
    let mut merged: HashMap<(Uuid, Uuid), PerformanceEntry> = HashMap::new();

    for entry in entries {
        let key = (entry.athlete_id, entry.team_id);
        match merged.get_mut(&key) {
            Some(existing) => {
                existing.goals = add("goals", existing.goals, entry.goals)?;
                existing.assists = add("assists", existing.assists, entry.assists)?;
                existing.yellow_cards = add("yellowCards", existing.yellow_cards, entry.yellow_cards)?;
                existing.red_cards = add("redCards", existing.red_cards, entry.red_cards)?;
            }
            None => {
                order.push(key);
                merged.insert(key, entry.clone());
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|key| merged.remove(&key))
        .collect())
}

/// One delta per distinct `(athlete, team)` pair in `rows`.
pub fn career_deltas(rows: &[MatchAthlete]) -> RepositoryResult<Vec<CareerDelta>> {
    let mut order: Vec<(Uuid, Uuid)> = Vec::new();
    let mut deltas: HashMap<(Uuid, Uuid), CareerDelta> = HashMap::new();

    for row in rows {
        let key = (row.athlete_id, row.team_id);
        let delta = deltas.entry(key).or_insert_with(|| {
            order.push(key);
            CareerDelta::zero(row.athlete_id, row.team_id)
        });
        delta.accumulate(row.goals, row.assists, row.yellow_cards, row.red_cards)?;
    }

    Ok(order
        .into_iter()
        .filter_map(|key| deltas.remove(&key))
        .collect())
}

/// Deltas for replacing `old` performance rows of a match with `new` ones.
///
/// Old rows are reversed and new rows applied; pairs present on both sides
/// are netted into one delta. The match counter is never touched by a
/// replacement, so callers apply the result with `matches_delta = 0`.
pub fn replacement_deltas(old: &[MatchAthlete], new: &[MatchAthlete]) -> RepositoryResult<Vec<CareerDelta>> {
    let mut order: Vec<(Uuid, Uuid)> = Vec::new();
    let mut net: HashMap<(Uuid, Uuid), CareerDelta> = HashMap::new();

    let reversed = career_deltas(old)?.into_iter().map(CareerDelta::negate);
    for delta in reversed.chain(career_deltas(new)?) {
        let entry = net.entry(delta.key()).or_insert_with(|| {
            order.push(delta.key());
            CareerDelta::zero(delta.athlete_id, delta.team_id)
        });
        entry.accumulate(delta.goals, delta.assists, delta.yellow_cards, delta.red_cards)?;
    }

    Ok(order.into_iter().filter_map(|key| net.remove(&key)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn entry(athlete: Uuid, team: Uuid, goals: i32, assists: i32) -> PerformanceEntry {
        PerformanceEntry {
            athlete_id: athlete,
            team_id: team,
            position: "FW".into(),
            goals,
            assists,
            yellow_cards: 0,
            red_cards: 0,
        }
    }

    fn rows(match_id: Uuid, entries: &[PerformanceEntry]) -> Vec<MatchAthlete> {
        entries
            .iter()
            .map(|e| MatchAthlete::from_entry(match_id, e))
            .collect()
    }

    #[test]
    fn test_merge_sums_duplicates_and_keeps_first_position() {
        let a = Uuid::new_v4();
        let t = Uuid::new_v4();
        let mut second = entry(a, t, 1, 0);
        second.position = "MF".into();
        second.yellow_cards = 1;

        let merged = merge_performances(&[entry(a, t, 2, 1), second]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].goals, 3);
        assert_eq!(merged[0].assists, 1);
        assert_eq!(merged[0].yellow_cards, 1);
        assert_eq!(merged[0].position, "FW");
    }

    #[test]
    fn test_same_athlete_for_two_teams_stays_separate() {
        let a = Uuid::new_v4();
        let merged =
            merge_performances(&[entry(a, Uuid::new_v4(), 1, 0), entry(a, Uuid::new_v4(), 1, 0)])
                .unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_replacement_nets_shared_pairs() {
        let m = Uuid::new_v4();
        let (a, b, t) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let old = rows(m, &[entry(a, t, 2, 1)]);
        let new = rows(m, &[entry(a, t, 1, 1), entry(b, t, 0, 2)]);

        let deltas = replacement_deltas(&old, &new).unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].key(), (a, t));
        assert_eq!((deltas[0].goals, deltas[0].assists), (-1, 0));
        assert_eq!(deltas[1].key(), (b, t));
        assert_eq!((deltas[1].goals, deltas[1].assists), (0, 2));
    }

    #[test]
    fn test_apply_delta_moves_match_counter() {
        let career = AthleteCareer::open(
            Uuid::new_v4(),
            Uuid::new_v4(),
            10,
            "FW",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let delta = CareerDelta {
            athlete_id: career.athlete_id,
            team_id: career.team_id,
            goals: 2,
            assists: 1,
            yellow_cards: 1,
            red_cards: 0,
        };
        let played = delta.apply_to(&career, 1).unwrap();
        assert_eq!((played.matches, played.goals, played.assists), (1, 2, 1));
        assert_eq!(career.matches, 0);

        let reverted = delta.negate().apply_to(&played, 0).unwrap();
        assert_eq!((reverted.matches, reverted.goals, reverted.yellow_cards), (1, 0, 0));
    }

    #[test]
    fn test_overflowing_duplicates_are_rejected() {
        let a = Uuid::new_v4();
        let t = Uuid::new_v4();
        let err = merge_performances(&[entry(a, t, i32::MAX, 0), entry(a, t, 1, 0)]).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.context().entity.as_deref(), Some("goals"));

        let mut late = entry(a, t, 0, 0);
        late.red_cards = i32::MAX;
        let mut early = entry(a, t, 0, 0);
        early.red_cards = 1;
        let m = Uuid::new_v4();
        let err = career_deltas(&rows(m, &[late, early])).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[test]
    fn test_overflowing_career_is_rejected() {
        let mut career = AthleteCareer::open(
            Uuid::new_v4(),
            Uuid::new_v4(),
            9,
            "FW",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        career.goals = 1;
        let delta = CareerDelta {
            athlete_id: career.athlete_id,
            team_id: career.team_id,
            goals: i32::MAX,
            assists: 0,
            yellow_cards: 0,
            red_cards: 0,
        };
        let err = delta.apply_to(&career, 1).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.message(), "goals total is out of range");
    }

    proptest! {
        #[test]
        fn prop_merged_rows_preserve_totals(
            stats in proptest::collection::vec((0usize..3, 0i32..5, 0i32..5), 0..20)
        ) {
            let athletes = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
            let team = Uuid::new_v4();
            let entries: Vec<_> = stats
                .iter()
                .map(|(i, g, a)| entry(athletes[*i], team, *g, *a))
                .collect();

            let merged = merge_performances(&entries).unwrap();
            let deltas = career_deltas(&rows(Uuid::new_v4(), &merged)).unwrap();

            let goals: i32 = entries.iter().map(|e| e.goals).sum();
            let assists: i32 = entries.iter().map(|e| e.assists).sum();
            prop_assert_eq!(deltas.iter().map(|d| d.goals).sum::<i32>(), goals);
            prop_assert_eq!(deltas.iter().map(|d| d.assists).sum::<i32>(), assists);
            prop_assert_eq!(merged.len(), deltas.len());
        }

        #[test]
        fn prop_replacing_with_same_rows_is_neutral(
            goals in proptest::collection::vec(0i32..6, 1..6)
        ) {
            let team = Uuid::new_v4();
            let m = Uuid::new_v4();
            let entries: Vec<_> = goals.iter().map(|g| entry(Uuid::new_v4(), team, *g, 0)).collect();
            let current = rows(m, &entries);

            for delta in replacement_deltas(&current, &current).unwrap() {
                prop_assert_eq!((delta.goals, delta.assists, delta.yellow_cards, delta.red_cards), (0, 0, 0, 0));
            }
        }
    }
}

//! Demo data loader.
//!
//! Everything is created through the same repository and service calls the
//! API uses, so career counters are derived from the recorded matches. The
//! data set is deterministic.

use chrono::{Duration, NaiveDate, Utc};
use log::info;
use serde_json::json;
use uuid::Uuid;

use super::matches;
use crate::api::{
    ClassAthlete, CreateMatchRequest, NewAthlete, NewCareer, NewTeam, NewTrainingClass, NewUser,
    PerformanceEntry, Team, TrainingPatch, User,
};
use crate::auth::password::hash_password;
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};

pub const DEMO_PASSWORD: &str = "password123";

const USERS: [(&str, &str); 5] = [
    ("João Silva", "joao@example.com"),
    ("Maria Santos", "maria@example.com"),
    ("Pedro Costa", "pedro@example.com"),
    ("Ana Oliveira", "ana@example.com"),
    ("Carlos Souza", "carlos@example.com"),
];

/// Full name, short name, main and secondary colour, owner index.
const TEAMS: [(&str, &str, &str, &str, usize); 8] = [
    ("Flamengo FC", "FLA", "FF0000", "000000", 0),
    ("Palmeiras SC", "PAL", "006633", "FFFFFF", 0),
    ("São Paulo FC", "SAO", "FF0000", "FFFFFF", 1),
    ("Corinthians", "COR", "000000", "FFFFFF", 1),
    ("Santos FC", "SAN", "FFFFFF", "000000", 2),
    ("Grêmio FBPA", "GRE", "0066CC", "000000", 2),
    ("Internacional", "INT", "FF0000", "FFFFFF", 3),
    ("Atlético MG", "ATM", "000000", "FFFFFF", 3),
];

const ATHLETES: [&str; 40] = [
    "Gabriel Silva",
    "Lucas Oliveira",
    "Rafael Santos",
    "Mateus Costa",
    "Felipe Alves",
    "Bruno Lima",
    "Diego Souza",
    "Thiago Pereira",
    "Rodrigo Martins",
    "João Paulo",
    "Pedro Henrique",
    "Vinicius Jr",
    "Neymar Santos",
    "Marcelo Vieira",
    "Daniel Alves",
    "Casemiro Silva",
    "Fabinho Tavares",
    "Richarlison Andrade",
    "Roberto Firmino",
    "Alisson Becker",
    "Ederson Moraes",
    "Marquinhos Correia",
    "Thiago Silva",
    "Alex Sandro",
    "Danilo Pereira",
    "Arthur Melo",
    "Fred Rodrigues",
    "Everton Cebolinha",
    "Antony Matheus",
    "Raphinha Dias",
    "Matheus Cunha",
    "Gabriel Jesus",
    "Vinícius Tobias",
    "Brenner Silva",
    "Yuri Alberto",
    "Pedro Raul",
    "Rony Rustico",
    "Dudu Alves",
    "Gustavo Scarpa",
    "Raphael Veiga",
];

const POSITIONS: [&str; 5] = ["Goleiro", "Zagueiro", "Volante", "Meia", "Centroavante"];

const SQUAD_SIZE: usize = 5;

const CLASS_TITLES: [&str; 3] = [
    "Treino Tático Ofensivo",
    "Treino Físico - Resistência",
    "Treino de Finalizações",
];

/// What a seeding run created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub teams: usize,
    pub athletes: usize,
    pub matches: usize,
    pub trainings: usize,
    pub classes: usize,
    pub attendances: usize,
}

struct Squad {
    team: Team,
    owner_id: Uuid,
    members: Vec<(Uuid, &'static str)>,
}

fn date(year: i32, month: u32, day: u32) -> RepositoryResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| RepositoryError::internal(format!("Invalid date {}-{}-{}", year, month, day)))
}

/// Load the demo data set. Returns `None` when it is already present.
pub async fn seed_demo_data<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Option<SeedReport>> {
    if repo.find_user_by_email(USERS[0].1).await?.is_some() {
        info!("Demo data already present, skipping seed");
        return Ok(None);
    }

    let mut report = SeedReport::default();
    let password_hash = hash_password(DEMO_PASSWORD.to_string()).await?;

    let mut users: Vec<User> = Vec::with_capacity(USERS.len());
    for (name, email) in USERS {
        users.push(
            repo.create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.clone(),
            })
            .await?,
        );
    }
    report.users = users.len();

    let started_at = date(2024, 1, 1)?;
    let mut squads: Vec<Squad> = Vec::with_capacity(TEAMS.len());
    for (index, (full_name, short_name, main, secondary, owner)) in TEAMS.into_iter().enumerate() {
        let owner_id = users[owner].id;
        let team = repo
            .create_team(
                owner_id,
                NewTeam {
                    full_name: full_name.to_string(),
                    short_name: short_name.to_string(),
                    icon_url: None,
                    main_color_hex: Some(main.to_string()),
                    secondary_color_hex: Some(secondary.to_string()),
                },
            )
            .await?;

        let mut members = Vec::with_capacity(SQUAD_SIZE);
        for slot in 0..SQUAD_SIZE {
            let athlete_index = index * SQUAD_SIZE + slot;
            let birth_year = 2003 + (athlete_index / 7) as i32;
            let birthdate = date(birth_year, slot as u32 + 1, 10)?;
            let (athlete, _) = repo
                .create_athlete_with_career(
                    NewAthlete {
                        name: ATHLETES[athlete_index].to_string(),
                        birthdate,
                    },
                    NewCareer {
                        team_id: team.id,
                        shirt_number: (slot as i32 + 1) * 2,
                        position: POSITIONS[slot].to_string(),
                    },
                    started_at,
                )
                .await?;
            members.push((athlete.id, POSITIONS[slot]));
        }
        report.athletes += members.len();
        squads.push(Squad {
            team,
            owner_id,
            members,
        });
    }
    report.teams = squads.len();

    report.matches = seed_matches(repo, &squads).await?;

    let today = Utc::now().date_naive();
    for (team_index, squad) in squads.iter().enumerate() {
        for round in 0..2 {
            let day = today - Duration::days((7 * round + team_index) as i64 + 1);
            let training = repo.create_training(squad.team.id, day).await?;
            if round == 1 {
                repo.update_training(
                    squad.team.id,
                    training.id,
                    TrainingPatch {
                        date: None,
                        concluded: Some(true),
                    },
                )
                .await?;
            }
            report.trainings += 1;

            for (class_index, title) in CLASS_TITLES.iter().enumerate() {
                let class = repo
                    .create_class(
                        training.id,
                        NewTrainingClass {
                            title: title.to_string(),
                            description: Some(
                                "Foco em aspectos técnicos e táticos do jogo.".to_string(),
                            ),
                            notes: None,
                        },
                    )
                    .await?;
                report.classes += 1;

                for (member_index, (athlete_id, _)) in squad.members.iter().enumerate() {
                    let present = (member_index + class_index + round) % 6 != 5;
                    let score = 6.0 + ((member_index * 7 + class_index * 3) % 30) as f64 / 10.0;
                    repo.add_class_athlete(ClassAthlete {
                        training_class_id: class.id,
                        athlete_id: *athlete_id,
                        present,
                        notes: (!present).then(|| "Faltou ao treino".to_string()),
                        stats: present.then(|| {
                            json!({
                                "velocidade": score,
                                "resistencia": score,
                                "tecnica": score,
                            })
                        }),
                    })
                    .await?;
                    report.attendances += 1;
                }
            }
        }
    }

    info!("Seeded demo data: {:?}", report);
    Ok(Some(report))
}

/// One round where every team hosts the next one.
async fn seed_matches<R: FullRepository + ?Sized>(
    repo: &R,
    squads: &[Squad],
) -> RepositoryResult<usize> {
    let now = Utc::now();
    let mut created = 0;
    for (index, home) in squads.iter().enumerate() {
        let away = &squads[(index + 1) % squads.len()];
        let home_goals = (index % 4) as i32;
        let away_goals = ((index + 1) % 3) as i32;

        let mut athletes = lineup(home, home_goals, index);
        athletes.extend(lineup(away, away_goals, index + 1));

        matches::create_match(
            repo,
            home.owner_id,
            CreateMatchRequest {
                home_team_id: home.team.id,
                away_team_id: away.team.id,
                timestamp: now - Duration::days(3 * index as i64 + 2),
                home_score: home_goals,
                away_score: away_goals,
                athletes,
            },
        )
        .await?;
        created += 1;
    }
    Ok(created)
}

/// Every squad member plays; goals go to the forwards first.
fn lineup(squad: &Squad, goals: i32, seed: usize) -> Vec<PerformanceEntry> {
    let mut remaining = goals;
    squad
        .members
        .iter()
        .enumerate()
        .rev()
        .map(|(slot, (athlete_id, position))| {
            let scored = remaining.min(2);
            remaining -= scored;
            PerformanceEntry {
                athlete_id: *athlete_id,
                team_id: squad.team.id,
                position: position.to_string(),
                goals: scored,
                assists: i32::from((slot + seed) % 3 == 0),
                yellow_cards: i32::from((slot + seed) % 5 == 1),
                red_cards: 0,
            }
        })
        .collect()
}

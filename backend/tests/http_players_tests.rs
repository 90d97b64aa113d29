//! Flat player endpoints over HTTP.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::{create_team, delete, get, post, register, send, test_app};

#[tokio::test]
async fn test_player_lifecycle() {
    let app = test_app();
    let (_, token) = register(&app, "Owner", "owner@example.com").await;
    let team = create_team(&app, &token, "Home FC", "HFC").await;

    let created = post(
        &app,
        "/v1/players",
        &token,
        json!({
            "name": "Rui",
            "birthdate": "1999-02-03",
            "teamId": team,
            "shirtNumber": 1,
            "position": "GK",
        }),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["id"].as_str().unwrap().to_string();
    assert_eq!(created.body["teamId"], team.as_str());

    let listed = get(&app, &format!("/v1/players?teamId={}&name=ru", team), &token).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let updated = send(
        &app,
        Method::PUT,
        &format!("/v1/players/{}?teamId={}", id, team),
        Some(&token),
        Some(json!({ "name": "Rui Patrício", "shirtNumber": 12 })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["name"], "Rui Patrício");
    assert_eq!(updated.body["shirtNumber"], 12);

    let fetched = get(&app, &format!("/v1/players/{}", id), &token).await;
    assert_eq!(fetched.body["shirtNumber"], 12);

    let deleted = delete(&app, &format!("/v1/players/{}?teamId={}", id, team), &token).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({ "success": true }));

    let gone = get(&app, &format!("/v1/players/{}", id), &token).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_player_rules() {
    let app = test_app();
    let (_, token) = register(&app, "Owner", "owner@example.com").await;
    let (_, stranger) = register(&app, "Stranger", "stranger@example.com").await;
    let team = create_team(&app, &token, "Home FC", "HFC").await;

    let body = json!({
        "name": "Rui",
        "birthdate": "1999-02-03",
        "teamId": team,
        "shirtNumber": 0,
        "position": "GK",
    });
    let zero = post(&app, "/v1/players", &token, body).await;
    assert_eq!(zero.status, StatusCode::UNPROCESSABLE_ENTITY);

    let foreign = post(
        &app,
        "/v1/players",
        &stranger,
        json!({
            "name": "Rui",
            "birthdate": "1999-02-03",
            "teamId": team,
            "shirtNumber": 1,
            "position": "GK",
        }),
    )
    .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    // teamId is required to address the career.
    let no_team = send(
        &app,
        Method::DELETE,
        &format!("/v1/players/{}", uuid::Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(no_team.status, StatusCode::UNPROCESSABLE_ENTITY);
}

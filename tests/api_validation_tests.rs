// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation and offline behaviour of the API.
//!
//! Everything here runs without a database: invalid requests must be
//! rejected before any storage access, reads degrade gracefully and
//! writes surface a database error.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use workout_tracker::timer::Permission;

mod common;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", common::create_test_jwt("user-1")),
        )
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", common::create_test_jwt("user-1")),
        )
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_create_workout_requires_name() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/workouts",
            json!({ "name": "   ", "exercises": [{ "name": "Squat", "series": 3 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_create_workout_requires_exercises() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/workouts",
            json!({ "name": "Legs", "exercises": [] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_workout_offline_is_database_error() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/workouts",
            json!({ "name": "Legs", "exercises": [{ "name": "Leg Press", "series": "4" }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "database_error");
    // Internal details are not leaked
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn test_calendar_rejects_bad_month() {
    let (app, _) = common::create_test_app();

    for month in ["2026-13", "2026-1", "january", ""] {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/logs/calendar?month={}", month)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "month {:?}", month);
    }
}

#[tokio::test]
async fn test_calendar_offline_is_empty() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(get("/api/logs/calendar?month=2026-02"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_monthly_stats_offline() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(get("/api/stats/monthly")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["done"], 0);
    assert_eq!(json["goal"], 20);
    assert_eq!(json["progress_percentage"], 0);
    assert!(json["last_workout"].is_null());
}

#[tokio::test]
async fn test_catalog_search() {
    let (app, _) = common::create_test_app();

    let response = app.clone().oneshot(get("/api/catalog?q=bench")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Flat Bench Press"));
    assert!(json[0]["slug"].as_str().unwrap().contains('-'));

    // Single-character queries return nothing
    let response = app.oneshot(get("/api/catalog?q=b")).await.unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_diet_offline_is_empty_plan() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(get("/api/diet")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meals"], json!([]));
    assert_eq!(json["updated_at"], "");
}

#[tokio::test]
async fn test_diet_templates_listed() {
    let (app, _) = common::create_test_app();

    let response = app.oneshot(get("/api/diet/templates")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let slugs: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["muscle-gain", "weight-loss", "cutting"]);
    assert_eq!(json[0]["calories"], 2500);
    assert_eq!(json[0]["meals"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_save_diet_rejects_bad_time() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(send_json(
            "PUT",
            "/api/diet",
            json!({ "meals": [
                { "time": "08:00", "name": "Breakfast", "items": "oats" },
                { "time": "lunchtime", "name": "Lunch", "items": "rice" }
            ] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["details"].as_str().unwrap().contains("Meal 2"));
}

#[tokio::test]
async fn test_save_diet_offline_is_database_error() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(send_json(
            "PUT",
            "/api/diet",
            json!({ "meals": [{ "hora": "7:30", "nome": "Breakfast", "itens": "eggs" }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "database_error");
}

#[tokio::test]
async fn test_apply_unknown_diet_template() {
    let (app, _) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/diet/templates/keto", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A known template gets as far as the write
    let response = app
        .oneshot(send_json("POST", "/api/diet/templates/cutting", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unknown_session_workout_offline() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(send_json("POST", "/api/sessions/w1", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_permission_and_click_endpoints() {
    let (app, state) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            "/api/client/permission",
            json!({ "permission": "granted" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        state.notifications.permission("user-1"),
        Permission::Granted
    );

    // No window is open, so the client is told to open one
    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/notifications/click", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "action": "open_window", "url": "/" })
    );

    let response = app
        .oneshot(send_json(
            "PUT",
            "/api/client/visibility",
            json!({ "window_id": "nope", "visible": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_stream_registers_window() {
    use tokio_stream::StreamExt;

    let (app, state) = common::create_test_app();

    let response = app.oneshot(get("/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    assert_eq!(state.notifications.window_count("user-1"), 1);

    let mut stream = response.into_body().into_data_stream();
    let first = stream.next().await.unwrap().unwrap();
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert!(first.starts_with("data: "));
    assert!(first.contains("\"event\":\"hello\""));

    drop(stream);
    assert_eq!(state.notifications.window_count("user-1"), 0);
}

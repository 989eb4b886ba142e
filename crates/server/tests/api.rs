use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn basic(username: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:secret")))
}

async fn call(app: &Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> i64 {
    let (status, body) = call(
        app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn protected_routes_need_valid_credentials() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, _) = call(&app, "GET", "/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, "GET", "/dashboard", Some("mallory"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/me")
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("alice:wrong")),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", "/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, body) = call(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({"username": "alice", "email": "x@example.com", "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("alice"));
}

#[tokio::test]
async fn dinner_then_settle_up() {
    let app = app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = call(
        &app,
        "POST",
        "/groups",
        Some("alice"),
        Some(json!({"name": "Flat", "member_ids": [bob]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group = body["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        "/expenses",
        Some("alice"),
        Some(json!({
            "title": "Dinner",
            "amount": 100.0,
            "group_id": group,
            "split_with": [alice, bob],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/groups/{group}/balances"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balances"][0]["net_balance"], 50.0);
    assert_eq!(body["balances"][1]["net_balance"], -50.0);

    let (status, body) = call(&app, "GET", "/dashboard", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_owed"], 50.0);
    assert_eq!(body["counterparties"][0]["username"], "alice");

    let (status, _) = call(
        &app,
        "POST",
        "/settle",
        Some("bob"),
        Some(json!({"from_user": bob, "to_user": alice, "amount": 50.0, "group_id": group})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = call(&app, "GET", &format!("/balances/{alice}"), Some("bob"), None).await;
    assert_eq!(body["net_balance"], 0.0);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/groups/{group}/expenses"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expenses"].as_array().unwrap().len(), 2);
    assert_eq!(body["expenses"][1]["title"], "Settlement");
}

#[tokio::test]
async fn invalid_splits_are_rejected() {
    let app = app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, _) = call(
        &app,
        "POST",
        "/expenses",
        Some("alice"),
        Some(json!({"title": "Taxi", "amount": 20.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/expenses",
        Some("alice"),
        Some(json!({
            "title": "Taxi",
            "amount": 20.0,
            "amounts": {alice.to_string(): 5.0, bob.to_string(): 5.0},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        "POST",
        "/expenses",
        Some("alice"),
        Some(json!({"title": "Taxi", "amount": 20.0, "split_with": [bob]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn group_routes_enforce_membership() {
    let app = app().await;
    register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    register(&app, "carol").await;

    let (_, body) = call(
        &app,
        "POST",
        "/groups",
        Some("alice"),
        Some(json!({"name": "Club", "member_ids": [bob]})),
    )
    .await;
    let group = body["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "GET",
        &format!("/groups/{group}/members"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "DELETE", &format!("/groups/{group}"), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "GET", "/groups/999/balances", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/groups/{group}/members"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"][0]["role"], "admin");
    assert_eq!(body["members"][1]["role"], "member");

    let (status, _) = call(&app, "DELETE", &format!("/groups/{group}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&app, "GET", "/groups", Some("bob"), None).await;
    assert!(body["groups"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn threads_and_summaries() {
    let app = app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (_, body) = call(
        &app,
        "POST",
        "/groups",
        Some("alice"),
        Some(json!({"name": "Trip", "member_ids": [bob]})),
    )
    .await;
    let group = body["id"].as_i64().unwrap();
    let (status, body) = call(
        &app,
        "POST",
        "/threads",
        Some("bob"),
        Some(json!({"name": "Day one", "group_id": group})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let thread = body["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        "POST",
        "/expenses",
        Some("bob"),
        Some(json!({
            "title": "Museum",
            "amount": 30.0,
            "thread_id": thread,
            "amounts": {alice.to_string(): 20.0, bob.to_string(): 10.0},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let expense = body["id"].as_i64().unwrap();

    let (_, body) = call(&app, "GET", &format!("/expenses/{expense}"), Some("alice"), None).await;
    assert_eq!(body["group_id"], group);
    assert_eq!(body["thread_name"], "Day one");

    let (_, body) = call(&app, "GET", "/threads/summary", Some("alice"), None).await;
    assert_eq!(body["threads"][0]["total_balance"], -20.0);
    let (_, body) = call(&app, "GET", "/groups/summary", Some("bob"), None).await;
    assert_eq!(body["groups"][0]["total_balance"], 20.0);

    let (status, _) = call(&app, "DELETE", &format!("/threads/{thread}"), Some("bob"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &format!("/expenses/{expense}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

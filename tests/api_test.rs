use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use projectserver::core::config::AppConfig;
use projectserver::core::shared::state::AppState;
use projectserver::core::storage::Store;
use projectserver::main_module::build_router;
use projectserver::security::{Argon2Config, JwtManager, PasswordHasher2};

const SECRET: &str = "integration-test-secret-with-enough-length";

fn test_app() -> Router {
    let state = AppState::new(
        Store::memory(),
        AppConfig::default(),
        JwtManager::from_secret(SECRET).unwrap(),
        PasswordHasher2::new(Argon2Config::fast()).unwrap(),
    );
    build_router(Arc::new(state))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
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

/// Sends a body verbatim so tests can control the content type and bytes.
async fn call_raw(
    app: &Router,
    uri: &str,
    token: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse battery staple",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["token_type"], "Bearer");
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn create_project(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/projects",
        Some(token),
        Some(json!({
            "name": name,
            "start_date": "2024-01-01",
            "end_date": "2024-06-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_task(app: &Router, token: &str, project: &str, body: Value) -> (StatusCode, Value) {
    call(
        app,
        Method::POST,
        &format!("/api/projects/{project}/tasks"),
        Some(token),
        Some(body),
    )
    .await
}

#[tokio::test]
async fn test_launch_scenario() {
    let app = test_app();
    let (alice, _) = register(&app, "alice").await;
    let (bob, _) = register(&app, "bob").await;

    let project = create_project(&app, &alice, "Launch").await;

    let (status, design) = create_task(
        &app,
        &alice,
        &project,
        json!({"name": "Design", "start_date": "2024-01-02", "end_date": "2024-01-10"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(design["status"], "not_started");
    let t1 = design["id"].as_str().unwrap().to_string();

    let (status, build) = create_task(
        &app,
        &alice,
        &project,
        json!({
            "name": "Build",
            "start_date": "2024-01-02",
            "end_date": "2024-01-10",
            "parent_task_id": t1,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(build["parent_task_id"], json!(t1));

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/tasks/{t1}/dependencies"),
        Some(&alice),
        Some(json!({"predecessor_task_id": t1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/projects/{project}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/projects/{project}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call(&app, Method::GET, &format!("/api/tasks/{t1}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = test_app();

    let (status, body) = call(&app, Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = call(&app, Method::GET, "/api/projects", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_register_and_login() {
    let app = test_app();
    let (token, user_id) = register(&app, "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "alice", "email": "other@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "Resource already exists");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "alice", "password": "correct horse battery staple"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["user"].get("password_hash").is_none());

    let (status, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], json!(user_id));
}

#[tokio::test]
async fn test_validation_and_bad_path_ids() {
    let app = test_app();
    let (alice, _) = register(&app, "alice").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/projects",
        Some(&alice),
        Some(json!({"name": "Late", "start_date": "2024-06-01", "end_date": "2024-06-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/projects",
        Some(&alice),
        Some(json!({"name": "Bad", "start_date": "01/01/2024", "end_date": "2024-06-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        call(&app, Method::GET, "/api/tasks/not-a-uuid", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_malformed_bodies_get_error_contract() {
    let app = test_app();
    let (alice, _) = register(&app, "alice").await;
    let project = create_project(&app, &alice, "Launch").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/projects",
        Some(&alice),
        Some(json!({"name": 5, "start_date": "2024-01-01", "end_date": "2024-06-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(!body["message"].as_str().unwrap().contains("invalid type"));

    let (status, body) = call_raw(
        &app,
        "/api/projects",
        &alice,
        Some("application/json"),
        "{\"name\": \"Broken\",",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = call_raw(
        &app,
        &format!("/api/projects/{project}/tasks"),
        &alice,
        None,
        "{\"title\": \"Design\"}",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/projects/12345",
        Some(&alice),
        Some(json!({"name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "Invalid identifier in request path");
}

#[tokio::test]
async fn test_membership_grants_task_access() {
    let app = test_app();
    let (alice, _) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;
    let project = create_project(&app, &alice, "Launch").await;

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/projects/{project}/tasks"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, member) = call(
        &app,
        Method::POST,
        &format!("/api/projects/{project}/members"),
        Some(&alice),
        Some(json!({"user_id": bob_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["role"], "member");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/projects/{project}/members"),
        Some(&alice),
        Some(json!({"user_id": bob_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, notes) = call(&app, Method::GET, "/api/notifications", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes[0]["type"], "project_invite");

    let (status, tasks) = call(
        &app,
        Method::GET,
        &format!("/api/projects/{project}/tasks"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([]));

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/projects/{project}/members/{bob_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/projects/{project}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_lifecycle_with_comments_and_notifications() {
    let app = test_app();
    let (alice, _) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;
    let project = create_project(&app, &alice, "Launch").await;

    call(
        &app,
        Method::POST,
        &format!("/api/projects/{project}/members"),
        Some(&alice),
        Some(json!({"user_id": bob_id})),
    )
    .await;

    let (_, design) = create_task(
        &app,
        &alice,
        &project,
        json!({
            "name": "Design",
            "start_date": "2024-01-02",
            "end_date": "2024-01-10",
            "assigned_to": bob_id,
        }),
    )
    .await;
    let design_id = design["id"].as_str().unwrap().to_string();
    let (_, build) = create_task(
        &app,
        &alice,
        &project,
        json!({"name": "Build", "start_date": "2024-01-11", "end_date": "2024-01-20"}),
    )
    .await;
    let build_id = build["id"].as_str().unwrap().to_string();

    let dependency = json!({"predecessor_task_id": design_id, "type": "finish_to_start"});
    let (status, edge) = call(
        &app,
        Method::POST,
        &format!("/api/tasks/{build_id}/dependencies"),
        Some(&alice),
        Some(dependency.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(edge["type"], "finish_to_start");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/tasks/{build_id}/dependencies"),
        Some(&alice),
        Some(dependency),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/tasks/{design_id}/dependencies"),
        Some(&alice),
        Some(json!({"predecessor_task_id": build_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, comment) = call(
        &app,
        Method::POST,
        &format!("/api/tasks/{design_id}/comments"),
        Some(&alice),
        Some(json!({"content": "Mockups by Friday?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/comments/{}", comment["id"].as_str().unwrap()),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, notes) = call(&app, Method::GET, "/api/notifications", Some(&bob), None).await;
    let kinds: Vec<&str> = notes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["comment_added", "task_updated", "project_invite"]);

    for _ in 0..2 {
        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/notifications/mark_all_read",
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, notes) = call(&app, Method::GET, "/api/notifications", Some(&bob), None).await;
        assert!(notes
            .as_array()
            .unwrap()
            .iter()
            .all(|n| n["is_read"] == json!(true)));
    }

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/tasks/{design_id}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, edges) = call(
        &app,
        Method::GET,
        &format!("/api/tasks/{build_id}/dependencies"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edges, json!([]));
}

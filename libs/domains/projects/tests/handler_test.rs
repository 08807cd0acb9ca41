//! Handler tests for the projects domain
//!
//! The router runs against the in-memory store with the caller's claims
//! injected directly, so no JWT middleware or database is involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use axum_helpers::JwtClaims;
use domain_projects::{InMemoryStore, ProjectResponse, StatusResponse, TaskResponse, handlers};
use domain_users::{InMemoryUserRepository, NewUser, Role, UserRepository};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct Fixture {
    state: handlers::ProjectsState,
    app: Router,
    caller: i32,
    other: i32,
}

async fn fixture() -> Fixture {
    let users = InMemoryUserRepository::new();
    let caller = users.create(new_user("alice")).await.unwrap();
    let other = users.create(new_user("bob")).await.unwrap();

    let store = InMemoryStore::new();
    let state = handlers::ProjectsState::new(
        Arc::new(store.projects()),
        Arc::new(store.statuses()),
        Arc::new(store.tasks()),
        Arc::new(users),
    );

    let app = app_as(&state, caller, "alice");
    Fixture {
        state,
        app,
        caller,
        other,
    }
}

fn app_as(state: &handlers::ProjectsState, id: i32, name: &str) -> Router {
    handlers::router(state.clone()).layer(Extension(claims_for(id, name)))
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        password_hash: "unused".to_string(),
        role: Role::User,
    }
}

fn claims_for(id: i32, name: &str) -> JwtClaims {
    JwtClaims {
        sub: id.to_string(),
        name: name.to_string(),
        role: "USER".to_string(),
        exp: i64::MAX,
        iat: 0,
        jti: "test".to_string(),
    }
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request(method, uri, body)).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_project(app: &Router, name: &str, members: &[i32]) -> ProjectResponse {
    let (status, body) = send(
        app,
        "POST",
        "/",
        Some(json!({ "name": name, "memberIds": members })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    serde_json::from_value(body).unwrap()
}

async fn create_status(app: &Router, project_id: i32, name: &str) -> StatusResponse {
    let (status, body) = send(
        app,
        "POST",
        &format!("/{}/statuses", project_id),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    serde_json::from_value(body).unwrap()
}

fn task_body(project_id: i32, status: &str, assigner_id: i32) -> Value {
    json!({
        "title": "Write docs",
        "description": "API reference",
        "startDate": "2024-05-01T09:00:00",
        "endDate": "2024-05-03T17:00:00",
        "status": status,
        "projectId": project_id,
        "assignerId": assigner_id
    })
}

// ============================================================================
// Projects
// ============================================================================

#[tokio::test]
async fn test_create_project_adds_caller_as_member() {
    let f = fixture().await;

    let project = create_project(&f.app, "Relaunch", &[f.other]).await;

    let mut ids: Vec<i32> = project.members.iter().map(|m| m.id).collect();
    ids.sort();
    assert_eq!(ids, vec![f.caller, f.other]);
    assert!(project.tasks.is_none());
}

#[tokio::test]
async fn test_create_project_with_unknown_member_is_404() {
    let f = fixture().await;

    let (status, body) = send(
        &f.app,
        "POST",
        "/",
        Some(json!({ "name": "Relaunch", "memberIds": [999] })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_project_with_empty_name_is_400() {
    let f = fixture().await;

    let (status, body) = send(&f.app, "POST", "/", Some(json!({ "name": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["name"].is_array());
}

#[tokio::test]
async fn test_list_projects_returns_only_callers_projects() {
    let f = fixture().await;
    let mine = create_project(&f.app, "Mine", &[]).await;

    // Created by bob, without the caller
    let bob_app = app_as(&f.state, f.other, "bob");
    let theirs = create_project(&bob_app, "Theirs", &[]).await;

    let (status, body) = send(&f.app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<ProjectResponse> = serde_json::from_value(body).unwrap();
    let ids: Vec<i32> = listed.iter().map(|p| p.id).collect();
    assert!(ids.contains(&mine.id));
    assert!(!ids.contains(&theirs.id));
}

#[tokio::test]
async fn test_admin_lists_every_project() {
    let f = fixture().await;
    let mine = create_project(&f.app, "Mine", &[]).await;
    let bob_app = app_as(&f.state, f.other, "bob");
    let theirs = create_project(&bob_app, "Theirs", &[]).await;

    let mut claims = claims_for(f.caller, "alice");
    claims.role = "ADMIN".to_string();
    let admin_app = handlers::router(f.state.clone()).layer(Extension(claims));

    let (status, body) = send(&admin_app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<ProjectResponse> = serde_json::from_value(body).unwrap();
    let ids: Vec<i32> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![mine.id, theirs.id]);
}

#[tokio::test]
async fn test_get_project_includes_tasks() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;

    let (status, _) = send(&f.app, "POST", "/tasks", Some(task_body(project.id, "todo", f.caller))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&f.app, "GET", &format!("/{}", project.id), None).await;
    assert_eq!(status, StatusCode::OK);

    let fetched: ProjectResponse = serde_json::from_value(body).unwrap();
    let tasks = fetched.tasks.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, "todo");
}

#[tokio::test]
async fn test_get_unknown_project_is_404() {
    let f = fixture().await;

    let (status, body) = send(&f.app, "GET", "/42", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project 42 not found");
}

#[tokio::test]
async fn test_get_project_with_invalid_id_is_400() {
    let f = fixture().await;

    let (status, _) = send(&f.app, "GET", "/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_project_changes_only_supplied_fields() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[f.other]).await;

    let (status, body) = send(
        &f.app,
        "PUT",
        &format!("/{}", project.id),
        Some(json!({ "name": "Relaunch v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated: ProjectResponse = serde_json::from_value(body).unwrap();
    assert_eq!(updated.name, "Relaunch v2");
    assert_eq!(updated.members.len(), 2);
}

#[tokio::test]
async fn test_update_unknown_project_is_404() {
    let f = fixture().await;

    let (status, _) = send(&f.app, "PUT", "/77", Some(json!({ "name": "x" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_project_twice() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    let uri = format!("/{}", project.id);

    let (first, _) = send(&f.app, "DELETE", &uri, None).await;
    let (second, _) = send(&f.app, "DELETE", &uri, None).await;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NOT_FOUND);
}

// ============================================================================
// Statuses
// ============================================================================

#[tokio::test]
async fn test_duplicate_status_in_project_is_409() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;

    let (status, body) = send(
        &f.app,
        "POST",
        &format!("/{}/statuses", project.id),
        Some(json!({ "name": "todo" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_list_statuses_of_project() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;
    create_status(&f.app, project.id, "done").await;

    let (status, body) = send(&f.app, "GET", &format!("/{}/statuses", project.id), None).await;
    assert_eq!(status, StatusCode::OK);

    let statuses: Vec<StatusResponse> = serde_json::from_value(body).unwrap();
    let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["todo", "done"]);
}

#[tokio::test]
async fn test_delete_status_in_use_is_409() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    let todo = create_status(&f.app, project.id, "todo").await;
    send(&f.app, "POST", "/tasks", Some(task_body(project.id, "todo", f.caller))).await;

    let (status, _) = send(&f.app, "DELETE", &format!("/statuses/{}", todo.id), None).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_unused_status() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    let done = create_status(&f.app, project.id, "done").await;

    let (status, _) = send(&f.app, "DELETE", &format!("/statuses/{}", done.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&f.app, "DELETE", &format!("/statuses/{}", done.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn test_create_task_returns_status_name() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;

    let (status, body) = send(&f.app, "POST", "/tasks", Some(task_body(project.id, "todo", f.other))).await;
    assert_eq!(status, StatusCode::OK);

    let task: TaskResponse = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(task.status, "todo");
    assert_eq!(task.assigner_id, f.other);
    assert_eq!(body["startDate"], "2024-05-01T09:00:00");
}

#[tokio::test]
async fn test_create_task_with_status_of_other_project_is_404() {
    let f = fixture().await;
    let first = create_project(&f.app, "First", &[]).await;
    let second = create_project(&f.app, "Second", &[]).await;
    create_status(&f.app, first.id, "todo").await;

    let (status, _) = send(&f.app, "POST", "/tasks", Some(task_body(second.id, "todo", f.caller))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_task_ending_before_start_is_400() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;

    let mut body = task_body(project.id, "todo", f.caller);
    body["endDate"] = json!("2024-04-30T09:00:00");

    let (status, response) = send(&f.app, "POST", "/tasks", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_task_with_blank_title_is_400() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;

    let mut body = task_body(project.id, "todo", f.caller);
    body["title"] = json!("   ");

    let (status, response) = send(&f.app, "POST", "/tasks", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_task_missing_end_date_is_400() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;

    let mut body = task_body(project.id, "todo", f.caller);
    body.as_object_mut().unwrap().remove("endDate");

    let (status, _) = send(&f.app, "POST", "/tasks", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_task_moves_status() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;
    create_status(&f.app, project.id, "done").await;

    let (_, body) = send(&f.app, "POST", "/tasks", Some(task_body(project.id, "todo", f.caller))).await;
    let task: TaskResponse = serde_json::from_value(body).unwrap();

    let (status, body) = send(
        &f.app,
        "PUT",
        &format!("/tasks/{}", task.id),
        Some(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated: TaskResponse = serde_json::from_value(body).unwrap();
    assert_eq!(updated.status, "done");
    assert_eq!(updated.title, task.title);
    assert_eq!(updated.end_date, task.end_date);
}

#[tokio::test]
async fn test_update_unknown_task_is_404() {
    let f = fixture().await;

    let (status, _) = send(&f.app, "PUT", "/tasks/5", Some(json!({ "title": "x" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_and_delete_task() {
    let f = fixture().await;
    let project = create_project(&f.app, "Relaunch", &[]).await;
    create_status(&f.app, project.id, "todo").await;
    let (_, body) = send(&f.app, "POST", "/tasks", Some(task_body(project.id, "todo", f.caller))).await;
    let task: TaskResponse = serde_json::from_value(body).unwrap();
    let uri = format!("/tasks/{}", task.id);

    let (status, body) = send(&f.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Write docs");

    let (status, _) = send(&f.app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&f.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_routes_without_claims_are_401() {
    let users = InMemoryUserRepository::new();
    let store = InMemoryStore::new();
    let state = handlers::ProjectsState::new(
        Arc::new(store.projects()),
        Arc::new(store.statuses()),
        Arc::new(store.tasks()),
        Arc::new(users),
    );
    let app = handlers::router(state);

    let (status, body) = send(&app, "GET", "/", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

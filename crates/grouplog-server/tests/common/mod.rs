#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use grouplog_db::{open_database, DbRuntimeSettings};
use grouplog_server::{app, AppState};
use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const RELAY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
pub const ADMIN: &str = "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5";
pub const MEMBER: &str = "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

/// Application state backed by a fresh on-disk database.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn test_state() -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let pool = open_database(db_path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    let state = AppState::new(
        pool,
        RELAY,
        vec![ADMIN.to_string()],
        Duration::from_secs(15),
    );
    (dir, state)
}

pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.unwrap()
}

pub fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Relay-Pubkey", ADMIN);
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Creates `group_id` through the API and returns the response body.
pub async fn create_group(router: &Router, group_id: &str) -> Value {
    let response = send(
        router,
        admin_request(
            "POST",
            "/api/groups",
            Some(serde_json::json!({ "groupId": group_id, "name": "Pizza" })),
        ),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await
}

pub fn router(state: &AppState) -> Router {
    app(state.clone())
}

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{body_json, create_group, router, send, test_state, MEMBER, RELAY};
use futures_util::StreamExt;
use std::time::Duration;

#[tokio::test]
async fn query_returns_group_log_in_generation_order() {
    let (_dir, state) = test_state();
    let router = router(&state);
    create_group(&router, "pizza").await;
    create_group(&router, "pasta").await;
    state
        .moderator
        .put_user("pizza", MEMBER, ["moderator"])
        .await
        .unwrap();

    let response = send(
        &router,
        Request::builder()
            .uri("/api/events?group_id=pizza")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 3);
    let kinds: Vec<u64> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_u64().unwrap())
        .collect();
    assert_eq!(kinds, vec![9007, 9002, 9000]);

    let by_kind = send(
        &router,
        Request::builder()
            .uri(format!("/api/events?kind=9007&author={}", common::ADMIN))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(body_json(by_kind).await["count"], 2);

    let relay_authored = send(
        &router,
        Request::builder()
            .uri(format!("/api/events?author={RELAY}&limit=1"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(body_json(relay_authored).await["count"], 1);
}

#[tokio::test]
async fn inverted_time_range_is_rejected() {
    let (_dir, state) = test_state();
    let router = router(&state);

    let response = send(
        &router,
        Request::builder()
            .uri("/api/events?since=200&until=100")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stream_delivers_appended_records_for_the_group() {
    let (_dir, state) = test_state();
    let router = router(&state);

    let response = send(
        &router,
        Request::builder()
            .uri("/events/stream?group_id=pizza")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();

    state
        .moderator
        .put_user("pasta", MEMBER, Vec::<String>::new())
        .await
        .unwrap();
    let applied = state
        .moderator
        .put_user("pizza", MEMBER, ["admin"])
        .await
        .unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("stream should deliver within timeout")
        .expect("stream should not end")
        .unwrap();
    let frame = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(frame.contains("event: 9000"), "frame: {frame}");
    assert!(frame.contains(&format!("id: {}", applied[0].id())), "frame: {frame}");
    assert!(frame.contains("\"autogenerated\""), "frame: {frame}");
    assert!(!frame.contains("pasta"), "other groups are filtered: {frame}");
}

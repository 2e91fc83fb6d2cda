//! Integration tests for the query API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Each test gets its own `SQLite` file.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tornkeep_api::{AppState, build_router, serve_until};
use tornkeep_db::{ManualClock, QueryConfig, Store, StoreConfig};
use tornkeep_types::{PlayerId, PlayerProfile};
use tower::ServiceExt;

async fn make_test_state() -> (TempDir, Arc<AppState>) {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    ));
    let store = Store::open(&StoreConfig::new(dir.path().join("torn_data.db")))
        .await
        .unwrap()
        .with_clock(clock);
    store.schema().migrate_latest().await.unwrap();

    for id in 1..=12 {
        let profile = PlayerProfile {
            level: Some(id * 10),
            ..PlayerProfile::new(PlayerId::new(id), format!("Player{id}"))
        };
        store.state().upsert_player(&profile).await.unwrap();
    }

    let state = AppState::new(store, QueryConfig::default(), 60);
    (dir, Arc::new(state))
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_tables() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/tables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 11);
    let names: Vec<&str> = json["tables"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"players"));
    assert!(names.contains(&"war_summary"));
}

#[tokio::test]
async fn test_query_first_page() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/query?table=players&limit=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["table"], "players");
    assert_eq!(json["page"], 1);
    assert_eq!(json["page_size"], 5);
    assert_eq!(json["total_count"], 12);
    assert_eq!(json["total_pages"], 3);
    assert_eq!(json["rows"].as_array().unwrap().len(), 5);
    assert_eq!(json["columns"][0], "player_id");
    assert_eq!(json["rows"][0][0], 1);
}

#[tokio::test]
async fn test_query_filter_and_order() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(
        state,
        "/api/query?table=players&filter=level%20%3E%2050&order_by=level%20DESC",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_count"], 7);
    assert_eq!(json["rows"][0][0], 12);
}

#[tokio::test]
async fn test_query_renders_nulls_and_timestamps() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/query?table=players&limit=1").await;
    assert_eq!(status, StatusCode::OK);

    let columns: Vec<&str> = json["columns"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    let rank = columns.iter().position(|c| *c == "rank").unwrap();
    let created = columns.iter().position(|c| *c == "created_at").unwrap();
    assert!(json["rows"][0][rank].is_null());
    assert_eq!(json["rows"][0][created], "2025-03-01 12:00:00 UTC");
}

#[tokio::test]
async fn test_unknown_table_is_bad_request() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/query?table=not_a_table").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("not_a_table"));
    assert!(json.get("rows").is_none());
}

#[tokio::test]
async fn test_missing_table_param_is_bad_request() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/query?page=2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_invalid_page_is_bad_request() {
    let (_dir, state) = make_test_state().await;
    let (status, _) = get(state, "/api/query?table=players&page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_filter_is_bad_request() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(
        state,
        "/api/query?table=players&filter=level%20%3E%20abc",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("level"));
}

#[tokio::test]
async fn test_health() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["schema_version"], tornkeep_db::LATEST_VERSION);
    assert_eq!(json["horizon_days"], 60);
    assert!(json["size_bytes"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_writes_are_not_routed() {
    let (_dir, state) = make_test_state().await;
    let response = build_router(state)
        .oneshot(
            Request::post("/api/query?table=players")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_request_deadline_is_accepted() {
    let (_dir, state) = make_test_state().await;
    let (status, json) = get(state, "/api/query?table=players&timeout_ms=2000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_count"], 12);
}

#[tokio::test]
async fn test_serves_over_a_socket_until_shutdown() {
    let (_dir, state) = make_test_state().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(listener, state, async move {
        stopped.await.ok();
    }));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/tables HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"players\""));

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

//! Integration tests for the store backends
//!
//! - sqlite: real database file in a temp directory
//! - rest: local axum server standing in for the hosted table API

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use loyal_common::geo::GeoPoint;
use loyal_common::model::{Gender, NewPerson, VotePatch};
use loyal_common::store::{PersonStore, RestStore, SqliteStore};
use loyal_common::{StoreError, VoteKind};

fn new_person(name: &str) -> NewPerson {
    NewPerson {
        name: name.to_string(),
        gender: Gender::Girl,
        area: "Lalmatia".to_string(),
        quote: "Writes love letters in 2024".to_string(),
        social_media_link: Some("https://instagram.com/x".to_string()),
        location: GeoPoint::new(23.756, 90.367),
    }
}

// =============================================================================
// sqlite backend
// =============================================================================

async fn sqlite_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(&dir.path().join("data").join("people.db"))
        .await
        .expect("Should open sqlite store")
}

#[tokio::test]
async fn test_sqlite_insert_then_list() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;

    store.insert(&new_person("Maliha Ahmed")).await.unwrap();
    store.insert(&new_person("Bristy Das")).await.unwrap();

    let people = store.list_all().await.unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[0].name, "Maliha Ahmed");
    assert_eq!(people[0].gender, Gender::Girl);
    assert_eq!((people[0].real_votes, people[0].fake_votes), (0, 0));
    assert_eq!(people[0].location, GeoPoint::new(23.756, 90.367));
    assert!(people[0].created_at.is_some());
    assert_ne!(people[0].id, people[1].id);
}

#[tokio::test]
async fn test_sqlite_update_patches_one_counter() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    store.insert(&new_person("Mitu Akter")).await.unwrap();
    let id = store.list_all().await.unwrap()[0].id.clone();

    store.update_votes(&id, VotePatch::single(VoteKind::Fake, 3)).await.unwrap();
    store.update_votes(&id, VotePatch::single(VoteKind::Real, 8)).await.unwrap();

    let p = &store.list_all().await.unwrap()[0];
    assert_eq!((p.real_votes, p.fake_votes), (8, 3));
}

#[tokio::test]
async fn test_sqlite_update_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;

    let err = store
        .update_votes("missing", VotePatch::single(VoteKind::Real, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_sqlite_reopen_keeps_rows() {
    let dir = TempDir::new().unwrap();
    {
        let store = sqlite_store(&dir).await;
        store.insert(&new_person("Tania Sultana")).await.unwrap();
    }
    let store = sqlite_store(&dir).await;
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

// =============================================================================
// rest backend
// =============================================================================

#[derive(Clone, Default)]
struct Stub {
    rows: Arc<Mutex<Vec<Value>>>,
    seen_keys: Arc<Mutex<Vec<String>>>,
    fail_with: Arc<Mutex<Option<StatusCode>>>,
}

impl Stub {
    fn record(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        if let Some(key) = headers.get("apikey").and_then(|v| v.to_str().ok()) {
            self.seen_keys.lock().unwrap().push(key.to_string());
        }
        match *self.fail_with.lock().unwrap() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

async fn list(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    stub.record(&headers)?;
    if params.get("select").map(String::as_str) != Some("*") {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(stub.rows.lock().unwrap().clone()))
}

async fn insert(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    stub.record(&headers)?;
    let mut rows = stub.rows.lock().unwrap();
    row["id"] = json!(format!("row-{}", rows.len() + 1));
    row["real_votes"] = json!(0);
    row["fake_votes"] = json!(0);
    rows.push(row);
    Ok(StatusCode::CREATED)
}

async fn patch(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    stub.record(&headers)?;
    let id = params
        .get("id")
        .and_then(|f| f.strip_prefix("eq."))
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();
    let mut rows = stub.rows.lock().unwrap();
    if let Some(row) = rows.iter_mut().find(|r| r["id"] == json!(id)) {
        for (k, v) in body.as_object().ok_or(StatusCode::BAD_REQUEST)? {
            row[k] = v.clone();
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Start the stub server; returns its base URL
async fn start_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/rest/v1/people", get(list).post(insert).patch(patch))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn rest_store(base: &str) -> RestStore {
    RestStore::new(base, "anon-key", "people", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_rest_round_trip_sends_key() {
    let stub = Stub::default();
    let base = start_stub(stub.clone()).await;
    let store = rest_store(&base);

    store.insert(&new_person("Lamia Islam")).await.unwrap();
    let people = store.list_all().await.unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].id, "row-1");
    assert_eq!(people[0].social_media_link.as_deref(), Some("https://instagram.com/x"));

    store
        .update_votes("row-1", VotePatch::single(VoteKind::Real, 1))
        .await
        .unwrap();
    let people = store.list_all().await.unwrap();
    assert_eq!((people[0].real_votes, people[0].fake_votes), (1, 0));

    let keys = stub.seen_keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 4);
    assert!(keys.iter().all(|k| k == "anon-key"));
}

#[tokio::test]
async fn test_rest_patch_body_has_single_field() {
    let stub = Stub::default();
    stub.rows.lock().unwrap().push(json!({
        "id": "p1", "name": "Rima Begum", "gender": "girl", "area": "Wari",
        "quote": "q", "social_media_link": null, "lat": 23.71, "lng": 90.42,
        "real_votes": 5, "fake_votes": 2
    }));
    let base = start_stub(stub.clone()).await;

    rest_store(&base)
        .update_votes("p1", VotePatch::single(VoteKind::Fake, 3))
        .await
        .unwrap();

    let row = stub.rows.lock().unwrap()[0].clone();
    assert_eq!(row["fake_votes"], 3);
    assert_eq!(row["real_votes"], 5);
}

#[tokio::test]
async fn test_rest_error_status_is_api_error() {
    let stub = Stub::default();
    *stub.fail_with.lock().unwrap() = Some(StatusCode::SERVICE_UNAVAILABLE);
    let base = start_stub(stub).await;

    let err = rest_store(&base).list_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_rest_unreachable_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = rest_store(&format!("http://{}", addr)).list_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Network(_)));
}

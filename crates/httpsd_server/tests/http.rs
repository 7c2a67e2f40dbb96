//! HTTP-layer tests: the discovery wire contract and the admin API, driven
//! through the router with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use httpsd_db::SdDb;
use httpsd_protocol::Record;
use httpsd_server::http;

async fn test_router(tmp: &TempDir) -> (Router, SdDb) {
    let db = SdDb::open(tmp.path().join("httpsd.db")).await.unwrap();
    (http::router(db.clone()), db)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn seed_node_targets(db: &SdDb) {
    let file = db.file_create("node-targets").await.unwrap();

    let t1 = db.target_resolve("10.0.0.1:9100").await.unwrap();
    let key = db.label_key_resolve("env").await.unwrap();
    let value = db.label_value_resolve("prod").await.unwrap();
    let label = db
        .label_commit(&db.label_resolve(&key, &value).await.unwrap())
        .await
        .unwrap();

    let mut r1 = Record {
        name: "r1".to_string(),
        file: Some(file.clone()),
        targets: vec![t1],
        ..Record::default()
    };
    r1.assign_label(label).unwrap();
    db.record_save(&r1).await.unwrap();

    let t2 = db.target_resolve("10.0.0.2:9100").await.unwrap();
    db.record_save(&Record {
        name: "r2".to_string(),
        file: Some(file),
        active: false,
        targets: vec![t2],
        ..Record::default()
    })
    .await
    .unwrap();
}

// ============================================================================
// Discovery endpoint
// ============================================================================

#[tokio::test]
async fn test_discovery_serves_active_records_as_json() {
    let tmp = TempDir::new().unwrap();
    let (router, db) = test_router(&tmp).await;
    seed_node_targets(&db).await;

    let (status, content_type, body) = get(&router, "/node-targets.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        body,
        r#"[{"targets":["10.0.0.1:9100"],"labels":{"env":"prod"}}]"#
    );
}

#[tokio::test]
async fn test_discovery_unknown_file_returns_empty_array() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    let (status, _, body) = get(&router, "/ghost.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_discovery_blank_name_is_unprocessable() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    let (status, _, body) = get(&router, "/.json").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_discovery_requires_json_suffix() {
    let tmp = TempDir::new().unwrap();
    let (router, db) = test_router(&tmp).await;
    seed_node_targets(&db).await;

    let (status, _, _) = get(&router, "/node-targets").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = get(&router, "/node-targets.yaml").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Admin API
// ============================================================================

#[tokio::test]
async fn test_create_file_validations() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    let (status, _) =
        send_json(&router, "POST", "/api/files", json!({"file_name": "node-targets"})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        send_json(&router, "POST", "/api/files", json!({"file_name": "node-targets"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already exists"));

    let (status, body) =
        send_json(&router, "POST", "/api/files", json!({"file_name": "bad.json"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("without extension"));

    let (status, _) = send_json(&router, "POST", "/api/files", json!({"file_name": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_lifecycle_over_http() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    send_json(&router, "POST", "/api/files", json!({"file_name": "nodes"})).await;

    // Create a record bound to the file.
    let (status, body) = send_json(
        &router,
        "POST",
        "/api/records",
        json!({
            "name": "web servers",
            "file": "nodes",
            "targets": ["10.0.0.1:9100", "10.0.0.2:9100"],
            "labels": [{"key": "env", "value": "prod"}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let record: Value = serde_json::from_str(&body).unwrap();
    let id = record["id"].as_i64().unwrap();

    let (status, _, body) = get(&router, "/nodes.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"[{"targets":["10.0.0.1:9100","10.0.0.2:9100"],"labels":{"env":"prod"}}]"#
    );

    // Re-assigning the same key replaces the value.
    let (status, _) = send_json(
        &router,
        "POST",
        &format!("/api/records/{id}/labels"),
        json!({"key": "env", "value": "staging"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = get(&router, "/nodes.json").await;
    assert!(body.contains(r#""env":"staging""#));
    assert!(!body.contains("prod"));

    // Disabling via update empties the document.
    let (status, _) = send_json(
        &router,
        "PUT",
        &format!("/api/records/{id}"),
        json!({
            "name": "web servers",
            "file": "nodes",
            "active": false,
            "targets": ["10.0.0.1:9100", "10.0.0.2:9100"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, _, body) = get(&router, "/nodes.json").await;
    assert_eq!(body, "[]");

    // Delete.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/records/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _, _) = get(&router, &format!("/api/records/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_record_with_unknown_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    let (status, body) = send_json(
        &router,
        "POST",
        "/api/records",
        json!({"name": "r", "file": "missing", "targets": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("unknown file"));
}

#[tokio::test]
async fn test_blank_record_name_gets_display_name() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    let (status, body) = send_json(&router, "POST", "/api/records", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let record: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(record["name"], "New Record");
}

#[tokio::test]
async fn test_label_value_narrowing_endpoint() {
    let tmp = TempDir::new().unwrap();
    let (router, db) = test_router(&tmp).await;

    let env = db.label_key_resolve("env").await.unwrap();
    let team = db.label_key_resolve("team").await.unwrap();
    let prod = db.label_value_resolve("prod").await.unwrap();
    let infra = db.label_value_resolve("infra").await.unwrap();
    db.label_commit(&db.label_resolve(&env, &prod).await.unwrap())
        .await
        .unwrap();
    db.label_commit(&db.label_resolve(&team, &infra).await.unwrap())
        .await
        .unwrap();

    let (status, _, body) = get(&router, "/api/labels/keys/env/values").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"["prod"]"#);

    // Unknown key is an empty list, not an error.
    let (status, _, body) = get(&router, "/api/labels/keys/nope/values").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_target_creation_conflicts_on_duplicate() {
    let tmp = TempDir::new().unwrap();
    let (router, _db) = test_router(&tmp).await;

    let (status, _) =
        send_json(&router, "POST", "/api/targets", json!({"value": "db:5432"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) =
        send_json(&router, "POST", "/api/targets", json!({"value": "db:5432"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

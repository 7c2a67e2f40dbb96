//! Generation semantics: active-record filtering, unknown-file degradation,
//! blank-name rejection and deterministic output.

use httpsd_db::SdDb;
use httpsd_protocol::Record;
use httpsd_server::{generate, DiscoveryError};
use tempfile::TempDir;

async fn open_db(tmp: &TempDir) -> SdDb {
    SdDb::open(tmp.path().join("httpsd.db")).await.unwrap()
}

/// File "node-targets" with one active record (one target, env=prod) and
/// one disabled record.
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

#[tokio::test]
async fn test_unknown_file_yields_empty_document() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;

    assert_eq!(generate(&db, "ghost").await.unwrap(), "[]");
}

#[tokio::test]
async fn test_blank_file_name_is_unprocessable() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;

    assert!(matches!(
        generate(&db, "").await,
        Err(DiscoveryError::UnprocessableInput)
    ));
    assert!(matches!(
        generate(&db, "   ").await,
        Err(DiscoveryError::UnprocessableInput)
    ));
}

#[tokio::test]
async fn test_file_without_active_records_yields_empty_document() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;

    let file = db.file_create("quiet").await.unwrap();
    assert_eq!(generate(&db, "quiet").await.unwrap(), "[]");

    db.record_save(&Record {
        name: "off".to_string(),
        file: Some(file),
        active: false,
        ..Record::default()
    })
    .await
    .unwrap();
    assert_eq!(generate(&db, "quiet").await.unwrap(), "[]");
}

#[tokio::test]
async fn test_inactive_records_are_excluded() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;
    seed_node_targets(&db).await;

    let body = generate(&db, "node-targets").await.unwrap();
    assert_eq!(
        body,
        r#"[{"targets":["10.0.0.1:9100"],"labels":{"env":"prod"}}]"#
    );
}

#[tokio::test]
async fn test_record_without_targets_still_emits_entry() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;

    let file = db.file_create("labels-only").await.unwrap();
    let key = db.label_key_resolve("team").await.unwrap();
    let value = db.label_value_resolve("infra").await.unwrap();
    let label = db
        .label_commit(&db.label_resolve(&key, &value).await.unwrap())
        .await
        .unwrap();

    let mut record = Record {
        name: "no-targets".to_string(),
        file: Some(file),
        ..Record::default()
    };
    record.assign_label(label).unwrap();
    db.record_save(&record).await.unwrap();

    let body = generate(&db, "labels-only").await.unwrap();
    assert_eq!(body, r#"[{"targets":[],"labels":{"team":"infra"}}]"#);
}

#[tokio::test]
async fn test_record_without_labels_emits_empty_mapping() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;

    let file = db.file_create("bare").await.unwrap();
    let target = db.target_resolve("10.1.1.1:9090").await.unwrap();
    db.record_save(&Record {
        name: "bare-record".to_string(),
        file: Some(file),
        targets: vec![target],
        ..Record::default()
    })
    .await
    .unwrap();

    let body = generate(&db, "bare").await.unwrap();
    assert_eq!(body, r#"[{"targets":["10.1.1.1:9090"],"labels":{}}]"#);
}

#[tokio::test]
async fn test_generation_is_byte_identical_without_mutation() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;
    seed_node_targets(&db).await;

    let first = generate(&db, "node-targets").await.unwrap();
    let second = generate(&db, "node-targets").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_file_name_is_trimmed_before_lookup() {
    let tmp = TempDir::new().unwrap();
    let db = open_db(&tmp).await;
    seed_node_targets(&db).await;

    let body = generate(&db, " node-targets ").await.unwrap();
    assert!(body.starts_with("[{"));
}

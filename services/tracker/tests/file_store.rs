use production_tracker_core::memory::InMemoryStore;
use production_tracker_core::ports::{DisabledRemote, KeyValueStore};
use production_tracker_core::{clock::SystemClock, ServiceConfig, TrackerService};
use std::path::Path;
use std::sync::Arc;
use tracker_lib::adapters::FileStore;

#[tokio::test]
async fn values_round_trip_and_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    assert_eq!(store.get("halagel_users").await.unwrap(), None);
    store.set("halagel_users", "[]".to_string()).await.unwrap();
    store
        .set("halagel_users", r#"[{"id":"u1"}]"#.to_string())
        .await
        .unwrap();
    assert_eq!(
        store.get("halagel_users").await.unwrap().as_deref(),
        Some(r#"[{"id":"u1"}]"#)
    );

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn removing_a_missing_key_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("nested")).await.unwrap();

    store.remove("halagel_current_user_session").await.unwrap();
    store
        .set("halagel_current_user_session", "{}".to_string())
        .await
        .unwrap();
    store.remove("halagel_current_user_session").await.unwrap();
    assert_eq!(store.get("halagel_current_user_session").await.unwrap(), None);
}

#[tokio::test]
async fn keys_cannot_escape_the_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    assert!(store.get("../etc/passwd").await.is_err());
    assert!(store.set("a/b", String::new()).await.is_err());
    assert!(store.get("").await.is_err());
}

async fn open_service(path: &Path) -> TrackerService {
    let store = FileStore::open(path).await.unwrap();
    let service = TrackerService::new(
        Arc::new(store),
        Arc::new(DisabledRemote),
        Arc::new(SystemClock),
        ServiceConfig::default(),
    );
    service.init().await.unwrap();
    service
}

#[tokio::test]
async fn service_state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = open_service(dir.path()).await;
    first.save_off_days(vec![]).await.unwrap();
    first.shutdown().await;

    let second = open_service(dir.path()).await;
    assert!(second.get_off_days().await.is_empty());
    assert_eq!(second.get_users().await.len(), 5);
}

#[tokio::test]
async fn corrupt_blob_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    store
        .set("halagel_production", "{not json".to_string())
        .await
        .unwrap();

    let service = TrackerService::new(
        Arc::new(store),
        Arc::new(DisabledRemote),
        Arc::new(SystemClock),
        ServiceConfig::default(),
    );
    assert!(service.get_production_data().await.is_empty());

    // The in-memory backend behaves the same way.
    let memory = InMemoryStore::with_entries([("halagel_production", "42")]);
    let service = TrackerService::new(
        Arc::new(memory),
        Arc::new(DisabledRemote),
        Arc::new(SystemClock),
        ServiceConfig::default(),
    );
    assert!(service.get_production_data().await.is_empty());
}

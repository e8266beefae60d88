//! Integration tests for the component store
//!
//! Tests cover:
//! - Append/scan ordering and id assignment
//! - Kind-filtered scans
//! - Reset lifecycle
//! - Concurrent appends from many workers
//! - Cross-handle persistence and read-only access
//! - Failure mapping to StoreUnavailable / InvalidRecord

use chipdb_common::{ComponentFilter, ComponentKind, ComponentStore, Error, NewComponent};
use std::collections::HashSet;
use tempfile::TempDir;
use tokio::task::JoinSet;

fn record(kind: ComponentKind, name: &str) -> NewComponent {
    NewComponent::new(kind, name, None).unwrap()
}

fn assign(name: &str, expression: &str) -> NewComponent {
    NewComponent::new(ComponentKind::Assign, name, Some(expression.to_string())).unwrap()
}

#[tokio::test]
async fn test_append_returns_increasing_ids_and_scan_preserves_order() {
    let store = ComponentStore::open_in_memory().await.unwrap();

    let first = store.append(&record(ComponentKind::Module, "alu")).await.unwrap();
    let second = store.append(&record(ComponentKind::Input, "a")).await.unwrap();
    let third = store.append(&assign("sum", "a + b")).await.unwrap();
    assert!(first < second && second < third);

    let all = store.scan(&ComponentFilter::all()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first, second, third]);

    assert_eq!(all[0].kind, ComponentKind::Module);
    assert_eq!(all[0].name, "alu");
    assert_eq!(all[0].detail, None);
    assert_eq!(all[2].kind, ComponentKind::Assign);
    assert_eq!(all[2].detail.as_deref(), Some("a + b"));
}

#[tokio::test]
async fn test_filtered_scan_returns_only_requested_kind_in_order() {
    let store = ComponentStore::open_in_memory().await.unwrap();

    store.append(&record(ComponentKind::Wire, "w0")).await.unwrap();
    store.append(&record(ComponentKind::Input, "in0")).await.unwrap();
    store.append(&record(ComponentKind::Wire, "w1")).await.unwrap();
    store.append(&assign("w0", "in0")).await.unwrap();
    store.append(&record(ComponentKind::Wire, "w2")).await.unwrap();

    let wires = store
        .scan(&ComponentFilter::kind(ComponentKind::Wire))
        .await
        .unwrap();
    let names: Vec<&str> = wires.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["w0", "w1", "w2"]);
    assert!(wires.iter().all(|c| c.kind == ComponentKind::Wire));

    let outputs = store
        .scan(&ComponentFilter::kind(ComponentKind::Output))
        .await
        .unwrap();
    assert!(outputs.is_empty());

    assert_eq!(
        store.count(&ComponentFilter::kind(ComponentKind::Wire)).await.unwrap(),
        3
    );
    assert_eq!(store.count(&ComponentFilter::all()).await.unwrap(), 5);
}

#[tokio::test]
async fn test_reset_discards_records_and_restarts_ids() {
    let store = ComponentStore::open_in_memory().await.unwrap();

    store.append(&record(ComponentKind::Wire, "old")).await.unwrap();
    store.append(&record(ComponentKind::Wire, "older")).await.unwrap();

    store.reset().await.unwrap();
    assert_eq!(store.count(&ComponentFilter::all()).await.unwrap(), 0);

    let id = store.append(&record(ComponentKind::Wire, "fresh")).await.unwrap();
    assert_eq!(id, 1);

    let all = store.scan(&ComponentFilter::all()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "fresh");
}

#[tokio::test]
async fn test_concurrent_appends_lose_nothing() {
    const WORKERS: usize = 8;
    const PER_WORKER: usize = 25;

    let dir = TempDir::new().unwrap();
    let store = ComponentStore::open(&dir.path().join("concurrent.db"))
        .await
        .unwrap();
    store.reset().await.unwrap();

    let mut join_set = JoinSet::new();
    for worker in 0..WORKERS {
        let store = store.clone();
        join_set.spawn(async move {
            let mut ids = Vec::with_capacity(PER_WORKER);
            for i in 0..PER_WORKER {
                let name = format!("w{worker}_{i}");
                let id = store
                    .append(&record(ComponentKind::Wire, &name))
                    .await
                    .expect("append should succeed under contention");
                ids.push(id);
            }
            ids
        });
    }

    let mut all_ids = Vec::new();
    while let Some(result) = join_set.join_next().await {
        let ids = result.expect("worker panicked");
        // Each worker's own appends keep their order
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        all_ids.extend(ids);
    }

    let total = WORKERS * PER_WORKER;
    assert_eq!(all_ids.len(), total);
    let distinct: HashSet<i64> = all_ids.iter().copied().collect();
    assert_eq!(distinct.len(), total, "ids must be unique");

    let stored = store.scan(&ComponentFilter::all()).await.unwrap();
    assert_eq!(stored.len(), total);
    let stored_names: HashSet<String> = stored.into_iter().map(|c| c.name).collect();
    assert_eq!(stored_names.len(), total);
}

#[tokio::test]
async fn test_records_persist_across_handles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("chip_design.db");

    let writer = ComponentStore::open(&path).await.unwrap();
    writer.reset().await.unwrap();
    writer.append(&record(ComponentKind::Module, "top")).await.unwrap();
    writer.append(&assign("y", "a & b")).await.unwrap();
    writer.close().await;

    // Reopening must not reset
    let reopened = ComponentStore::open(&path).await.unwrap();
    assert_eq!(reopened.count(&ComponentFilter::all()).await.unwrap(), 2);
    reopened.close().await;

    let reader = ComponentStore::open_read_only(&path).await.unwrap();
    let all = reader.scan(&ComponentFilter::all()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].detail.as_deref(), Some("a & b"));
}

#[tokio::test]
async fn test_read_only_store_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ro.db");

    let writer = ComponentStore::open(&path).await.unwrap();
    writer.append(&record(ComponentKind::Wire, "w")).await.unwrap();
    writer.close().await;

    let reader = ComponentStore::open_read_only(&path).await.unwrap();
    let err = reader
        .append(&record(ComponentKind::Wire, "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable { .. }));
}

#[tokio::test]
async fn test_read_only_open_of_missing_store_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = ComponentStore::open_read_only(&dir.path().join("missing.db"))
        .await
        .err()
        .expect("missing store must not open");
    assert!(matches!(err, Error::StoreUnavailable { .. }));
    assert!(err.to_string().contains("missing.db"));
}

#[tokio::test]
async fn test_closed_store_reports_unavailable() {
    let store = ComponentStore::open_in_memory().await.unwrap();
    store.close().await;

    let err = store
        .append(&record(ComponentKind::Wire, "late"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable { .. }));

    let err = store.scan(&ComponentFilter::all()).await.unwrap_err();
    assert!(matches!(err, Error::StoreUnavailable { .. }));
}

#[tokio::test]
async fn test_append_fields_rejects_invalid_records_before_store() {
    let store = ComponentStore::open_in_memory().await.unwrap();

    let err = store
        .append_fields(ComponentKind::Wire, "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRecord(_)));

    let err = store
        .append_fields(ComponentKind::Input, "clk", Some("1'b0"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRecord(_)));

    assert_eq!(store.count(&ComponentFilter::all()).await.unwrap(), 0);

    let id = store
        .append_fields(ComponentKind::Assign, "q", Some("d"))
        .await
        .unwrap();
    assert_eq!(id, 1);
}

#[tokio::test]
async fn test_names_are_stored_verbatim() {
    let store = ComponentStore::open_in_memory().await.unwrap();
    let tricky = "it's \"quoted\"; DROP TABLE components; --";

    store
        .append_fields(ComponentKind::Module, tricky, None)
        .await
        .unwrap();

    let all = store.scan(&ComponentFilter::all()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, tricky);
}

//! End-to-end tests for diff projection and synchronization units.

mod common;

use canopy_index::{CatalogRepo, IndexError, RecordRepo, RepoRootRepo};
use canopy_sync::{
    DataDiff, DiffProjector, MemoryBlockStore, NoopNotifier, SyncCoordinator, SyncError,
};
use common::{FailingNotifier, RecordingNotifier, addr, did, memory_store, root_cid};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_end_to_end_first_sync() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let address = addr("did:example:alice/app.feed.post/3k2a");

    let cid = blocks.put_record(&json!({"text": "hello"})).await.unwrap();
    let mut diff = DataDiff::new();
    diff.add("app.feed.post/3k2a", cid);

    let notifier = Arc::new(RecordingNotifier::new(store.clone(), address.clone()));
    let coordinator = SyncCoordinator::new(store.clone(), notifier.clone());
    let root = root_cid(1);

    assert!(store.get_repo_root(&alice).await.unwrap().is_none());
    let outcome = coordinator.sync(&alice, root, &diff, &blocks).await.unwrap();

    assert!(outcome.is_new_repo());
    assert_eq!(outcome.summary.indexed, 1);
    assert_eq!(outcome.summary.deleted, 0);

    assert_eq!(
        store.get_record(&address).await.unwrap(),
        Some(json!({"text": "hello"}))
    );
    let collections = store.list_collections(&alice).await.unwrap();
    assert!(collections.contains(&"app.feed.post".to_string()));
    assert_eq!(store.get_repo_root(&alice).await.unwrap(), Some(root));

    // Subscribers saw the projected record but not yet the committed root.
    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].did, alice);
    assert_eq!(seen[0].root, root);
    assert_eq!(seen[0].stored_root, None);
    assert_eq!(seen[0].record, Some(json!({"text": "hello"})));
}

#[tokio::test]
async fn test_update_and_delete_follow_up_sync() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(NoopNotifier));

    let post_v1 = blocks.put_record(&json!({"text": "draft"})).await.unwrap();
    let like = blocks
        .put_record(&json!({"subject": "did:example:bob/app.feed.post/001"}))
        .await
        .unwrap();
    let mut first = DataDiff::new();
    first
        .add("app.feed.post/001", post_v1)
        .add("app.feed.like/002", like);
    coordinator
        .sync(&alice, root_cid(1), &first, &blocks)
        .await
        .unwrap();

    let post_v2 = blocks.put_record(&json!({"text": "final"})).await.unwrap();
    let mut second = DataDiff::new();
    second
        .update("app.feed.post/001", post_v2)
        .delete("app.feed.like/002", like);
    let outcome = coordinator
        .sync(&alice, root_cid(2), &second, &blocks)
        .await
        .unwrap();

    assert!(!outcome.is_new_repo());
    assert_eq!(outcome.previous_root, Some(root_cid(1)));
    assert_eq!(outcome.summary.indexed, 1);
    assert_eq!(outcome.summary.deleted, 1);

    assert_eq!(
        store
            .get_record(&addr("did:example:alice/app.feed.post/001"))
            .await
            .unwrap(),
        Some(json!({"text": "final"}))
    );
    let like_addr = addr("did:example:alice/app.feed.like/002");
    assert!(store.get_record(&like_addr).await.unwrap().is_none());
    assert!(store.get_catalog_entry(&like_addr).await.unwrap().is_none());
    assert_eq!(
        store.list_collections(&alice).await.unwrap(),
        vec!["app.feed.post"]
    );
    assert_eq!(store.get_repo_root(&alice).await.unwrap(), Some(root_cid(2)));
}

#[tokio::test]
async fn test_unknown_collection_fails_unit_without_commit() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(NoopNotifier));

    let cid = blocks.put_record(&json!({"text": "x"})).await.unwrap();
    let mut diff = DataDiff::new();
    diff.add("bogus.type/001", cid);

    let err = coordinator
        .sync(&alice, root_cid(1), &diff, &blocks)
        .await
        .unwrap_err();

    match &err {
        SyncError::Projection { key, .. } => assert_eq!(key, "bogus.type/001"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        err.index_error(),
        Some(IndexError::UnknownCollection(name)) if name == "bogus.type"
    ));
    assert!(store.get_repo_root(&alice).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unqualified_key_is_malformed_address() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let projector = DiffProjector::new(store.clone());

    let cid = blocks.put_record(&json!({"text": "x"})).await.unwrap();
    let mut diff = DataDiff::new();
    diff.delete("no-collection", cid);

    let err = projector.project(&alice, &diff, &blocks).await.unwrap_err();
    assert!(err.index_error().unwrap().is_malformed_address());
}

#[tokio::test]
async fn test_missing_block_fails_entry() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let projector = DiffProjector::new(store.clone());

    let mut diff = DataDiff::new();
    diff.add("app.feed.post/001", root_cid(9));

    let err = projector.project(&alice, &diff, &blocks).await.unwrap_err();
    assert!(matches!(err.root_cause(), SyncError::BlockNotFound(cid) if *cid == root_cid(9)));
}

#[tokio::test]
async fn test_notification_failure_keeps_projection_but_not_root() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(FailingNotifier));

    let cid = blocks.put_record(&json!({"text": "hello"})).await.unwrap();
    let mut diff = DataDiff::new();
    diff.add("app.feed.post/001", cid);

    let err = coordinator
        .sync(&alice, root_cid(1), &diff, &blocks)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Notify(_)));

    assert!(
        store
            .get_record(&addr("did:example:alice/app.feed.post/001"))
            .await
            .unwrap()
            .is_some()
    );
    assert!(store.get_repo_root(&alice).await.unwrap().is_none());
}

#[tokio::test]
async fn test_partial_failure_then_replay_is_idempotent() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(NoopNotifier));

    let good = blocks.put_record(&json!({"text": "good"})).await.unwrap();
    let missing = root_cid(42);
    let mut diff = DataDiff::new();
    diff.add("app.feed.post/001", good)
        .add("app.feed.post/002", missing);

    assert!(
        coordinator
            .sync(&alice, root_cid(1), &diff, &blocks)
            .await
            .is_err()
    );
    assert!(store.get_repo_root(&alice).await.unwrap().is_none());

    // Supply the missing block and re-drive the same diff.
    let recovered = blocks.put_record(&json!({"text": "late"})).await.unwrap();
    let mut replay = DataDiff::new();
    replay
        .add("app.feed.post/001", good)
        .add("app.feed.post/002", recovered);
    coordinator
        .sync(&alice, root_cid(1), &replay, &blocks)
        .await
        .unwrap();
    coordinator
        .sync(&alice, root_cid(1), &replay, &blocks)
        .await
        .unwrap();

    let records = store
        .list_records(&alice, "app.feed.post", 10, None)
        .await
        .unwrap();
    assert_eq!(records, vec![json!({"text": "late"}), json!({"text": "good"})]);
    assert_eq!(store.get_repo_root(&alice).await.unwrap(), Some(root_cid(1)));
}

#[tokio::test]
async fn test_many_entries_project_concurrently() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let projector = DiffProjector::new(store.clone());

    let mut diff = DataDiff::new();
    for i in 0..50 {
        let cid = blocks
            .put_record(&json!({"text": format!("post {i}")}))
            .await
            .unwrap();
        diff.add(format!("app.feed.post/{i:03}"), cid);
    }

    let summary = projector.project(&alice, &diff, &blocks).await.unwrap();
    assert_eq!(summary.indexed, 50);

    let newest = store
        .list_records(&alice, "app.feed.post", 3, None)
        .await
        .unwrap();
    assert_eq!(
        newest,
        vec![
            json!({"text": "post 49"}),
            json!({"text": "post 48"}),
            json!({"text": "post 47"}),
        ]
    );
}

#[tokio::test]
async fn test_empty_diff_still_commits_root() {
    let store = memory_store().await;
    let blocks = MemoryBlockStore::new();
    let alice = did("did:example:alice");
    let coordinator = SyncCoordinator::new(store.clone(), Arc::new(NoopNotifier));

    let outcome = coordinator
        .sync(&alice, root_cid(7), &DataDiff::new(), &blocks)
        .await
        .unwrap();
    assert_eq!(outcome.summary, Default::default());
    assert_eq!(store.get_repo_root(&alice).await.unwrap(), Some(root_cid(7)));
}

//! Shared fixtures for synchronization tests.

#![allow(dead_code)]

use async_trait::async_trait;
use canopy_core::{Cid, Did, RecordAddress};
use canopy_index::{CollectionRegistry, IndexStore, RecordRepo, RepoRootRepo, SqliteIndex};
use canopy_sync::{SubscriberNotifier, SyncError, SyncResult};
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub async fn memory_store() -> Arc<dyn IndexStore> {
    let store = SqliteIndex::in_memory(CollectionRegistry::standard())
        .await
        .expect("Failed to create in-memory index");
    Arc::new(store)
}

pub fn did(s: &str) -> Did {
    Did::parse(s).expect("valid did")
}

pub fn addr(s: &str) -> RecordAddress {
    RecordAddress::parse(s).expect("valid address")
}

pub fn root_cid(seed: u8) -> Cid {
    canopy_core::content_id::cid_from_sha256(&[seed; 32]).expect("valid cid")
}

/// What the index looked like when a notification arrived.
#[derive(Debug, Clone)]
pub struct Observed {
    pub did: Did,
    pub root: Cid,
    pub stored_root: Option<Cid>,
    pub record: Option<Value>,
}

/// Notifier that snapshots the index at notification time.
pub struct RecordingNotifier {
    store: Arc<dyn IndexStore>,
    watch: RecordAddress,
    pub seen: Mutex<Vec<Observed>>,
}

impl RecordingNotifier {
    pub fn new(store: Arc<dyn IndexStore>, watch: RecordAddress) -> Self {
        Self {
            store,
            watch,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Observed> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriberNotifier for RecordingNotifier {
    async fn notify(&self, did: &Did, root: &Cid) -> SyncResult<()> {
        let stored_root = self.store.get_repo_root(did).await?;
        let record = self.store.get_record(&self.watch).await?;
        self.seen.lock().unwrap().push(Observed {
            did: did.clone(),
            root: *root,
            stored_root,
            record,
        });
        Ok(())
    }
}

/// Notifier whose delivery always fails.
pub struct FailingNotifier;

#[async_trait]
impl SubscriberNotifier for FailingNotifier {
    async fn notify(&self, _did: &Did, _root: &Cid) -> SyncResult<()> {
        Err(SyncError::Notify("subscriber endpoint unreachable".to_string()))
    }
}

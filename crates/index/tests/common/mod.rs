//! Shared test utilities for index store tests.

#![allow(dead_code)]

use canopy_core::{Cid, Did, RecordAddress};
use canopy_index::{CollectionRegistry, IndexResult, IndexStore, SqliteIndex};
use std::sync::Arc;
use tempfile::TempDir;

/// A test index store wrapper that cleans up on drop.
pub struct TestIndex {
    pub store: Arc<SqliteIndex>,
    _temp_dir: Option<TempDir>,
}

impl TestIndex {
    /// File-backed SQLite index in a temporary directory.
    pub async fn on_disk() -> IndexResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("index.db");
        let store = SqliteIndex::new(&db_path, 5, CollectionRegistry::standard()).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        })
    }

    /// In-memory SQLite index (faster for tests).
    pub async fn in_memory() -> IndexResult<Self> {
        let store = SqliteIndex::in_memory(CollectionRegistry::standard()).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: None,
        })
    }

    pub fn store(&self) -> Arc<dyn IndexStore> {
        self.store.clone()
    }
}

pub fn did(s: &str) -> Did {
    Did::parse(s).expect("valid did")
}

pub fn addr(s: &str) -> RecordAddress {
    RecordAddress::parse(s).expect("valid address")
}

/// Deterministic CID for a seed string.
pub fn test_cid(seed: &str) -> Cid {
    let mut digest = [0u8; 32];
    for (i, b) in seed.bytes().enumerate() {
        digest[i % 32] ^= b.wrapping_add(i as u8);
    }
    canopy_core::content_id::cid_from_sha256(&digest).expect("valid cid")
}

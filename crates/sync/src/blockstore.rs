//! Content-addressed block store seam.
//!
//! Blocks handed to the projector have already been verified by the
//! repository layer, so reads here never re-check hashes.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use bytes::Bytes;
use canopy_core::Cid;
use canopy_core::content_id::cid_from_sha256;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Read access to verified repository blocks.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Get a block's bytes without verifying them against `cid`.
    async fn get_unchecked(&self, cid: &Cid) -> SyncResult<Option<Bytes>>;
}

/// Decode a record block. Records are DAG-JSON objects.
pub fn decode_record(cid: &Cid, bytes: &[u8]) -> SyncResult<Value> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| SyncError::InvalidBlock {
        cid: *cid,
        reason: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(SyncError::InvalidBlock {
            cid: *cid,
            reason: "record is not an object".to_string(),
        });
    }
    Ok(value)
}

/// In-memory block store.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Bytes>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under `cid`.
    pub async fn put(&self, cid: Cid, data: Bytes) {
        self.blocks.write().await.insert(cid, data);
    }

    /// Encode a record as DAG-JSON, store it, and return its CID.
    pub async fn put_record(&self, record: &Value) -> SyncResult<Cid> {
        let data = serde_json::to_vec(record).map_err(|e| SyncError::BlockStore(e.to_string()))?;
        let cid = cid_from_sha256(&Sha256::digest(&data))
            .map_err(|e| SyncError::BlockStore(e.to_string()))?;
        self.put(cid, Bytes::from(data)).await;
        Ok(cid)
    }

    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn get_unchecked(&self, cid: &Cid) -> SyncResult<Option<Bytes>> {
        Ok(self.blocks.read().await.get(cid).cloned())
    }
}

//! Applies a verified diff to the record index.

use crate::blockstore::{BlockStore, decode_record};
use crate::diff::{DataDiff, DiffEntry};
use crate::error::{SyncError, SyncResult};
use canopy_core::{Did, RecordAddress};
use canopy_index::{IndexStore, RecordRepo};
use futures::future::try_join_all;
use std::sync::Arc;

/// Counts of what a projection changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionSummary {
    /// Added and updated records written to the index.
    pub indexed: usize,
    /// Records removed from the index.
    pub deleted: usize,
}

/// Projects diffs into the index.
///
/// Every entry is dispatched at once and awaited jointly; entries of one diff
/// target distinct addresses, so their order does not affect the result.
/// Each entry's handler row and catalog entry are written in one
/// transaction, but the diff as a whole is not: when an entry fails, entries
/// that already finished stay applied. Re-projecting the same diff is safe.
#[derive(Clone)]
pub struct DiffProjector {
    store: Arc<dyn IndexStore>,
}

impl DiffProjector {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Project `diff` for `did`, resolving record content from `blocks`.
    /// Surfaces the first entry failure.
    pub async fn project(
        &self,
        did: &Did,
        diff: &DataDiff,
        blocks: &dyn BlockStore,
    ) -> SyncResult<ProjectionSummary> {
        // Adds and updates are the same operation at this layer.
        let writes = diff
            .added_entries()
            .iter()
            .chain(diff.updated_entries())
            .map(|entry| self.write_entry(did, entry, blocks));
        let deletes = diff
            .deleted_entries()
            .iter()
            .map(|entry| self.delete_entry(did, entry));

        let (written, deleted) = futures::try_join!(try_join_all(writes), try_join_all(deletes))?;

        let summary = ProjectionSummary {
            indexed: written.len(),
            deleted: deleted.len(),
        };
        tracing::debug!(
            did = %did,
            indexed = summary.indexed,
            deleted = summary.deleted,
            "Projected diff"
        );
        Ok(summary)
    }

    async fn write_entry(
        &self,
        did: &Did,
        entry: &DiffEntry,
        blocks: &dyn BlockStore,
    ) -> SyncResult<()> {
        self.try_write_entry(did, entry, blocks)
            .await
            .map_err(|e| SyncError::projection(&entry.key, e))
    }

    async fn try_write_entry(
        &self,
        did: &Did,
        entry: &DiffEntry,
        blocks: &dyn BlockStore,
    ) -> SyncResult<()> {
        let bytes = blocks
            .get_unchecked(&entry.cid)
            .await?
            .ok_or(SyncError::BlockNotFound(entry.cid))?;
        let record = decode_record(&entry.cid, &bytes)?;
        let address = RecordAddress::from_repo_key(did, &entry.key)?;
        self.store.index_record(&address, &record).await?;
        Ok(())
    }

    async fn delete_entry(&self, did: &Did, entry: &DiffEntry) -> SyncResult<()> {
        self.try_delete_entry(did, entry)
            .await
            .map_err(|e| SyncError::projection(&entry.key, e))
    }

    async fn try_delete_entry(&self, did: &Did, entry: &DiffEntry) -> SyncResult<()> {
        let address = RecordAddress::from_repo_key(did, &entry.key)?;
        self.store.delete_record(&address).await?;
        Ok(())
    }
}

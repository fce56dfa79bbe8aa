//! Record repository: typed writes and reads through the collection registry.

use crate::error::IndexResult;
use async_trait::async_trait;
use canopy_core::{Did, RecordAddress};
use serde_json::Value;

/// Repository for indexed record content.
#[async_trait]
pub trait RecordRepo: Send + Sync {
    /// Store `record` at `address` and catalog it.
    /// Fails with `UnknownCollection` when no handler exists for the
    /// address's collection, or `InvalidRecord` when the content does not
    /// match the collection's shape.
    async fn index_record(&self, address: &RecordAddress, record: &Value) -> IndexResult<()>;

    /// Remove the record and its catalog entry. Removing an absent record
    /// succeeds.
    async fn delete_record(&self, address: &RecordAddress) -> IndexResult<()>;

    /// Get the decoded record at `address`.
    async fn get_record(&self, address: &RecordAddress) -> IndexResult<Option<Value>>;

    /// Records of one collection, newest first, paginated by an inclusive
    /// record-key cursor.
    async fn list_records(
        &self,
        did: &Did,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> IndexResult<Vec<Value>>;
}

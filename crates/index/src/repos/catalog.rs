//! Record catalog repository.

use crate::error::IndexResult;
use crate::models::CatalogEntryRow;
use async_trait::async_trait;
use canopy_core::{Did, RecordAddress};

/// Cross-collection catalog of every indexed record.
///
/// Read-only: entries are written only by [`RecordRepo`](crate::RecordRepo),
/// in the same transaction as the collection's row, so an entry exists for an
/// address exactly when the collection's handler holds a row.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Get the catalog entry for an address.
    async fn get_catalog_entry(
        &self,
        address: &RecordAddress,
    ) -> IndexResult<Option<CatalogEntryRow>>;

    /// Distinct collections holding at least one record for `did`, sorted.
    async fn list_collections(&self, did: &Did) -> IndexResult<Vec<String>>;

    /// Up to `limit` addresses in `collection` whose record key is `<= cursor`,
    /// newest (largest key) first. `None` starts from the most recent record.
    async fn list_addresses(
        &self,
        did: &Did,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> IndexResult<Vec<RecordAddress>>;
}

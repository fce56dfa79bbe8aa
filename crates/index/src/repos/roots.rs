//! Repository root pointer repository.

use crate::error::IndexResult;
use crate::models::RepoRootRow;
use async_trait::async_trait;
use canopy_core::{Cid, Did};

/// Current root CID per identity. Only the latest root is kept.
#[async_trait]
pub trait RepoRootRepo: Send + Sync {
    /// Get the current root for `did`.
    async fn get_repo_root(&self, did: &Did) -> IndexResult<Option<Cid>>;

    /// Get the stored root row, including when it was last updated.
    async fn get_repo_root_row(&self, did: &Did) -> IndexResult<Option<RepoRootRow>>;

    /// Create or overwrite the root for `did`.
    async fn set_repo_root(&self, did: &Did, root: &Cid) -> IndexResult<()>;
}

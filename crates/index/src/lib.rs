//! Relational index over per-identity record repositories.
//!
//! This crate provides the derived, queryable side of a repository:
//! - Per-collection index handlers with typed rows
//! - A closed registry mapping collection names to handlers
//! - The cross-collection record catalog used for discovery and listing
//! - The current root pointer per identity

pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod repos;
pub mod store;

pub use error::{IndexError, IndexResult};
pub use handlers::IndexHandler;
pub use registry::CollectionRegistry;
pub use repos::{CatalogRepo, RecordRepo, RepoRootRepo};
pub use store::{IndexStore, SqliteIndex};

use canopy_core::config::IndexConfig;
use std::sync::Arc;

/// Create an index store from configuration.
pub async fn from_config(
    config: &IndexConfig,
    registry: CollectionRegistry,
) -> IndexResult<Arc<dyn IndexStore>> {
    config.validate().map_err(IndexError::Config)?;

    match config {
        IndexConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteIndex::new(path, *busy_timeout_secs, registry).await?;
            Ok(Arc::new(store) as Arc<dyn IndexStore>)
        }
        IndexConfig::Memory => {
            tracing::warn!("Using an in-memory index; all indexed state is lost on exit");
            let store = SqliteIndex::in_memory(registry).await?;
            Ok(Arc::new(store) as Arc<dyn IndexStore>)
        }
    }
}

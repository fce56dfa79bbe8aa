//! Index store trait and the SQLite implementation.

use crate::error::{IndexError, IndexResult};
use crate::registry::CollectionRegistry;
use crate::repos::{CatalogRepo, RecordRepo, RepoRootRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined index store trait.
#[async_trait]
pub trait IndexStore: RecordRepo + CatalogRepo + RepoRootRepo + Send + Sync {
    /// Create the catalog, root and per-collection tables if missing.
    async fn migrate(&self) -> IndexResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> IndexResult<()>;

    /// The collection registry this store was built with.
    fn registry(&self) -> &CollectionRegistry;
}

/// SQLite-backed index store.
pub struct SqliteIndex {
    pool: Pool<Sqlite>,
    registry: CollectionRegistry,
}

impl SqliteIndex {
    /// Open (or create) an index database file.
    pub async fn new(
        path: impl AsRef<Path>,
        busy_timeout_secs: u64,
        registry: CollectionRegistry,
    ) -> IndexResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(busy_timeout_secs));

        // Diff projection dispatches every entry at once; a single connection
        // makes those transactions queue instead of failing on a locked database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        tracing::info!(path = %path.display(), "Opened SQLite index");
        Self::with_pool(pool, registry).await
    }

    /// Open a private in-memory index. Contents are dropped with the store.
    pub async fn in_memory(registry: CollectionRegistry) -> IndexResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // The database lives only as long as its one connection, so never
        // let the pool recycle it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        Self::with_pool(pool, registry).await
    }

    async fn with_pool(pool: Pool<Sqlite>, registry: CollectionRegistry) -> IndexResult<Self> {
        let store = Self { pool, registry };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl IndexStore for SqliteIndex {
    async fn migrate(&self) -> IndexResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        for handler in self.registry.handlers() {
            sqlx::query(handler.schema()).execute(&self.pool).await?;
            tracing::debug!(collection = handler.collection(), "Ensured collection table");
        }
        Ok(())
    }

    async fn health_check(&self) -> IndexResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }
}

// Implement all the repository traits for SqliteIndex
mod sqlite_impl {
    use super::*;
    use crate::models::{CatalogEntryRow, RepoRootRow};
    use canopy_core::{Cid, Did, MAX_RECORD_KEY_CURSOR, RecordAddress, parse_cid};
    use serde_json::Value;
    use sqlx::SqliteConnection;
    use time::OffsetDateTime;

    async fn upsert_entry(conn: &mut SqliteConnection, entry: &CatalogEntryRow) -> IndexResult<()> {
        sqlx::query(
            r#"
            INSERT INTO records (uri, did, collection, tid, indexed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uri) DO UPDATE SET indexed_at = excluded.indexed_at
            "#,
        )
        .bind(&entry.uri)
        .bind(&entry.did)
        .bind(&entry.collection)
        .bind(&entry.tid)
        .bind(entry.indexed_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn remove_entry(conn: &mut SqliteConnection, address: &RecordAddress) -> IndexResult<()> {
        sqlx::query("DELETE FROM records WHERE uri = ?")
            .bind(address.to_string())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    #[async_trait]
    impl CatalogRepo for SqliteIndex {
        async fn get_catalog_entry(
            &self,
            address: &RecordAddress,
        ) -> IndexResult<Option<CatalogEntryRow>> {
            let row = sqlx::query_as::<_, CatalogEntryRow>("SELECT * FROM records WHERE uri = ?")
                .bind(address.to_string())
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_collections(&self, did: &Did) -> IndexResult<Vec<String>> {
            let rows: Vec<String> = sqlx::query_scalar(
                "SELECT DISTINCT collection FROM records WHERE did = ? ORDER BY collection",
            )
            .bind(did.as_str())
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn list_addresses(
            &self,
            did: &Did,
            collection: &str,
            limit: u32,
            cursor: Option<&str>,
        ) -> IndexResult<Vec<RecordAddress>> {
            let uris: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT uri FROM records
                WHERE did = ? AND collection = ? AND tid <= ?
                ORDER BY tid DESC
                LIMIT ?
                "#,
            )
            .bind(did.as_str())
            .bind(collection)
            .bind(cursor.unwrap_or(MAX_RECORD_KEY_CURSOR))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

            uris.iter()
                .map(|uri| {
                    RecordAddress::parse(uri).map_err(|e| {
                        IndexError::Internal(format!("catalog holds malformed uri '{uri}': {e}"))
                    })
                })
                .collect()
        }
    }

    #[async_trait]
    impl RecordRepo for SqliteIndex {
        async fn index_record(&self, address: &RecordAddress, record: &Value) -> IndexResult<()> {
            let handler = self.registry.resolve(address.collection())?;
            let entry = CatalogEntryRow::new(address, OffsetDateTime::now_utc());

            // Handler row and catalog entry commit together or not at all.
            let mut tx = self.pool.begin().await?;
            handler.set(&mut tx, address, record).await?;
            upsert_entry(&mut tx, &entry).await?;
            tx.commit().await?;

            tracing::debug!(uri = %address, "Indexed record");
            Ok(())
        }

        async fn delete_record(&self, address: &RecordAddress) -> IndexResult<()> {
            let handler = self.registry.resolve(address.collection())?;

            let mut tx = self.pool.begin().await?;
            handler.delete(&mut tx, address).await?;
            remove_entry(&mut tx, address).await?;
            tx.commit().await?;

            tracing::debug!(uri = %address, "Deleted record");
            Ok(())
        }

        async fn get_record(&self, address: &RecordAddress) -> IndexResult<Option<Value>> {
            let handler = self.registry.resolve(address.collection())?;
            let mut conn = self.pool.acquire().await?;
            handler.get(&mut conn, address).await
        }

        async fn list_records(
            &self,
            did: &Did,
            collection: &str,
            limit: u32,
            cursor: Option<&str>,
        ) -> IndexResult<Vec<Value>> {
            let handler = self.registry.resolve(collection)?;
            let addresses = self.list_addresses(did, collection, limit, cursor).await?;
            if addresses.is_empty() {
                return Ok(Vec::new());
            }
            let mut conn = self.pool.acquire().await?;
            handler.get_many(&mut conn, &addresses).await
        }
    }

    #[async_trait]
    impl RepoRootRepo for SqliteIndex {
        async fn get_repo_root(&self, did: &Did) -> IndexResult<Option<Cid>> {
            let Some(row) = self.get_repo_root_row(did).await? else {
                return Ok(None);
            };
            let root = parse_cid(&row.root).map_err(|e| {
                IndexError::Internal(format!("stored root for {did} is unreadable: {e}"))
            })?;
            Ok(Some(root))
        }

        async fn get_repo_root_row(&self, did: &Did) -> IndexResult<Option<RepoRootRow>> {
            let row = sqlx::query_as::<_, RepoRootRow>("SELECT * FROM repo_roots WHERE did = ?")
                .bind(did.as_str())
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn set_repo_root(&self, did: &Did, root: &Cid) -> IndexResult<()> {
            sqlx::query(
                r#"
                INSERT INTO repo_roots (did, root, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(did) DO UPDATE SET
                    root = excluded.root,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(did.as_str())
            .bind(root.to_string())
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;

            tracing::debug!(did = %did, root = %root, "Set repository root");
            Ok(())
        }
    }
}

/// SQL schema for the catalog and root tables. Per-collection tables come
/// from the registered handlers.
const SCHEMA_SQL: &str = r#"
-- Current repository root per identity
CREATE TABLE IF NOT EXISTS repo_roots (
    did TEXT PRIMARY KEY,
    root TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Catalog of every indexed record across collections
CREATE TABLE IF NOT EXISTS records (
    uri TEXT PRIMARY KEY,
    did TEXT NOT NULL,
    collection TEXT NOT NULL,
    tid TEXT NOT NULL,
    indexed_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_listing ON records(did, collection, tid);
"#;

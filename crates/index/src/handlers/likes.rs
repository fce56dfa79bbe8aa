//! `app.feed.like` index.

use super::{BATCH_SIZE, IndexHandler, decode_record, encode_record, in_address_order, placeholders};
use crate::error::{IndexError, IndexResult};
use crate::models::LikeRow;
use async_trait::async_trait;
use canopy_core::RecordAddress;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use time::OffsetDateTime;

/// A like of another record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Like {
    /// Address of the liked record.
    pub subject: String,
    #[serde(
        default,
        deserialize_with = "super::non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl From<LikeRow> for Like {
    fn from(row: LikeRow) -> Self {
        Self {
            subject: row.subject,
            created_at: row.created_at,
        }
    }
}

/// Index handler for likes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LikeHandler;

impl LikeHandler {
    pub const COLLECTION: &'static str = "app.feed.like";
}

#[async_trait]
impl IndexHandler for LikeHandler {
    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }

    fn schema(&self) -> &'static str {
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            uri TEXT PRIMARY KEY,
            did TEXT NOT NULL,
            subject TEXT NOT NULL,
            created_at TEXT,
            indexed_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_likes_did ON likes(did);
        CREATE INDEX IF NOT EXISTS idx_likes_subject ON likes(subject);
        "#
    }

    async fn set(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
        record: &Value,
    ) -> IndexResult<()> {
        let like: Like = decode_record(Self::COLLECTION, record)?;
        RecordAddress::parse(&like.subject).map_err(|e| IndexError::InvalidRecord {
            collection: Self::COLLECTION.to_string(),
            reason: format!("subject: {e}"),
        })?;
        sqlx::query(
            r#"
            INSERT INTO likes (uri, did, subject, created_at, indexed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uri) DO UPDATE SET
                subject = excluded.subject,
                created_at = excluded.created_at,
                indexed_at = excluded.indexed_at
            "#,
        )
        .bind(address.to_string())
        .bind(address.did().as_str())
        .bind(&like.subject)
        .bind(&like.created_at)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
    ) -> IndexResult<Option<Value>> {
        let row = sqlx::query_as::<_, LikeRow>("SELECT * FROM likes WHERE uri = ?")
            .bind(address.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        row.map(|row| encode_record(&Like::from(row))).transpose()
    }

    async fn get_many(
        &self,
        conn: &mut SqliteConnection,
        addresses: &[RecordAddress],
    ) -> IndexResult<Vec<Value>> {
        let mut found = HashMap::with_capacity(addresses.len());
        for batch in addresses.chunks(BATCH_SIZE) {
            let query = format!(
                "SELECT * FROM likes WHERE uri IN ({})",
                placeholders(batch.len())
            );
            let mut query_builder = sqlx::query_as::<_, LikeRow>(&query);
            for address in batch {
                query_builder = query_builder.bind(address.to_string());
            }
            for row in query_builder.fetch_all(&mut *conn).await? {
                let uri = row.uri.clone();
                found.insert(uri, encode_record(&Like::from(row))?);
            }
        }
        Ok(in_address_order(addresses, found))
    }

    async fn delete(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
    ) -> IndexResult<()> {
        sqlx::query("DELETE FROM likes WHERE uri = ?")
            .bind(address.to_string())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

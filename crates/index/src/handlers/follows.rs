//! `app.graph.follow` index.

use super::{BATCH_SIZE, IndexHandler, decode_record, encode_record, in_address_order, placeholders};
use crate::error::{IndexError, IndexResult};
use crate::models::FollowRow;
use async_trait::async_trait;
use canopy_core::{Did, RecordAddress};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use time::OffsetDateTime;

/// A follow of another identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Follow {
    /// DID of the followed identity.
    pub subject: String,
    #[serde(
        default,
        deserialize_with = "super::non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl From<FollowRow> for Follow {
    fn from(row: FollowRow) -> Self {
        Self {
            subject: row.subject,
            created_at: row.created_at,
        }
    }
}

/// Index handler for follows.
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowHandler;

impl FollowHandler {
    pub const COLLECTION: &'static str = "app.graph.follow";
}

#[async_trait]
impl IndexHandler for FollowHandler {
    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }

    fn schema(&self) -> &'static str {
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            uri TEXT PRIMARY KEY,
            did TEXT NOT NULL,
            subject TEXT NOT NULL,
            created_at TEXT,
            indexed_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_follows_did ON follows(did);
        CREATE INDEX IF NOT EXISTS idx_follows_subject ON follows(subject);
        "#
    }

    async fn set(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
        record: &Value,
    ) -> IndexResult<()> {
        let follow: Follow = decode_record(Self::COLLECTION, record)?;
        Did::parse(follow.subject.as_str()).map_err(|e| IndexError::InvalidRecord {
            collection: Self::COLLECTION.to_string(),
            reason: format!("subject: {e}"),
        })?;
        sqlx::query(
            r#"
            INSERT INTO follows (uri, did, subject, created_at, indexed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uri) DO UPDATE SET
                subject = excluded.subject,
                created_at = excluded.created_at,
                indexed_at = excluded.indexed_at
            "#,
        )
        .bind(address.to_string())
        .bind(address.did().as_str())
        .bind(&follow.subject)
        .bind(&follow.created_at)
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
        let row = sqlx::query_as::<_, FollowRow>("SELECT * FROM follows WHERE uri = ?")
            .bind(address.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        row.map(|row| encode_record(&Follow::from(row))).transpose()
    }

    async fn get_many(
        &self,
        conn: &mut SqliteConnection,
        addresses: &[RecordAddress],
    ) -> IndexResult<Vec<Value>> {
        let mut found = HashMap::with_capacity(addresses.len());
        for batch in addresses.chunks(BATCH_SIZE) {
            let query = format!(
                "SELECT * FROM follows WHERE uri IN ({})",
                placeholders(batch.len())
            );
            let mut query_builder = sqlx::query_as::<_, FollowRow>(&query);
            for address in batch {
                query_builder = query_builder.bind(address.to_string());
            }
            for row in query_builder.fetch_all(&mut *conn).await? {
                let uri = row.uri.clone();
                found.insert(uri, encode_record(&Follow::from(row))?);
            }
        }
        Ok(in_address_order(addresses, found))
    }

    async fn delete(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
    ) -> IndexResult<()> {
        sqlx::query("DELETE FROM follows WHERE uri = ?")
            .bind(address.to_string())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

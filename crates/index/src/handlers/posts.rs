//! `app.feed.post` index.

use super::{BATCH_SIZE, IndexHandler, decode_record, encode_record, in_address_order, placeholders};
use crate::error::IndexResult;
use crate::models::PostRow;
use async_trait::async_trait;
use canopy_core::RecordAddress;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqliteConnection;
use std::collections::HashMap;
use time::OffsetDateTime;

/// A short text post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Post {
    pub text: String,
    #[serde(
        default,
        deserialize_with = "super::non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            text: row.text,
            created_at: row.created_at,
        }
    }
}

/// Index handler for posts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostHandler;

impl PostHandler {
    pub const COLLECTION: &'static str = "app.feed.post";
}

#[async_trait]
impl IndexHandler for PostHandler {
    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }

    fn schema(&self) -> &'static str {
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            uri TEXT PRIMARY KEY,
            did TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT,
            indexed_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_posts_did ON posts(did);
        "#
    }

    async fn set(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
        record: &Value,
    ) -> IndexResult<()> {
        let post: Post = decode_record(Self::COLLECTION, record)?;
        sqlx::query(
            r#"
            INSERT INTO posts (uri, did, text, created_at, indexed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(uri) DO UPDATE SET
                text = excluded.text,
                created_at = excluded.created_at,
                indexed_at = excluded.indexed_at
            "#,
        )
        .bind(address.to_string())
        .bind(address.did().as_str())
        .bind(&post.text)
        .bind(&post.created_at)
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
        let row = sqlx::query_as::<_, PostRow>("SELECT * FROM posts WHERE uri = ?")
            .bind(address.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        row.map(|row| encode_record(&Post::from(row))).transpose()
    }

    async fn get_many(
        &self,
        conn: &mut SqliteConnection,
        addresses: &[RecordAddress],
    ) -> IndexResult<Vec<Value>> {
        let mut found = HashMap::with_capacity(addresses.len());
        for batch in addresses.chunks(BATCH_SIZE) {
            let query = format!(
                "SELECT * FROM posts WHERE uri IN ({})",
                placeholders(batch.len())
            );
            let mut query_builder = sqlx::query_as::<_, PostRow>(&query);
            for address in batch {
                query_builder = query_builder.bind(address.to_string());
            }
            for row in query_builder.fetch_all(&mut *conn).await? {
                let uri = row.uri.clone();
                found.insert(uri, encode_record(&Post::from(row))?);
            }
        }
        Ok(in_address_order(addresses, found))
    }

    async fn delete(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
    ) -> IndexResult<()> {
        sqlx::query("DELETE FROM posts WHERE uri = ?")
            .bind(address.to_string())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

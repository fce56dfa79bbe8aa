//! Per-collection index handlers.
//!
//! Each handler owns one table of typed, query-optimized rows for a single
//! record shape. Handlers run against a caller-supplied connection so the
//! store can wrap a handler write and its catalog entry in one transaction.

pub mod follows;
pub mod likes;
pub mod posts;

pub use follows::{Follow, FollowHandler};
pub use likes::{Like, LikeHandler};
pub use posts::{Post, PostHandler};

use crate::error::{IndexError, IndexResult};
use async_trait::async_trait;
use canopy_core::RecordAddress;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::SqliteConnection;

/// SQLite has a limit of ~999 bound parameters per statement.
pub(crate) const BATCH_SIZE: usize = 900;

/// Stores and retrieves records of one collection.
#[async_trait]
pub trait IndexHandler: Send + Sync {
    /// Collection name this handler indexes (e.g. `app.feed.post`).
    fn collection(&self) -> &'static str;

    /// DDL creating this handler's table. Must be idempotent.
    fn schema(&self) -> &'static str;

    /// Insert or overwrite the row for `address`.
    async fn set(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
        record: &Value,
    ) -> IndexResult<()>;

    /// Fetch the decoded record stored at `address`.
    async fn get(
        &self,
        conn: &mut SqliteConnection,
        address: &RecordAddress,
    ) -> IndexResult<Option<Value>>;

    /// Fetch every record found among `addresses`, in input order.
    /// Missing addresses are omitted.
    async fn get_many(
        &self,
        conn: &mut SqliteConnection,
        addresses: &[RecordAddress],
    ) -> IndexResult<Vec<Value>>;

    /// Remove the row for `address`. Absent rows are not an error.
    async fn delete(&self, conn: &mut SqliteConnection, address: &RecordAddress)
    -> IndexResult<()>;
}

/// Decode a record into the collection's typed shape.
pub(crate) fn decode_record<T: DeserializeOwned>(
    collection: &str,
    record: &Value,
) -> IndexResult<T> {
    serde_json::from_value(record.clone()).map_err(|e| IndexError::InvalidRecord {
        collection: collection.to_string(),
        reason: e.to_string(),
    })
}

/// Encode a typed record back into its decoded form.
pub(crate) fn encode_record<T: Serialize>(record: &T) -> IndexResult<Value> {
    serde_json::to_value(record).map_err(|e| IndexError::Internal(e.to_string()))
}

/// Optional field that may be omitted but not set to `null`.
pub(crate) fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("null is not allowed, omit the field instead"))
}

/// `?, ?, ?` for an IN clause of `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Reorder rows keyed by URI to follow `addresses`, dropping missing ones.
pub(crate) fn in_address_order(
    addresses: &[RecordAddress],
    mut found: std::collections::HashMap<String, Value>,
) -> Vec<Value> {
    addresses
        .iter()
        .filter_map(|address| found.remove(&address.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode_record::<Post>("app.feed.post", &json!({"body": "hi"})).unwrap_err();
        match err {
            IndexError::InvalidRecord { collection, .. } => {
                assert_eq!(collection, "app.feed.post")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_null_optional_field() {
        let err = decode_record::<Post>("app.feed.post", &json!({"text": "hi", "createdAt": null}))
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidRecord { .. }));

        let post: Post = decode_record("app.feed.post", &json!({"text": "hi"})).unwrap();
        assert_eq!(post.created_at, None);
    }

    #[test]
    fn test_in_address_order_skips_missing() {
        let a = RecordAddress::parse("did:example:a/app.feed.post/1").unwrap();
        let b = RecordAddress::parse("did:example:a/app.feed.post/2").unwrap();
        let c = RecordAddress::parse("did:example:a/app.feed.post/3").unwrap();

        let mut found = std::collections::HashMap::new();
        found.insert(c.to_string(), json!("c"));
        found.insert(a.to_string(), json!("a"));

        let ordered = in_address_order(&[c, b, a], found);
        assert_eq!(ordered, vec![json!("c"), json!("a")]);
    }
}

//! JSON diff bundles accepted by `canopy apply-diff`.
//!
//! A bundle carries everything one synchronization unit needs: the identity,
//! the new root, the classified entries, and the record blocks they name.
//!
//! ```json
//! {
//!   "did": "did:example:alice",
//!   "root": "bagaaiera...",
//!   "adds": [{ "key": "app.feed.post/3k2a", "cid": "bagaaiera..." }],
//!   "blocks": { "bagaaiera...": { "text": "hello" } }
//! }
//! ```

use anyhow::{Context, Result, bail};
use canopy_core::{Cid, Did, parse_cid};
use canopy_sync::{DataDiff, MemoryBlockStore};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleEntry {
    pub key: String,
    pub cid: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffBundle {
    pub did: String,
    pub root: String,
    #[serde(default)]
    pub adds: Vec<BundleEntry>,
    #[serde(default)]
    pub updates: Vec<BundleEntry>,
    #[serde(default)]
    pub deletes: Vec<BundleEntry>,
    /// Record content keyed by CID.
    #[serde(default)]
    pub blocks: BTreeMap<String, Value>,
}

/// A bundle with every identifier parsed and every block stored.
pub struct LoadedBundle {
    pub did: Did,
    pub root: Cid,
    pub diff: DataDiff,
    pub blocks: MemoryBlockStore,
}

impl DiffBundle {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse diff bundle")
    }

    /// Parse identifiers and load blocks, checking each block hashes to the
    /// CID it is listed under.
    pub async fn load(self) -> Result<LoadedBundle> {
        let did = Did::parse(&self.did).context("invalid bundle did")?;
        let root = parse_cid(&self.root).context("invalid bundle root")?;

        let blocks = MemoryBlockStore::new();
        for (listed, record) in &self.blocks {
            let listed_cid =
                parse_cid(listed).with_context(|| format!("invalid block cid '{listed}'"))?;
            let actual = blocks.put_record(record).await?;
            if actual != listed_cid {
                bail!("block listed as {listed_cid} hashes to {actual}");
            }
        }

        let mut diff = DataDiff::new();
        for entry in &self.adds {
            diff.add(&entry.key, entry_cid(entry)?);
        }
        for entry in &self.updates {
            diff.update(&entry.key, entry_cid(entry)?);
        }
        for entry in &self.deletes {
            diff.delete(&entry.key, entry_cid(entry)?);
        }

        Ok(LoadedBundle {
            did,
            root,
            diff,
            blocks,
        })
    }
}

fn entry_cid(entry: &BundleEntry) -> Result<Cid> {
    parse_cid(&entry.cid).with_context(|| format!("invalid cid for entry '{}'", entry.key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_sync::BlockStore;
    use serde_json::json;

    async fn record_cid(record: &Value) -> Cid {
        MemoryBlockStore::new().put_record(record).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_bundle() {
        let post = json!({"text": "hello"});
        let cid = record_cid(&post).await;
        let bundle = DiffBundle::from_json(
            &json!({
                "did": "did:example:alice",
                "root": cid.to_string(),
                "adds": [{"key": "app.feed.post/3k2a", "cid": cid.to_string()}],
                "deletes": [{"key": "app.feed.post/3k1z", "cid": cid.to_string()}],
                "blocks": {cid.to_string(): post},
            })
            .to_string(),
        )
        .unwrap();

        let loaded = bundle.load().await.unwrap();
        assert_eq!(loaded.did.as_str(), "did:example:alice");
        assert_eq!(loaded.diff.added_entries().len(), 1);
        assert_eq!(loaded.diff.deleted_entries()[0].key, "app.feed.post/3k1z");
        assert!(loaded.diff.updated_entries().is_empty());
        assert!(loaded.blocks.get_unchecked(&cid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mismatched_block_rejected() {
        let cid = record_cid(&json!({"text": "one"})).await;
        let bundle = DiffBundle::from_json(
            &json!({
                "did": "did:example:alice",
                "root": cid.to_string(),
                "blocks": {cid.to_string(): {"text": "two"}},
            })
            .to_string(),
        )
        .unwrap();

        let err = bundle.load().await.err().unwrap();
        assert!(err.to_string().contains("hashes to"));
    }

    #[test]
    fn test_unknown_bundle_field_rejected() {
        let err = DiffBundle::from_json(r#"{"did": "did:example:a", "root": "x", "extra": 1}"#);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_invalid_did_rejected() {
        let bundle =
            DiffBundle::from_json(r#"{"did": "alice", "root": "bafkqaaa"}"#).unwrap();
        assert!(bundle.load().await.is_err());
    }
}

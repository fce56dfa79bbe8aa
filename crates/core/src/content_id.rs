//! Content identifier helpers.

pub use cid::Cid;

/// Multicodec code for DAG-JSON blocks.
pub const DAG_JSON_CODEC: u64 = 0x0129;

/// Multihash code for SHA2-256.
pub const SHA2_256_CODE: u64 = 0x12;

/// Parse a CID from its string form.
pub fn parse_cid(s: &str) -> crate::Result<Cid> {
    Cid::try_from(s).map_err(|e| crate::Error::InvalidCid(format!("'{s}': {e}")))
}

/// Build a CIDv1 for a DAG-JSON block from its SHA2-256 digest.
pub fn cid_from_sha256(digest: &[u8]) -> crate::Result<Cid> {
    let mh = cid::multihash::Multihash::<64>::wrap(SHA2_256_CODE, digest)
        .map_err(|e| crate::Error::InvalidCid(e.to_string()))?;
    Ok(Cid::new_v1(DAG_JSON_CODEC, mh))
}

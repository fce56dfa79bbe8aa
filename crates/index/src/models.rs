//! Database models mapping to the index schema.

use canopy_core::RecordAddress;
use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Repository roots
// =============================================================================

/// Current root CID for one identity's repository.
#[derive(Debug, Clone, FromRow)]
pub struct RepoRootRow {
    pub did: String,
    pub root: String,
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// Record catalog
// =============================================================================

/// Cross-collection catalog entry, one per indexed record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CatalogEntryRow {
    pub uri: String,
    pub did: String,
    pub collection: String,
    pub tid: String,
    pub indexed_at: OffsetDateTime,
}

impl CatalogEntryRow {
    /// Build the catalog entry for an address.
    pub fn new(address: &RecordAddress, indexed_at: OffsetDateTime) -> Self {
        Self {
            uri: address.to_string(),
            did: address.did().to_string(),
            collection: address.collection().to_string(),
            tid: address.record_key().to_string(),
            indexed_at,
        }
    }
}

// =============================================================================
// Per-collection rows
// =============================================================================

/// Indexed `app.feed.post` record.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub uri: String,
    pub did: String,
    pub text: String,
    pub created_at: Option<String>,
    pub indexed_at: OffsetDateTime,
}

/// Indexed `app.feed.like` record.
#[derive(Debug, Clone, FromRow)]
pub struct LikeRow {
    pub uri: String,
    pub did: String,
    /// Address of the liked record.
    pub subject: String,
    pub created_at: Option<String>,
    pub indexed_at: OffsetDateTime,
}

/// Indexed `app.graph.follow` record.
#[derive(Debug, Clone, FromRow)]
pub struct FollowRow {
    pub uri: String,
    pub did: String,
    /// DID of the followed identity.
    pub subject: String,
    pub created_at: Option<String>,
    pub indexed_at: OffsetDateTime,
}

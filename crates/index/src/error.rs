//! Index store error types.

use canopy_core::AddressSegment;
use thiserror::Error;

/// Index store operation errors.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Address(#[from] canopy_core::Error),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("invalid {collection} record: {reason}")]
    InvalidRecord { collection: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IndexError {
    /// Whether this error was caused by a malformed record address.
    pub fn is_malformed_address(&self) -> bool {
        matches!(
            self,
            Self::Address(canopy_core::Error::MalformedAddress { .. })
        )
    }

    /// The malformed address segment, if any.
    pub fn address_segment(&self) -> Option<AddressSegment> {
        match self {
            Self::Address(e) => e.segment(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Config(e.to_string())
    }
}

/// Result type for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

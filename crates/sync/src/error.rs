//! Synchronization error types.

use canopy_core::Cid;
use canopy_index::IndexError;
use thiserror::Error;

/// Errors raised while projecting a diff or committing a new root.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("block not found: {0}")]
    BlockNotFound(Cid),

    #[error("invalid block {cid}: {reason}")]
    InvalidBlock { cid: Cid, reason: String },

    #[error("block store error: {0}")]
    BlockStore(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("projection failed for '{key}': {source}")]
    Projection {
        key: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("subscriber notification failed: {0}")]
    Notify(String),
}

impl SyncError {
    pub(crate) fn projection(key: &str, source: SyncError) -> Self {
        Self::Projection {
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    /// The error that triggered this one, looking through projection wrappers.
    pub fn root_cause(&self) -> &SyncError {
        match self {
            Self::Projection { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The underlying index error, if the failure came from the index.
    pub fn index_error(&self) -> Option<&IndexError> {
        match self.root_cause() {
            Self::Index(e) => Some(e),
            _ => None,
        }
    }
}

impl From<canopy_core::Error> for SyncError {
    fn from(e: canopy_core::Error) -> Self {
        SyncError::Index(IndexError::Address(e))
    }
}

/// Result type for synchronization operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_projection() {
        let err = SyncError::projection(
            "bogus.type/001",
            IndexError::UnknownCollection("bogus.type".to_string()).into(),
        );
        assert!(err.to_string().contains("bogus.type/001"));
        assert!(matches!(
            err.index_error(),
            Some(IndexError::UnknownCollection(name)) if name == "bogus.type"
        ));
    }

    #[test]
    fn test_address_errors_map_to_index_errors() {
        let err: SyncError = canopy_core::RecordAddress::parse("nope/a/b")
            .unwrap_err()
            .into();
        assert!(err.index_error().unwrap().is_malformed_address());
    }
}

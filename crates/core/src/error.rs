//! Error types for the core domain.

use std::fmt;
use thiserror::Error;

/// One of the three segments of a record address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressSegment {
    Identity,
    Collection,
    RecordKey,
}

impl AddressSegment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Collection => "collection",
            Self::RecordKey => "record key",
        }
    }
}

impl fmt::Display for AddressSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed address: invalid {segment}: {reason}")]
    MalformedAddress {
        segment: AddressSegment,
        reason: String,
    },

    #[error("invalid cid: {0}")]
    InvalidCid(String),
}

impl Error {
    pub(crate) fn malformed(segment: AddressSegment, reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            segment,
            reason: reason.into(),
        }
    }

    /// The address segment that failed validation, if this is an address error.
    pub fn segment(&self) -> Option<AddressSegment> {
        match self {
            Self::MalformedAddress { segment, .. } => Some(*segment),
            Self::InvalidCid(_) => None,
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

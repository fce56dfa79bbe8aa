//! Identity and record address types and parsing.

use crate::MAX_RECORD_KEY_CURSOR;
use crate::error::{AddressSegment, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decentralized identifier (`did:<method>:<id>`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// The scheme tag every identity starts with.
    pub const PREFIX: &'static str = "did:";

    /// Parse and validate an identity string.
    pub fn parse(did: impl Into<String>) -> crate::Result<Self> {
        let did = did.into();
        let rest = did.strip_prefix(Self::PREFIX).ok_or_else(|| {
            Error::malformed(
                AddressSegment::Identity,
                format!("'{did}' must start with '{}'", Self::PREFIX),
            )
        })?;

        let (method, id) = rest.split_once(':').ok_or_else(|| {
            Error::malformed(
                AddressSegment::Identity,
                format!("'{did}' must have the form did:<method>:<id>"),
            )
        })?;
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::malformed(
                AddressSegment::Identity,
                format!("invalid method in '{did}'"),
            ));
        }
        if id.is_empty() {
            return Err(Error::malformed(
                AddressSegment::Identity,
                format!("empty method-specific id in '{did}'"),
            ));
        }

        Ok(Self(did))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

/// The canonical address of a record: `identity/collection/recordKey`.
///
/// Record keys are time-ordered identifiers and compare lexicographically,
/// which is what reverse-chronological listing relies on.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordAddress {
    did: Did,
    collection: String,
    record_key: String,
}

impl RecordAddress {
    /// Parse a full address string. Either all three segments validate or
    /// the call fails naming the offending segment.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let mut parts = raw.splitn(3, '/');
        let identity = parts.next().unwrap_or_default();
        let collection = parts.next().ok_or_else(|| {
            Error::malformed(AddressSegment::Collection, format!("missing in '{raw}'"))
        })?;
        let record_key = parts.next().ok_or_else(|| {
            Error::malformed(AddressSegment::RecordKey, format!("missing in '{raw}'"))
        })?;

        Self::new(Did::parse(identity)?, collection, record_key)
    }

    /// Build an address from already-split parts.
    pub fn new(
        did: Did,
        collection: impl Into<String>,
        record_key: impl Into<String>,
    ) -> crate::Result<Self> {
        let collection = collection.into();
        let record_key = record_key.into();
        validate_collection(&collection)?;
        validate_record_key(&record_key)?;
        Ok(Self {
            did,
            collection,
            record_key,
        })
    }

    /// Build an address from an identity and a collection-qualified key
    /// (`collection/recordKey`), the form repository diffs use.
    pub fn from_repo_key(did: &Did, key: &str) -> crate::Result<Self> {
        let (collection, record_key) = key.split_once('/').ok_or_else(|| {
            Error::malformed(
                AddressSegment::RecordKey,
                format!("repository key '{key}' is not collection-qualified"),
            )
        })?;
        Self::new(did.clone(), collection, record_key)
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn record_key(&self) -> &str {
        &self.record_key
    }
}

fn validate_collection(collection: &str) -> crate::Result<()> {
    if collection.is_empty() {
        return Err(Error::malformed(AddressSegment::Collection, "empty"));
    }
    if collection.contains('/') {
        return Err(Error::malformed(
            AddressSegment::Collection,
            format!("'{collection}' contains '/'"),
        ));
    }
    Ok(())
}

fn validate_record_key(record_key: &str) -> crate::Result<()> {
    if record_key.is_empty() {
        return Err(Error::malformed(AddressSegment::RecordKey, "empty"));
    }
    if record_key.contains('/') {
        return Err(Error::malformed(
            AddressSegment::RecordKey,
            format!("'{record_key}' contains '/'"),
        ));
    }
    // Keys past the default cursor could never be listed.
    if record_key > MAX_RECORD_KEY_CURSOR {
        return Err(Error::malformed(
            AddressSegment::RecordKey,
            format!("'{record_key}' sorts after '{MAX_RECORD_KEY_CURSOR}'"),
        ));
    }
    Ok(())
}

impl fmt::Debug for RecordAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordAddress({self})")
    }
}

impl fmt::Display for RecordAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.did, self.collection, self.record_key)
    }
}

impl FromStr for RecordAddress {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for RecordAddress {
    type Error = Error;

    fn try_from(value: &str) -> crate::Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RecordAddress {
    type Error = Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<RecordAddress> for String {
    fn from(address: RecordAddress) -> Self {
        address.to_string()
    }
}

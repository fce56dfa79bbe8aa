//! Verified repository diffs.

use canopy_core::Cid;

/// One changed entry of a repository diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Collection-qualified record key (`collection/recordKey`).
    pub key: String,
    /// CID of the record block (for deletes, the removed block).
    pub cid: Cid,
}

impl DiffEntry {
    pub fn new(key: impl Into<String>, cid: Cid) -> Self {
        Self {
            key: key.into(),
            cid,
        }
    }
}

/// The classified difference between two repository roots, as produced and
/// verified by the repository layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataDiff {
    adds: Vec<DiffEntry>,
    updates: Vec<DiffEntry>,
    deletes: Vec<DiffEntry>,
}

impl DataDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, cid: Cid) -> &mut Self {
        self.adds.push(DiffEntry::new(key, cid));
        self
    }

    pub fn update(&mut self, key: impl Into<String>, cid: Cid) -> &mut Self {
        self.updates.push(DiffEntry::new(key, cid));
        self
    }

    pub fn delete(&mut self, key: impl Into<String>, cid: Cid) -> &mut Self {
        self.deletes.push(DiffEntry::new(key, cid));
        self
    }

    pub fn added_entries(&self) -> &[DiffEntry] {
        &self.adds
    }

    pub fn updated_entries(&self) -> &[DiffEntry] {
        &self.updates
    }

    pub fn deleted_entries(&self) -> &[DiffEntry] {
        &self.deletes
    }

    /// Total number of changed entries.
    pub fn len(&self) -> usize {
        self.adds.len() + self.updates.len() + self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Manifest entries: logical path to byte range

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Byte range of one packed resource within the resource region.
///
/// `offset` is relative to the region base, not to the container file start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u64, u64)", into = "(u64, u64)")]
pub struct ResourceEntry {
    /// Offset relative to the resource region base
    pub offset: u64,
    /// Length in bytes
    pub length: u64,
}

impl ResourceEntry {
    /// Create an entry for the given range
    pub fn new(offset: u64, length: u64) -> Self {
        ResourceEntry { offset, length }
    }
}

// Wire format is a bare [offset, length] pair.
impl From<(u64, u64)> for ResourceEntry {
    fn from((offset, length): (u64, u64)) -> Self {
        ResourceEntry { offset, length }
    }
}

impl From<ResourceEntry> for (u64, u64) {
    fn from(entry: ResourceEntry) -> Self {
        (entry.offset, entry.length)
    }
}

/// Mapping from logical path to resource entry.
///
/// Keys are opaque path strings as the packager wrote them; distinct textual
/// forms of the same file are distinct keys until alias expansion registers
/// them against the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: HashMap<PathBuf, ResourceEntry>,
}

impl Manifest {
    /// Empty manifest
    pub fn new() -> Self {
        Manifest::default()
    }

    /// Register a path. An existing entry at the same key is left in place.
    pub fn insert(&mut self, path: impl Into<PathBuf>, entry: ResourceEntry) {
        self.entries.entry(path.into()).or_insert(entry);
    }

    /// Look up an entry by exact key
    pub fn get(&self, path: &Path) -> Option<&ResourceEntry> {
        self.entries.get(path)
    }

    /// Whether the exact key is present
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of registered paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (path, entry) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ResourceEntry)> {
        self.entries.iter()
    }
}

impl FromIterator<(PathBuf, ResourceEntry)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (PathBuf, ResourceEntry)>>(iter: I) -> Self {
        Manifest {
            entries: iter.into_iter().collect(),
        }
    }
}

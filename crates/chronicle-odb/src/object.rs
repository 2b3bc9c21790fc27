//! Object model: trees, commits, and their canonical encodings.
//!
//! Trees and commits are serialized to compact JSON with a fixed field
//! order (struct order) and sorted tree entries; those exact bytes are
//! what gets hashed and persisted, so re-reading an object can verify
//! its id against the raw stored bytes.

use crate::id::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

/// A single named entry in a tree: a file (blob) or a subdirectory (tree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name (single path component, no separators).
    pub name: String,
    /// Whether the child is a blob or a subtree.
    pub kind: EntryKind,
    /// Id of the child object.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Create a blob entry.
    pub fn blob(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Blob,
            id,
        }
    }

    /// Create a subtree entry.
    pub fn tree(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Tree,
            id,
        }
    }
}

/// A snapshot of one directory level: entries ordered by name, unique
/// by name. Two trees with identical entries serialize to identical
/// bytes and therefore share one id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a tree from entries, sorting by name. Later duplicates
    /// replace earlier ones.
    pub fn from_entries(entries: Vec<TreeEntry>) -> Self {
        let mut tree = Self::empty();
        for entry in entries {
            tree.upsert(entry);
        }
        tree
    }

    /// Insert or replace an entry, keeping name order.
    pub fn upsert(&mut self, entry: TreeEntry) {
        match self
            .entries
            .binary_search_by(|e| e.name.as_str().cmp(entry.name.as_str()))
        {
            Ok(idx) => self.entries[idx] = entry,
            Err(idx) => self.entries.insert(idx, entry),
        }
    }

    /// Look up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// All entries, in name order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical bytes for hashing and storage.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Commit author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Structured provenance carried by restore commits: which commit the
/// content came from and when that commit was originally made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Commit the restored content was taken from.
    pub origin: ObjectId,
    /// Timestamp of the origin commit.
    pub origin_timestamp: DateTime<Utc>,
}

/// A commit: one snapshot plus metadata, chained to at most one parent.
///
/// History is linear by construction; there are no merge commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Parent commit, absent only for the root commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    /// Commit message.
    pub message: String,
    /// Author of the commit.
    pub author: Signature,
    /// When the commit was created.
    pub timestamp: DateTime<Utc>,
    /// Set on restore commits only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Commit {
    /// Canonical bytes for hashing and storage.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

//! Snapshot navigation: path lookups and tree rebuilding.
//!
//! Tracked paths are repository-relative, `/`-separated strings. A
//! lookup descends one tree level per path component; a write rebuilds
//! only the ancestor chain of the changed path, so every untouched
//! subtree keeps its prior id (structural sharing).

use crate::error::TimelineResult;
use chronicle_odb::{EntryKind, ObjectId, ObjectStore, Tree, TreeEntry};
use std::collections::BTreeMap;

/// Resolve the blob id at `path` inside the tree rooted at `tree`.
///
/// Returns `None` when any component is missing or a component that
/// should be a directory is a file (and vice versa).
pub async fn blob_at(
    store: &dyn ObjectStore,
    tree: ObjectId,
    path: &str,
) -> TimelineResult<Option<ObjectId>> {
    let mut components = path.split('/').peekable();
    let mut current = store.get_tree(tree).await?;

    while let Some(component) = components.next() {
        let Some(entry) = current.entry(component) else {
            return Ok(None);
        };

        let is_last = components.peek().is_none();
        match (is_last, entry.kind) {
            (true, EntryKind::Blob) => return Ok(Some(entry.id)),
            (false, EntryKind::Tree) => {
                current = store.get_tree(entry.id).await?;
            }
            _ => return Ok(None),
        }
    }

    Ok(None)
}

/// Produce a new root tree equal to `base` except that `path` now maps
/// to `blob`. Missing intermediate directories are created; all sibling
/// entries are carried over by id without rehashing.
pub async fn write_path(
    store: &dyn ObjectStore,
    base: Option<ObjectId>,
    path: &str,
    blob: ObjectId,
) -> TimelineResult<ObjectId> {
    let components: Vec<&str> = path.split('/').collect();

    // Walk down, collecting the ancestor tree of each directory level.
    // A missing or non-tree entry starts an empty subtree there.
    let mut levels: Vec<Tree> = Vec::with_capacity(components.len());
    let mut cursor = match base {
        Some(id) => store.get_tree(id).await?,
        None => Tree::empty(),
    };
    for component in &components[..components.len() - 1] {
        let next = match cursor.entry(component) {
            Some(entry) if entry.kind == EntryKind::Tree => store.get_tree(entry.id).await?,
            _ => Tree::empty(),
        };
        levels.push(cursor);
        cursor = next;
    }
    levels.push(cursor);

    // Rebuild bottom-up: each level gets one replaced entry, everything
    // else is copied by reference.
    let mut child_id = blob;
    let mut child_kind = EntryKind::Blob;
    for (tree, name) in levels.iter_mut().rev().zip(components.iter().rev()) {
        let entry = match child_kind {
            EntryKind::Blob => TreeEntry::blob(*name, child_id),
            EntryKind::Tree => TreeEntry::tree(*name, child_id),
        };
        tree.upsert(entry);
        child_id = store.put_tree(tree).await?;
        child_kind = EntryKind::Tree;
    }

    Ok(child_id)
}

/// Flatten a tree into a `path -> blob id` map (recursing into subtrees).
pub async fn flatten(
    store: &dyn ObjectStore,
    tree: ObjectId,
) -> TimelineResult<BTreeMap<String, ObjectId>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![(String::new(), tree)];

    while let Some((prefix, id)) = stack.pop() {
        let tree = store.get_tree(id).await?;
        for entry in tree.entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            match entry.kind {
                EntryKind::Blob => {
                    files.insert(path, entry.id);
                }
                EntryKind::Tree => stack.push((path, entry.id)),
            }
        }
    }

    Ok(files)
}

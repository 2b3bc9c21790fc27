//! Staging index: pending path changes between disk and the last commit.

use crate::error::{TimelineError, TimelineResult};
use crate::snapshot::{blob_at, write_path};
use chronicle_odb::{hash_object, ObjectId, ObjectKind, ObjectStore, Tree};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Ephemeral map of tracked path -> pending blob id.
///
/// The index holds only the delta between the working files and HEAD;
/// it is never content-addressed or persisted. It is cleared after each
/// successful commit.
#[derive(Debug, Default)]
pub struct StagingIndex {
    pending: BTreeMap<String, ObjectId>,
}

impl StagingIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending entries, ordered by path.
    pub fn pending(&self) -> &BTreeMap<String, ObjectId> {
        &self.pending
    }

    /// Whether there are no pending changes.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending entries.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Stage the current on-disk content of `path` (repository-relative).
    ///
    /// Reads the file under `root`, hashes it, and compares against the
    /// blob recorded for the path in `head_tree`. An unchanged file
    /// fails with `NothingToChange` and leaves the index untouched;
    /// otherwise the content is stored as a blob and recorded as
    /// pending.
    pub async fn stage(
        &mut self,
        store: &dyn ObjectStore,
        root: &Path,
        head_tree: Option<ObjectId>,
        path: &str,
    ) -> TimelineResult<ObjectId> {
        let bytes = tokio::fs::read(root.join(path)).await?;
        let blob_id = hash_object(ObjectKind::Blob, &bytes);

        let committed = match head_tree {
            Some(tree) => blob_at(store, tree, path).await?,
            None => None,
        };
        if committed == Some(blob_id) {
            return Err(TimelineError::NothingToChange(path.to_string()));
        }

        let stored = store.put_blob(&bytes).await?;
        debug_assert_eq!(stored, blob_id);
        self.pending.insert(path.to_string(), blob_id);

        debug!(path, blob = %blob_id, "Staged change");
        Ok(blob_id)
    }

    /// Materialize a tree combining all pending entries with every
    /// unmodified entry of `base` carried over by id.
    pub async fn materialize(
        &self,
        store: &dyn ObjectStore,
        base: Option<ObjectId>,
    ) -> TimelineResult<ObjectId> {
        let mut tree = base;
        for (path, blob) in &self.pending {
            tree = Some(write_path(store, tree, path, *blob).await?);
        }
        match tree {
            Some(id) => Ok(id),
            None => Ok(store.put_tree(&Tree::empty()).await?),
        }
    }
}

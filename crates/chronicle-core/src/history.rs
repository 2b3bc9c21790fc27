//! Path-scoped history walking.

use crate::error::TimelineResult;
use crate::repository::Repository;
use crate::snapshot::blob_at;
use chronicle_odb::{Commit, ObjectId};
use chronicle_util::path::normalize;
use std::path::Path;
use tracing::debug;

/// Walk the commit chain from HEAD and collect the commits that
/// changed `path`, newest first.
///
/// A commit counts when its blob id for the path differs from its
/// parent's (absence in the parent counts as a change, covering file
/// creation); the root commit counts only when the path is present in
/// it. The walk stops after
/// `limit` matches or at the root. Each step is a direct path lookup
/// into the two trees — never a full tree-to-tree diff — so the walk
/// is linear in history length.
pub async fn relevant_history(
    repo: &Repository,
    path: impl AsRef<Path>,
    limit: usize,
) -> TimelineResult<Vec<(ObjectId, Commit)>> {
    let rel = normalize(path.as_ref())?;
    let store = repo.store().as_ref();

    let mut matches = Vec::new();
    let mut cursor = repo.head().await;

    while let Some(id) = cursor {
        if matches.len() >= limit {
            break;
        }

        let commit = repo.commit(id).await?;
        let blob = blob_at(store, commit.tree, &rel).await?;

        let relevant = match commit.parent {
            Some(parent_id) => {
                let parent = repo.commit(parent_id).await?;
                blob != blob_at(store, parent.tree, &rel).await?
            }
            // Root commit: presence there is the creation change.
            None => blob.is_some(),
        };

        cursor = commit.parent;
        if relevant {
            matches.push((id, commit));
        }
    }

    debug!(path = %rel, count = matches.len(), "Computed relevant history");
    Ok(matches)
}

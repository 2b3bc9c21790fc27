//! Line-level tree differ.
//!
//! Compares the snapshots of two commits and produces, per changed
//! path, an edit script of tagged lines in input order. The line diff
//! uses `similar` with the LCS algorithm, which breaks ties by
//! matching earliest in both sequences, so output is deterministic for
//! identical inputs.

use crate::error::TimelineResult;
use crate::snapshot::flatten;
use chronicle_odb::{ObjectId, ObjectStore};
use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::collections::{BTreeMap, BTreeSet};

/// How a line relates to the two sides of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    /// Present on both sides.
    Context,
    /// Present only on the new side.
    Added,
    /// Present only on the old side.
    Removed,
}

/// One line of an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub status: LineStatus,
    pub content: String,
}

impl DiffLine {
    fn new(status: LineStatus, content: &str) -> Self {
        // Lines carry no trailing newline
        let content = content.strip_suffix('\n').unwrap_or(content);
        Self {
            status,
            content: content.to_string(),
        }
    }
}

/// Edit scripts keyed by path. Paths with identical content on both
/// sides are absent.
pub type DiffReport = BTreeMap<String, Vec<DiffLine>>;

/// Diff the snapshots of two commits, old -> new.
pub async fn diff_commits(
    store: &dyn ObjectStore,
    old: ObjectId,
    new: ObjectId,
) -> TimelineResult<DiffReport> {
    let old_commit = store.get_commit(old).await?;
    let new_commit = store.get_commit(new).await?;

    let old_files = flatten(store, old_commit.tree).await?;
    let new_files = flatten(store, new_commit.tree).await?;

    let paths: BTreeSet<&String> = old_files.keys().chain(new_files.keys()).collect();

    let mut report = DiffReport::new();
    for path in paths {
        let old_blob = old_files.get(path);
        let new_blob = new_files.get(path);
        if old_blob == new_blob {
            // Same blob id means identical content (content-addressed)
            continue;
        }

        let old_text = read_text(store, old_blob).await?;
        let new_text = read_text(store, new_blob).await?;
        report.insert(path.clone(), diff_lines(&old_text, &new_text));
    }

    Ok(report)
}

async fn read_text(store: &dyn ObjectStore, blob: Option<&ObjectId>) -> TimelineResult<String> {
    match blob {
        Some(id) => {
            let bytes = store.get_blob(*id).await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => Ok(String::new()),
    }
}

/// Line edit script between two texts, unchanged lines interleaved in
/// place as context.
fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Lcs)
        .diff_lines(old, new);

    diff.iter_all_changes()
        .map(|change| {
            let status = match change.tag() {
                ChangeTag::Equal => LineStatus::Context,
                ChangeTag::Insert => LineStatus::Added,
                ChangeTag::Delete => LineStatus::Removed,
            };
            DiffLine::new(status, change.value())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Repository, RepositoryConfig};
    use chronicle_odb::MemoryStore;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn repo_at(root: &Path) -> Repository {
        let config = RepositoryConfig {
            seed_on_init: false,
            ..Default::default()
        };
        Repository::with_store(root, Arc::new(MemoryStore::new()), config)
            .await
            .unwrap()
    }

    fn line(status: LineStatus, content: &str) -> DiffLine {
        DiffLine {
            status,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_changed_line_with_context() {
        let dir = tempdir().unwrap();
        let repo = repo_at(dir.path()).await;

        std::fs::write(dir.path().join("p.txt"), "x\ny\n").unwrap();
        let a = repo.save("p.txt", "a").await.unwrap();
        std::fs::write(dir.path().join("p.txt"), "x\nz\n").unwrap();
        let b = repo.save("p.txt", "b").await.unwrap();

        let report = diff_commits(repo.store().as_ref(), a, b).await.unwrap();
        assert_eq!(
            report.get("p.txt").unwrap(),
            &vec![
                line(LineStatus::Context, "x"),
                line(LineStatus::Removed, "y"),
                line(LineStatus::Added, "z"),
            ]
        );
    }

    #[tokio::test]
    async fn test_identical_commits_empty_report() {
        let dir = tempdir().unwrap();
        let repo = repo_at(dir.path()).await;

        std::fs::write(dir.path().join("p.txt"), "x\n").unwrap();
        let a = repo.save("p.txt", "a").await.unwrap();

        let report = diff_commits(repo.store().as_ref(), a, a).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_paths_omitted() {
        let dir = tempdir().unwrap();
        let repo = repo_at(dir.path()).await;

        std::fs::write(dir.path().join("stable.txt"), "same\n").unwrap();
        repo.save("stable.txt", "s").await.unwrap();
        std::fs::write(dir.path().join("p.txt"), "x\n").unwrap();
        let a = repo.save("p.txt", "a").await.unwrap();
        std::fs::write(dir.path().join("p.txt"), "y\n").unwrap();
        let b = repo.save("p.txt", "b").await.unwrap();

        let report = diff_commits(repo.store().as_ref(), a, b).await.unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.contains_key("p.txt"));
        assert!(!report.contains_key("stable.txt"));
    }

    #[tokio::test]
    async fn test_path_only_in_new_is_all_added() {
        let dir = tempdir().unwrap();
        let repo = repo_at(dir.path()).await;

        std::fs::write(dir.path().join("p.txt"), "x\n").unwrap();
        let a = repo.save("p.txt", "a").await.unwrap();
        std::fs::write(dir.path().join("new.txt"), "one\ntwo\n").unwrap();
        let b = repo.save("new.txt", "b").await.unwrap();

        let report = diff_commits(repo.store().as_ref(), a, b).await.unwrap();
        assert_eq!(
            report.get("new.txt").unwrap(),
            &vec![
                line(LineStatus::Added, "one"),
                line(LineStatus::Added, "two"),
            ]
        );
    }

    #[tokio::test]
    async fn test_path_only_in_old_is_all_removed() {
        let dir = tempdir().unwrap();
        let repo = repo_at(dir.path()).await;

        std::fs::write(dir.path().join("p.txt"), "x\n").unwrap();
        let a = repo.save("p.txt", "a").await.unwrap();
        std::fs::write(dir.path().join("late.txt"), "gone\n").unwrap();
        let b = repo.save("late.txt", "b").await.unwrap();

        // Diff newest -> oldest: late.txt exists only on the old side
        let report = diff_commits(repo.store().as_ref(), b, a).await.unwrap();
        assert_eq!(
            report.get("late.txt").unwrap(),
            &vec![line(LineStatus::Removed, "gone")]
        );
    }

    #[tokio::test]
    async fn test_diff_deterministic() {
        let dir = tempdir().unwrap();
        let repo = repo_at(dir.path()).await;

        std::fs::write(dir.path().join("p.txt"), "a\nb\na\nb\n").unwrap();
        let a = repo.save("p.txt", "a").await.unwrap();
        std::fs::write(dir.path().join("p.txt"), "b\na\nb\na\n").unwrap();
        let b = repo.save("p.txt", "b").await.unwrap();

        let first = diff_commits(repo.store().as_ref(), a, b).await.unwrap();
        let second = diff_commits(repo.store().as_ref(), a, b).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_line_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LineStatus::Context).unwrap(),
            "\"context\""
        );
        assert_eq!(serde_json::to_string(&LineStatus::Added).unwrap(), "\"added\"");
        assert_eq!(
            serde_json::to_string(&LineStatus::Removed).unwrap(),
            "\"removed\""
        );
    }
}

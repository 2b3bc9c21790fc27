//! Timeline service: the application-facing surface over the engine.
//!
//! The service wraps a [`Repository`] and adds the reactive layer an
//! editor wants: a watched path whose relevant history is recomputed in
//! the background and published over a watch channel, so every
//! subscriber always sees the latest view. History requests are
//! coalesced: if saves arrive faster than histories compute, only the
//! newest request is served.

use crate::config::TimelineConfig;
use chronicle_core::{
    diff_commits, relevant_history, DiffReport, Repository, RepositoryConfig, TimelineError,
    TimelineResult,
};
use chronicle_odb::{Commit, ObjectId, Provenance, Signature};
use chronicle_util::path::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, warn};

/// One commit as it appears in a path's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Commit id, usable as a restore target.
    pub id: ObjectId,
    pub message: String,
    pub author: Signature,
    pub timestamp: DateTime<Utc>,
    /// Present when the commit was produced by a restore.
    pub provenance: Option<Provenance>,
}

impl HistoryEntry {
    fn from_commit(id: ObjectId, commit: Commit) -> Self {
        Self {
            id,
            message: commit.message,
            author: commit.author,
            timestamp: commit.timestamp,
            provenance: commit.provenance,
        }
    }
}

/// Published snapshot of the watched path's history, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryView {
    /// The path the entries belong to. `None` until a path is watched.
    pub path: Option<String>,
    pub entries: Vec<HistoryEntry>,
}

/// High-level timeline API over a single repository.
///
/// Save is deliberately best-effort: an editor calls it on every
/// meaningful moment, and a file that is missing or unchanged should
/// never interrupt the user. Restore and history propagate errors, as
/// the caller acted on an explicit id or path.
pub struct TimelineService {
    repo: Arc<Repository>,
    history_limit: usize,
    requests: mpsc::UnboundedSender<String>,
    views: watch::Receiver<HistoryView>,
    watched: RwLock<Option<String>>,
}

impl TimelineService {
    /// Open (or initialize) a disk-backed timeline at `root`.
    pub async fn open(
        root: impl Into<std::path::PathBuf>,
        config: TimelineConfig,
    ) -> TimelineResult<Self> {
        let repo = Repository::open(
            root,
            RepositoryConfig {
                author: config.author.clone(),
                seed_on_init: config.seed_on_init,
            },
        )
        .await?;
        Ok(Self::with_repository(Arc::new(repo), config))
    }

    /// Wrap an already-open repository. Only `history_limit` from the
    /// config applies here; author and seeding were fixed at open time.
    pub fn with_repository(repo: Arc<Repository>, config: TimelineConfig) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        let (tx, views) = watch::channel(HistoryView::default());

        tokio::spawn(publish_views(
            Arc::clone(&repo),
            config.history_limit,
            rx,
            tx,
        ));

        Self {
            repo,
            history_limit: config.history_limit,
            requests,
            views,
            watched: RwLock::new(None),
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<Repository> {
        &self.repo
    }

    /// Snapshot `path`'s current content under `message`.
    ///
    /// Returns the new commit id, or `None` when nothing was saved: an
    /// unchanged file is logged at debug level, any other failure at
    /// warn level, and neither reaches the caller as an error.
    pub async fn save_timeline(&self, path: impl AsRef<Path>, message: &str) -> Option<ObjectId> {
        let path = path.as_ref();
        match self.repo.save(path, message).await {
            Ok(id) => {
                self.refresh_watched().await;
                Some(id)
            }
            Err(e) if e.is_nothing_to_change() => {
                debug!(path = %path.display(), "Skipped save with no changes");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save timeline");
                None
            }
        }
    }

    /// Bring `path` back to its content at commit `target`.
    ///
    /// Appends a provenance commit rather than rewriting history, and
    /// returns the new commit id.
    pub async fn recover_timeline(
        &self,
        path: impl AsRef<Path>,
        target: ObjectId,
    ) -> TimelineResult<ObjectId> {
        let id = self.repo.restore(path, target).await?;
        self.refresh_watched().await;
        Ok(id)
    }

    /// Relevant history for `path`, newest first, capped at the
    /// configured limit.
    pub async fn history(&self, path: impl AsRef<Path>) -> TimelineResult<Vec<HistoryEntry>> {
        let entries = relevant_history(&self.repo, path, self.history_limit).await?;
        Ok(entries
            .into_iter()
            .map(|(id, commit)| HistoryEntry::from_commit(id, commit))
            .collect())
    }

    /// Per-path line diff from the current HEAD snapshot to `target`.
    pub async fn target_to_current(&self, target: ObjectId) -> TimelineResult<DiffReport> {
        let head = self
            .repo
            .head()
            .await
            .ok_or_else(|| TimelineError::InvalidHead("repository has no commits".to_string()))?;
        // Resolve first so an unknown id reports CommitNotFound.
        self.repo.commit(target).await?;
        diff_commits(self.repo.store().as_ref(), head, target).await
    }

    /// Start watching `path`: its history is recomputed after every
    /// save and restore, and published to all subscribers.
    pub async fn watch_path(&self, path: impl AsRef<Path>) -> TimelineResult<()> {
        let rel = normalize(path.as_ref())?;
        *self.watched.write().await = Some(rel.clone());
        // Receiver lives as long as the service does.
        let _ = self.requests.send(rel);
        Ok(())
    }

    /// A receiver for published [`HistoryView`]s. Late subscribers see
    /// the latest view immediately.
    pub fn subscribe(&self) -> watch::Receiver<HistoryView> {
        self.views.clone()
    }

    /// Queue a history recomputation for the watched path, if any.
    async fn refresh_watched(&self) {
        if let Some(path) = self.watched.read().await.clone() {
            let _ = self.requests.send(path);
        }
    }
}

/// Background loop: serve the newest pending history request and
/// publish the result. Ends when the service (sender) is dropped.
async fn publish_views(
    repo: Arc<Repository>,
    limit: usize,
    mut requests: mpsc::UnboundedReceiver<String>,
    views: watch::Sender<HistoryView>,
) {
    while let Some(mut path) = requests.recv().await {
        // Coalesce: a newer request supersedes any older ones.
        while let Ok(newer) = requests.try_recv() {
            path = newer;
        }

        match relevant_history(&repo, &path, limit).await {
            Ok(entries) => {
                let view = HistoryView {
                    path: Some(path),
                    entries: entries
                        .into_iter()
                        .map(|(id, commit)| HistoryEntry::from_commit(id, commit))
                        .collect(),
                };
                if views.send(view).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to compute history view");
            }
        }
    }
    debug!("History publisher stopped");
}

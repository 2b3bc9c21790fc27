//! Repository handle: object store + HEAD + project root.
//!
//! A `Repository` is an explicit handle (no process-wide global), so
//! multiple isolated repositories can coexist — one per project, or one
//! per test. Opening is idempotent: existing persisted state is loaded,
//! otherwise a fresh repository is initialized, optionally seeded with
//! a root commit over the current on-disk file set.

use crate::error::{TimelineError, TimelineResult};
use crate::snapshot::{blob_at, write_path};
use crate::stage::StagingIndex;
use chronicle_odb::{
    Commit, DiskStore, ObjectId, ObjectKind, ObjectStore, Provenance, Signature,
};
use chronicle_util::path::normalize;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Directory under the project root holding all persisted state.
const STATE_DIR: &str = ".chronicle";
/// File holding the hex id of the current tip commit.
const HEAD_FILE: &str = "HEAD";

/// Repository configuration.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Author recorded on every commit this handle creates.
    pub author: Signature,
    /// Whether a fresh repository gets a root commit over the files
    /// already on disk.
    pub seed_on_init: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            author: Signature::new("chronicle", "chronicle@localhost"),
            seed_on_init: true,
        }
    }
}

/// A single linear-history repository rooted at a project directory.
///
/// Mutating operations (`save`, `restore`) are serialized by an
/// internal mutex: each performs a read-modify-write of HEAD, and two
/// racing would lose updates. Read-only operations work against
/// already-committed immutable objects and take no exclusive lock.
pub struct Repository {
    root: PathBuf,
    state_dir: PathBuf,
    store: Arc<dyn ObjectStore>,
    head: RwLock<Option<ObjectId>>,
    index: Mutex<StagingIndex>,
    write_lock: Mutex<()>,
    author: Signature,
}

impl Repository {
    /// Open (or initialize) a disk-backed repository at `root`.
    pub async fn open(
        root: impl Into<PathBuf>,
        config: RepositoryConfig,
    ) -> TimelineResult<Self> {
        let root = root.into();
        let state_dir = root.join(STATE_DIR);
        let initialized = state_dir.exists();
        let store = Arc::new(DiskStore::open(state_dir.join("objects")).await?);
        Self::init(root, store, config, initialized).await
    }

    /// Open (or initialize) a repository with a caller-provided object
    /// store. HEAD still persists under `<root>/.chronicle/`.
    pub async fn with_store(
        root: impl Into<PathBuf>,
        store: Arc<dyn ObjectStore>,
        config: RepositoryConfig,
    ) -> TimelineResult<Self> {
        let root = root.into();
        let initialized = root.join(STATE_DIR).exists();
        Self::init(root, store, config, initialized).await
    }

    async fn init(
        root: PathBuf,
        store: Arc<dyn ObjectStore>,
        config: RepositoryConfig,
        initialized: bool,
    ) -> TimelineResult<Self> {
        let state_dir = root.join(STATE_DIR);
        fs::create_dir_all(&state_dir).await?;

        let head = Self::load_head(&state_dir, store.as_ref()).await?;
        let repo = Self {
            root,
            state_dir,
            store,
            head: RwLock::new(head),
            index: Mutex::new(StagingIndex::new()),
            write_lock: Mutex::new(()),
            author: config.author,
        };

        if !initialized && config.seed_on_init {
            repo.seed_root_commit().await?;
        } else if initialized {
            debug!(root = %repo.root.display(), head = ?head, "Opened existing repository");
        }

        Ok(repo)
    }

    async fn load_head(
        state_dir: &Path,
        store: &dyn ObjectStore,
    ) -> TimelineResult<Option<ObjectId>> {
        let path = state_dir.join(HEAD_FILE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TimelineError::Io(e)),
        };

        let id = ObjectId::from_hex(content.trim())
            .map_err(|e| TimelineError::InvalidHead(e.to_string()))?;
        if !store.contains(ObjectKind::Commit, id).await? {
            return Err(TimelineError::InvalidHead(format!(
                "HEAD points at missing commit {id}"
            )));
        }
        Ok(Some(id))
    }

    /// Advance HEAD to `id`, atomically rewriting the HEAD file.
    async fn set_head(&self, id: ObjectId) -> TimelineResult<()> {
        let path = self.state_dir.join(HEAD_FILE);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, id.to_hex()).await?;
        fs::rename(&temp_path, &path).await?;

        *self.head.write().await = Some(id);
        Ok(())
    }

    /// The project root this repository tracks.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The underlying object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Current tip commit id, or `None` for an empty repository.
    pub async fn head(&self) -> Option<ObjectId> {
        *self.head.read().await
    }

    /// Look up a commit by id.
    pub async fn commit(&self, id: ObjectId) -> TimelineResult<Commit> {
        match self.store.get_commit(id).await {
            Ok(commit) => Ok(commit),
            Err(chronicle_odb::OdbError::NotFound(_)) => Err(TimelineError::CommitNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Root tree id of the HEAD commit, if any.
    pub async fn head_tree(&self) -> TimelineResult<Option<ObjectId>> {
        match self.head().await {
            Some(id) => Ok(Some(self.commit(id).await?.tree)),
            None => Ok(None),
        }
    }

    /// Snapshot `path`'s current on-disk content as a new commit.
    ///
    /// Fails with `NothingToChange` (and no side effects) when the file
    /// matches what HEAD already records for it. Returns the new commit
    /// id after advancing HEAD.
    pub async fn save(&self, path: impl AsRef<Path>, message: &str) -> TimelineResult<ObjectId> {
        let rel = normalize(path.as_ref())?;
        let _guard = self.write_lock.lock().await;

        let head = self.head().await;
        let head_tree = self.head_tree().await?;

        let mut index = self.index.lock().await;
        let result: TimelineResult<ObjectId> = async {
            index
                .stage(self.store.as_ref(), &self.root, head_tree, &rel)
                .await?;
            let tree = index.materialize(self.store.as_ref(), head_tree).await?;

            let commit = Commit {
                tree,
                parent: head,
                message: message.to_string(),
                author: self.author.clone(),
                timestamp: Utc::now(),
                provenance: None,
            };
            let commit_id = self.store.put_commit(&commit).await?;
            self.set_head(commit_id).await?;
            Ok(commit_id)
        }
        .await;
        // A failed save must not leak staged paths into the next one.
        index.clear();
        let commit_id = result?;

        info!(path = %rel, commit = %commit_id, "Saved timeline");
        Ok(commit_id)
    }

    /// Bring `path` back to its content at `target`, appending a new
    /// provenance commit. Prior history is never removed or mutated.
    ///
    /// The file write and the HEAD advance happen as a pair: every
    /// fallible step runs before the file is replaced, and a failed
    /// HEAD update restores the previous file bytes so disk and history
    /// never diverge.
    pub async fn restore(
        &self,
        path: impl AsRef<Path>,
        target: ObjectId,
    ) -> TimelineResult<ObjectId> {
        let rel = normalize(path.as_ref())?;
        let _guard = self.write_lock.lock().await;

        let target_commit = self.commit(target).await?;
        let blob = blob_at(self.store.as_ref(), target_commit.tree, &rel)
            .await?
            .ok_or_else(|| TimelineError::PathNotFound {
                commit: target,
                path: rel.clone(),
            })?;
        let content = self.store.get_blob(blob).await?;

        let head = self.head().await;
        let head_tree = self.head_tree().await?;
        let new_tree = write_path(self.store.as_ref(), head_tree, &rel, blob).await?;

        let commit = Commit {
            tree: new_tree,
            parent: head,
            message: target_commit.message.clone(),
            author: self.author.clone(),
            timestamp: Utc::now(),
            provenance: Some(Provenance {
                origin: target,
                origin_timestamp: target_commit.timestamp,
            }),
        };
        // Stored but not yet referenced by HEAD; harmless if we fail below.
        let commit_id = self.store.put_commit(&commit).await?;

        let abs = self.root.join(&rel);
        let prior = match fs::read(&abs).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(TimelineError::Io(e)),
        };
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file_name = abs
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "restore".to_string());
        let temp_path = abs.with_file_name(format!("{file_name}.chronicle-restore"));
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &abs).await?;

        if let Err(e) = self.set_head(commit_id).await {
            warn!(path = %rel, error = %e, "HEAD update failed, rolling back file");
            match prior {
                Some(bytes) => {
                    let _ = fs::write(&abs, bytes).await;
                }
                None => {
                    let _ = fs::remove_file(&abs).await;
                }
            }
            return Err(e);
        }

        info!(path = %rel, origin = %target, commit = %commit_id, "Restored timeline");
        Ok(commit_id)
    }

    /// Create the root commit over the files already under the project
    /// root (skipping the state directory). No-op for an empty root.
    async fn seed_root_commit(&self) -> TimelineResult<Option<ObjectId>> {
        let mut index = self.index.lock().await;

        let walker = walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.file_name() != STATE_DIR);
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = normalize(rel)?;
            index
                .stage(self.store.as_ref(), &self.root, None, &rel)
                .await?;
        }

        if index.is_empty() {
            return Ok(None);
        }

        let tree = index.materialize(self.store.as_ref(), None).await?;
        let commit = Commit {
            tree,
            parent: None,
            message: "init".to_string(),
            author: self.author.clone(),
            timestamp: Utc::now(),
            provenance: None,
        };
        let commit_id = self.store.put_commit(&commit).await?;
        self.set_head(commit_id).await?;
        index.clear();

        info!(commit = %commit_id, "Seeded root commit");
        Ok(Some(commit_id))
    }
}

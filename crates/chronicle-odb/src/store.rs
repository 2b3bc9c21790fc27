//! Object store backends.
//!
//! Both backends speak the same `ObjectStore` trait. Puts are
//! idempotent: an object that already exists is never rewritten, so
//! identical content is stored at most once. Gets verify that the
//! stored bytes still hash to the requested id and fail with
//! `OdbError::Corrupt` when they do not.

use crate::error::{OdbError, OdbResult};
use crate::id::{hash_object, ObjectId, ObjectKind};
use crate::object::{Commit, Tree};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;
use tracing::debug;

/// Content-addressed storage for blobs, trees, and commits.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store raw bytes. Returns the content id.
    async fn put_blob(&self, bytes: &[u8]) -> OdbResult<ObjectId>;

    /// Load the bytes for a blob id.
    async fn get_blob(&self, id: ObjectId) -> OdbResult<Vec<u8>>;

    /// Store a tree. Returns its id.
    async fn put_tree(&self, tree: &Tree) -> OdbResult<ObjectId>;

    /// Load a tree by id.
    async fn get_tree(&self, id: ObjectId) -> OdbResult<Tree>;

    /// Store a commit. Returns its id.
    async fn put_commit(&self, commit: &Commit) -> OdbResult<ObjectId>;

    /// Load a commit by id.
    async fn get_commit(&self, id: ObjectId) -> OdbResult<Commit>;

    /// Check whether an object exists.
    async fn contains(&self, kind: ObjectKind, id: ObjectId) -> OdbResult<bool>;
}

/// Verify raw object bytes against their claimed id.
fn verify(kind: ObjectKind, claimed: ObjectId, bytes: &[u8]) -> OdbResult<()> {
    let actual = hash_object(kind, bytes);
    if actual != claimed {
        return Err(OdbError::Corrupt { claimed, actual });
    }
    Ok(())
}

/// Disk-backed object store.
///
/// Objects live under `objects/<kind>/<hh>/<rest-of-hex>`, where `hh`
/// is the first two hex characters of the id. Writes go through a
/// temporary file and a rename so a crash never leaves a partial
/// object at its final path.
pub struct DiskStore {
    objects_dir: PathBuf,
}

impl DiskStore {
    /// Open (or create) an object store rooted at `objects_dir`.
    pub async fn open(objects_dir: impl Into<PathBuf>) -> OdbResult<Self> {
        let objects_dir = objects_dir.into();
        for kind in [ObjectKind::Blob, ObjectKind::Tree, ObjectKind::Commit] {
            fs::create_dir_all(objects_dir.join(kind.dir_name())).await?;
        }
        Ok(Self { objects_dir })
    }

    fn object_path(&self, kind: ObjectKind, id: ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir
            .join(kind.dir_name())
            .join(&hex[..2])
            .join(&hex[2..])
    }

    async fn put_object(&self, kind: ObjectKind, bytes: &[u8]) -> OdbResult<ObjectId> {
        let id = hash_object(kind, bytes);
        let path = self.object_path(kind, id);

        // Content-addressed: an existing object is already this content.
        if path.exists() {
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically (write to temp file, then rename)
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(kind = kind.dir_name(), id = %id, "Stored object");
        Ok(id)
    }

    async fn get_object(&self, kind: ObjectKind, id: ObjectId) -> OdbResult<Vec<u8>> {
        let path = self.object_path(kind, id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OdbError::NotFound(id))
            }
            Err(e) => return Err(OdbError::Io(e)),
        };
        verify(kind, id, &bytes)?;
        Ok(bytes)
    }
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn put_blob(&self, bytes: &[u8]) -> OdbResult<ObjectId> {
        self.put_object(ObjectKind::Blob, bytes).await
    }

    async fn get_blob(&self, id: ObjectId) -> OdbResult<Vec<u8>> {
        self.get_object(ObjectKind::Blob, id).await
    }

    async fn put_tree(&self, tree: &Tree) -> OdbResult<ObjectId> {
        let bytes = tree.canonical_bytes()?;
        self.put_object(ObjectKind::Tree, &bytes).await
    }

    async fn get_tree(&self, id: ObjectId) -> OdbResult<Tree> {
        let bytes = self.get_object(ObjectKind::Tree, id).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put_commit(&self, commit: &Commit) -> OdbResult<ObjectId> {
        let bytes = commit.canonical_bytes()?;
        self.put_object(ObjectKind::Commit, &bytes).await
    }

    async fn get_commit(&self, id: ObjectId) -> OdbResult<Commit> {
        let bytes = self.get_object(ObjectKind::Commit, id).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn contains(&self, kind: ObjectKind, id: ObjectId) -> OdbResult<bool> {
        Ok(self.object_path(kind, id).exists())
    }
}

/// In-memory object store for testing.
///
/// This stores all objects in memory and is not persistent.
pub struct MemoryStore {
    objects: RwLock<HashMap<(ObjectKind, ObjectId), Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    fn put_object(&self, kind: ObjectKind, bytes: &[u8]) -> OdbResult<ObjectId> {
        let id = hash_object(kind, bytes);
        let mut objects = self
            .objects
            .write()
            .map_err(|e| OdbError::LockPoisoned(e.to_string()))?;
        objects.entry((kind, id)).or_insert_with(|| bytes.to_vec());
        Ok(id)
    }

    fn get_object(&self, kind: ObjectKind, id: ObjectId) -> OdbResult<Vec<u8>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| OdbError::LockPoisoned(e.to_string()))?;
        let bytes = objects
            .get(&(kind, id))
            .cloned()
            .ok_or(OdbError::NotFound(id))?;
        verify(kind, id, &bytes)?;
        Ok(bytes)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_blob(&self, bytes: &[u8]) -> OdbResult<ObjectId> {
        self.put_object(ObjectKind::Blob, bytes)
    }

    async fn get_blob(&self, id: ObjectId) -> OdbResult<Vec<u8>> {
        self.get_object(ObjectKind::Blob, id)
    }

    async fn put_tree(&self, tree: &Tree) -> OdbResult<ObjectId> {
        let bytes = tree.canonical_bytes()?;
        self.put_object(ObjectKind::Tree, &bytes)
    }

    async fn get_tree(&self, id: ObjectId) -> OdbResult<Tree> {
        let bytes = self.get_object(ObjectKind::Tree, id)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn put_commit(&self, commit: &Commit) -> OdbResult<ObjectId> {
        let bytes = commit.canonical_bytes()?;
        self.put_object(ObjectKind::Commit, &bytes)
    }

    async fn get_commit(&self, id: ObjectId) -> OdbResult<Commit> {
        let bytes = self.get_object(ObjectKind::Commit, id)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn contains(&self, kind: ObjectKind, id: ObjectId) -> OdbResult<bool> {
        let objects = self
            .objects
            .read()
            .map_err(|e| OdbError::LockPoisoned(e.to_string()))?;
        Ok(objects.contains_key(&(kind, id)))
    }
}

//! Content-addressed object database for chronicle.
//!
//! Every stored object (blob, tree, commit) is identified by the SHA-256
//! hash of its canonical serialization, so identical content is stored at
//! most once and object ids are immutable. Two backends are provided:
//! - `DiskStore`: persistent storage under the repository state directory
//! - `MemoryStore`: in-memory storage for testing

mod error;
mod id;
mod object;
mod store;

pub use error::{OdbError, OdbResult};
pub use id::{hash_object, ObjectId, ObjectKind, ParseIdError};
pub use object::{Commit, EntryKind, Provenance, Signature, Tree, TreeEntry};
pub use store::{DiskStore, MemoryStore, ObjectStore};

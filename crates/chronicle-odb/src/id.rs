//! Object identifiers: SHA-256 over canonical object bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// The kind of a stored object.
///
/// Used for hash domain separation (a blob and a tree with identical
/// bytes must not collide) and for on-disk bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    /// Domain-separation tag mixed into the hash ahead of the payload.
    pub fn tag(&self) -> &'static [u8] {
        match self {
            ObjectKind::Blob => b"blob\0",
            ObjectKind::Tree => b"tree\0",
            ObjectKind::Commit => b"commit\0",
        }
    }

    /// Directory name used by the disk store.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blobs",
            ObjectKind::Tree => "trees",
            ObjectKind::Commit => "commits",
        }
    }
}

/// A content-addressed object id (SHA-256, 32 bytes).
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ObjectId([u8; 32]);

/// Error parsing an object id from hex.
#[derive(Debug, Error)]
#[error("Invalid object id: {0}")]
pub struct ParseIdError(String);

impl ObjectId {
    /// Create an id from raw digest bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the id as a byte slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a lowercase hex string.
    pub fn to_hex(&self) -> String {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        let mut hex = String::with_capacity(64);
        for &byte in &self.0 {
            hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
            hex.push(HEX_CHARS[(byte & 0xf) as usize] as char);
        }
        hex
    }

    /// Parse from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        if hex.len() != 64 {
            return Err(ParseIdError(format!(
                "expected 64 hex characters, got {}",
                hex.len()
            )));
        }

        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let high = hex_nibble(hex.as_bytes()[i * 2])?;
            let low = hex_nibble(hex.as_bytes()[i * 2 + 1])?;
            *byte = (high << 4) | low;
        }
        Ok(Self(bytes))
    }
}

fn hex_nibble(c: u8) -> Result<u8, ParseIdError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ParseIdError(format!("invalid hex character: {}", c as char))),
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ParseIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash canonical object bytes into an id, mixing in the object kind.
pub fn hash_object(kind: ObjectKind, payload: &[u8]) -> ObjectId {
    let mut hasher = Sha256::new();
    hasher.update(kind.tag());
    hasher.update(payload);
    ObjectId(hasher.finalize().into())
}

//! BLAKE3 digests of canonical path strings
//!
//! Digests key the bidirectional index. They narrow a lookup to one
//! candidate row; the row is only trusted after the full path string
//! matches, so a digest is never treated as an identifier on its own.

use serde::{Deserialize, Serialize};

/// A BLAKE3 digest of a canonical path (32 bytes)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PathHash([u8; 32]);

impl PathHash {
    /// Create a PathHash from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a lowercase hex string
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;

        let mut hex = String::with_capacity(64);
        for byte in self.0 {
            write!(hex, "{byte:02x}").expect("string formatting cannot fail");
        }
        hex
    }
}

impl std::fmt::Debug for PathHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PathHash({})", self.to_hex())
    }
}

impl std::fmt::Display for PathHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash a canonical path string using BLAKE3
pub fn hash_path(path: &str) -> PathHash {
    let hash = blake3::hash(path.as_bytes());
    PathHash::from_bytes(*hash.as_bytes())
}

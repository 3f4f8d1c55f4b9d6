//! Mapping rows stored in the index

use serde::{Deserialize, Serialize};

/// One logical <-> physical pair.
///
/// The same encoded row is stored in both index trees, under the BLAKE3
/// digest of the logical and the physical path respectively, so the
/// digests themselves never need to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Canonical logical path
    pub logical: String,
    /// Canonical physical path
    pub physical: String,
}

impl MappingEntry {
    /// Create a new row
    pub fn new(logical: impl Into<String>, physical: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            physical: physical.into(),
        }
    }

    /// Encode the row for storage
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a stored row
    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_round_trip() {
        let row = MappingEntry::new("/files/Ü.txt", "/files/u.txt");
        let decoded = MappingEntry::decode(&row.encode().unwrap()).unwrap();
        assert_eq!(decoded, row);
    }
}

//! Content-addressed keys for the disk store.

use sha2::{Digest, Sha256};

use crate::domain::entities::ResourceId;

/// Length in hex characters of every content key.
pub const KEY_LEN: usize = 32;

/// Stable, fixed-length hex digest of a resource identifier.
/// Doubles as the on-disk file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey(String);

impl ContentKey {
    /// Derives the key for a resource by hashing its identifier.
    #[must_use]
    pub fn for_resource(id: &ResourceId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(id.as_str().as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..KEY_LEN / 2]))
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Content fingerprints used as cache keys.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of the trimmed, lowercased text.
///
/// Texts that differ only in edge whitespace or letter case share a key.
/// Used for cache addressing only.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

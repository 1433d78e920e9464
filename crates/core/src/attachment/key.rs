//! Content keys for attachment blobs.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Key identifying an attachment blob by its content.
///
/// In practice it's `"sha1-"` followed by the base64 SHA-1 digest of the
/// bytes. Identical content always yields the same key, so the key doubles as
/// the deduplication identity and the storage address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Digest prefix of keys produced by [`ContentKey::for_data`].
    pub const SHA1_PREFIX: &'static str = "sha1-";

    /// Computes the key of a blob.
    #[must_use]
    pub fn for_data(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        Self(format!("{}{}", Self::SHA1_PREFIX, STANDARD.encode(digest)))
    }

    /// Wraps an existing key, e.g. a `digest` read from metadata.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store address of this key under `namespace`.
    #[must_use]
    pub fn storage_address(&self, namespace: &str) -> String {
        format!("{namespace}{}", self.0)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ContentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // sha1("hello") = aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d
        let key = ContentKey::for_data(b"hello");
        assert_eq!(key.as_str(), "sha1-qvTGHdzF6KLavt4PO0gs2a6pQ00=");
    }

    #[test]
    fn test_empty_content_has_a_key() {
        let key = ContentKey::for_data(b"");
        assert_eq!(key.as_str(), "sha1-2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn test_storage_address() {
        let key = ContentKey::new("sha1-abc");
        assert_eq!(key.storage_address("_sync:att:"), "_sync:att:sha1-abc");
    }

    #[test]
    fn test_serde_transparent() {
        let key = ContentKey::new("sha1-abc");
        let json = serde_json::to_string(&key).expect("serializable");
        assert_eq!(json, "\"sha1-abc\"");
        let back: ContentKey = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, key);
    }
}

//! Session identifier generation and hashing.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

/// Length of a session identifier.
pub const ID_LEN: usize = 64;

/// Length of the identifier prefix used as the storage key.
pub const STORAGE_KEY_LEN: usize = 32;

/// Generate a new random session identifier.
pub fn generate() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// Check that a client-supplied identifier has the shape of one we issued.
pub fn is_well_formed(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Storage key for an identifier.
///
/// Only the prefix reaches storage, so a storage listing cannot be replayed
/// as a cookie.
pub fn storage_key(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(STORAGE_KEY_LEN)
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    &id[..end]
}

/// Hash of the full identifier, stored inside the record.
pub fn hash(id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_well_formed() {
        let id = generate();
        assert_eq!(id.len(), ID_LEN);
        assert!(is_well_formed(&id));
    }

    #[test]
    fn test_generate_is_random() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn test_is_well_formed_rejects_garbage() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a".repeat(63)));
        assert!(!is_well_formed(&format!("{}/", "a".repeat(63))));
        assert!(is_well_formed(&"a".repeat(64)));
    }

    #[test]
    fn test_storage_key_is_prefix() {
        let id = generate();
        let key = storage_key(&id);
        assert_eq!(key.len(), STORAGE_KEY_LEN);
        assert!(id.starts_with(key));

        assert_eq!(storage_key("abc"), "abc");
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash("foo"), hash("foo"));
        assert_ne!(hash("foo"), hash("bar"));
        assert!(!hash("foo").is_empty());
    }
}

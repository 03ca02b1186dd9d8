//! Key-value storage backends for change history persistence.
//!
//! The change tracker treats durable storage as an external collaborator
//! that can only `get` and `set` opaque bytes under a string key. Both
//! operations may fail; callers decide how to degrade.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key {key:?}")]
    InvalidKey { key: String },

    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Durable key-value storage used to persist a history log.
pub trait KeyValueStore: Send + Sync {
    /// Read the bytes stored under `key`, or `None` if nothing was stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the bytes stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Check that `key` is safe to use as a file stem.
///
/// Accepts ASCII alphanumerics plus `-`, `_` and `.`, and rejects empty keys
/// and keys starting with `.`.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        assert!(validate_key("changeTracker").is_ok());
        assert!(validate_key("session-1_backup.v2").is_ok());
    }

    #[test]
    fn rejects_traversal_and_empty_keys() {
        for key in ["", ".hidden", "../escape", "a/b", "a\\b", "spaced key"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey { .. })),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn boxed_store_delegates() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
    }
}

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use crate::KeyValueStore;
use crate::StoreError;
use crate::validate_key;

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, value)?;
        std::fs::rename(&temp_path, &path)?;

        tracing::trace!(path = %path.display(), bytes = value.len(), "stored history state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert_eq!(store.get("changeTracker").unwrap(), None);
    }

    #[test]
    fn set_creates_directory_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested").join("state"));

        store.set("changeTracker", br#"{"records":[],"cursor":-1}"#).unwrap();

        let path = store.path_for("changeTracker").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(
            store.get("changeTracker").unwrap(),
            Some(br#"{"records":[],"cursor":-1}"#.to_vec())
        );
    }

    #[test]
    fn invalid_key_is_rejected_before_touching_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        let err = store.set("../outside", b"x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
        assert!(std::fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn unreadable_path_surfaces_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        // A directory where the file should be cannot be read as bytes.
        std::fs::create_dir_all(temp_dir.path().join("blocked.json")).unwrap();

        assert!(matches!(store.get("blocked"), Err(StoreError::Io(_))));
    }
}

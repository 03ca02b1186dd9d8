//! History log bound to durable storage.

use std::path::Path;
use std::path::PathBuf;

use change_tracker_store::FileStore;
use change_tracker_store::KeyValueStore;
use chrono::Utc;

use crate::config::TrackerConfig;
use crate::errors::HistoryError;
use crate::errors::Result;
use crate::log::HistoryLog;
use crate::record::ChangeDraft;
use crate::record::ChangeId;
use crate::record::ChangeRecord;
use crate::record::HistoryEntry;
use crate::record::Restoration;
use crate::snapshot::HistorySnapshot;
use crate::snapshot::encode_export;
use crate::snapshot::encode_state;
use crate::snapshot::export_file_name;

/// A [`HistoryLog`] persisted to a [`KeyValueStore`] after every mutation.
///
/// One tracker is owned per session by whatever applies content changes.
/// Storage failures never fail an operation: they are logged and the
/// in-memory log stays authoritative for the rest of the session.
#[derive(Debug)]
pub struct ChangeTracker<S> {
    log: HistoryLog,
    store: S,
    storage_key: String,
    history_page_size: usize,
}

impl ChangeTracker<FileStore> {
    /// Load the config and open a tracker on the configured storage directory.
    pub fn open_default() -> Result<Self> {
        let cfg = TrackerConfig::load()?;
        let store = FileStore::new(cfg.resolved_storage_dir());
        Ok(Self::open(store, &cfg))
    }
}

impl<S: KeyValueStore> ChangeTracker<S> {
    /// Open a tracker, hydrating it from `store`.
    ///
    /// Absent, unreadable or invalid stored state yields an empty log.
    pub fn open(store: S, cfg: &TrackerConfig) -> Self {
        let mut tracker = Self {
            log: HistoryLog::new(cfg.capacity),
            store,
            storage_key: cfg.storage_key.clone(),
            history_page_size: cfg.history_page_size,
        };
        tracker.hydrate();
        tracker
    }

    fn hydrate(&mut self) {
        let bytes = match self.store.get(&self.storage_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return,
            Err(e) => {
                let err = HistoryError::storage_with_source("failed to load history", e);
                tracing::warn!(
                    category = err.category().as_str(),
                    key = %self.storage_key,
                    "{err}; starting with empty history"
                );
                return;
            }
        };

        match HistorySnapshot::decode_unbounded(&bytes) {
            Ok(mut snapshot) => {
                let dropped = snapshot.trim_to_capacity(self.log.capacity());
                if dropped > 0 {
                    tracing::warn!(
                        dropped,
                        capacity = self.log.capacity(),
                        key = %self.storage_key,
                        "stored history exceeds capacity; dropped oldest records"
                    );
                }
                let cursor = snapshot.cursor_index();
                self.log.replace(snapshot.records, cursor);
                tracing::debug!(records = self.log.len(), "loaded change history");
            }
            Err(err) => tracing::warn!(
                category = err.category().as_str(),
                key = %self.storage_key,
                "stored history unusable ({err}); starting with empty history"
            ),
        }
    }

    fn persist(&self) {
        let bytes = match encode_state(&self.log) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(category = err.category().as_str(), "{err}");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.storage_key, &bytes) {
            let err = HistoryError::storage_with_source("failed to save history", e);
            tracing::warn!(
                category = err.category().as_str(),
                key = %self.storage_key,
                "{err}; keeping in-memory history only"
            );
        }
    }

    /// Record a change the caller has already applied, then persist.
    pub fn record(&mut self, draft: ChangeDraft) -> ChangeId {
        let id = self.log.record(draft).id();
        self.persist();
        id
    }

    /// See [`HistoryLog::undo`]. Navigation is not persisted.
    pub fn undo(&mut self) -> Option<Restoration> {
        self.log.undo()
    }

    /// See [`HistoryLog::redo`]. Navigation is not persisted.
    pub fn redo(&mut self) -> Option<Restoration> {
        self.log.redo()
    }

    /// See [`HistoryLog::restore_to`]. Persists on success only.
    pub fn restore_to(&mut self, id: ChangeId) -> Result<Vec<Restoration>> {
        let steps = self.log.restore_to(id)?;
        self.persist();
        Ok(steps)
    }

    /// The most recent `count` records, newest first.
    pub fn history(&self, count: usize) -> Vec<HistoryEntry<'_>> {
        self.log.history(count)
    }

    /// One page of recent history, sized by `history_page_size`.
    pub fn recent_history(&self) -> Vec<HistoryEntry<'_>> {
        self.log.history(self.history_page_size)
    }

    /// Every record touching `path`, oldest first.
    pub fn file_history(&self, path: &str) -> Vec<&ChangeRecord> {
        self.log.file_history(path)
    }

    /// Serialize the whole log as an export artifact.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        encode_export(&self.log, Utc::now())
    }

    /// Write an export artifact into `dir` and return its path.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let now = Utc::now();
        let bytes = encode_export(&self.log, now)?;
        let path = dir.join(export_file_name(now));
        std::fs::write(&path, bytes).map_err(|e| {
            HistoryError::io_with_source(format!("failed to write {}", path.display()), e)
        })?;

        tracing::info!(path = %path.display(), records = self.log.len(), "exported change history");
        Ok(path)
    }

    /// Replace the log with a snapshot, then persist.
    ///
    /// On error the current log is left untouched.
    pub fn import_snapshot(&mut self, bytes: &[u8]) -> Result<()> {
        let snapshot = HistorySnapshot::decode(bytes, self.log.capacity())?;
        let cursor = snapshot.cursor_index();
        self.log.replace(snapshot.records, cursor);
        self.persist();

        tracing::info!(records = self.log.len(), "imported change history");
        Ok(())
    }

    /// Read `path` and import its contents.
    pub async fn import_from_path(&mut self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            HistoryError::io_with_source(format!("failed to read {}", path.display()), e)
        })?;
        self.import_snapshot(&bytes)
    }

    /// Clear the log if `confirm` agrees. Returns whether it was cleared.
    pub fn reset(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        if !confirm() {
            tracing::debug!("history reset declined");
            return false;
        }

        self.log.clear();
        self.persist();
        tracing::info!("change history reset");
        true
    }

    /// Underlying in-memory log.
    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }
}

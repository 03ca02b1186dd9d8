//! In-memory linear history with a single cursor.

use std::collections::VecDeque;

use chrono::Utc;

use crate::errors::HistoryError;
use crate::errors::Result;
use crate::record::ChangeDraft;
use crate::record::ChangeId;
use crate::record::ChangeKind;
use crate::record::ChangeRecord;
use crate::record::HistoryEntry;
use crate::record::Restoration;

/// Default bound on the number of retained records
pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded undo/redo log of change records.
///
/// Records are kept in recording order. The cursor marks the record whose
/// `after` content is currently applied; `None` means nothing is applied
/// and there is nothing to undo. This type performs no I/O; see
/// [`crate::ChangeTracker`] for the persisted variant.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    records: VecDeque<ChangeRecord>,
    cursor: Option<usize>,
    capacity: usize,
    last_issued: Option<ChangeId>,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryLog {
    /// Create an empty log holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
            last_issued: None,
        }
    }

    /// Record a mutation the caller has already applied.
    ///
    /// Any records after the cursor are discarded first, so the log stays
    /// linear. When the log is full the oldest record is evicted.
    pub fn record(&mut self, draft: ChangeDraft) -> &ChangeRecord {
        let keep = self.cursor.map_or(0, |c| c + 1);
        if keep < self.records.len() {
            tracing::debug!(
                discarded = self.records.len() - keep,
                "discarding redo branch"
            );
            self.records.truncate(keep);
        }

        let now = Utc::now();
        let id = ChangeId::next(self.last_issued, now);
        self.last_issued = Some(id);
        self.records.push_back(ChangeRecord::from_draft(draft, id, now));

        if self.records.len() > self.capacity
            && let Some(evicted) = self.records.pop_front()
        {
            tracing::debug!(id = %evicted.id(), path = evicted.path(), "evicted oldest change");
        }
        let last = self.records.len() - 1;
        self.cursor = Some(last);

        let record = &self.records[last];
        log_change(record);
        record
    }

    /// Step back one record, returning the `before` content to re-apply.
    pub fn undo(&mut self) -> Option<Restoration> {
        let Some(index) = self.cursor else {
            tracing::debug!("nothing to undo");
            return None;
        };
        let record = self.records.get(index)?;
        let restoration = Restoration::before(record);
        tracing::debug!(path = record.path(), description = record.description(), "undo");

        self.cursor = index.checked_sub(1);
        Some(restoration)
    }

    /// Step forward one record, returning the `after` content to re-apply.
    pub fn redo(&mut self) -> Option<Restoration> {
        let next = self.cursor.map_or(0, |c| c + 1);
        let Some(record) = self.records.get(next) else {
            tracing::debug!("nothing to redo");
            return None;
        };
        let restoration = Restoration::after(record);
        tracing::debug!(path = record.path(), description = record.description(), "redo");

        self.cursor = Some(next);
        Some(restoration)
    }

    /// Move the cursor back to the record with `id`.
    ///
    /// Returns the `before` snapshots of every record between the old and
    /// new cursor, most recent first: applying them in order walks the
    /// resources back to the target. Targets at or after the cursor only
    /// reposition it and return nothing; use [`HistoryLog::redo`] to replay
    /// forward.
    pub fn restore_to(&mut self, id: ChangeId) -> Result<Vec<Restoration>> {
        let Some(target) = self.position(id) else {
            tracing::warn!(%id, "restore point not found");
            return Err(HistoryError::not_found(id));
        };

        let steps: Vec<Restoration> = match self.cursor {
            Some(current) if current > target => self
                .records
                .range(target + 1..=current)
                .rev()
                .map(Restoration::before)
                .collect(),
            _ => Vec::new(),
        };

        tracing::debug!(%id, steps = steps.len(), "restored to change");
        self.cursor = Some(target);
        Ok(steps)
    }

    /// The most recent `count` records, newest first.
    pub fn history(&self, count: usize) -> Vec<HistoryEntry<'_>> {
        self.records
            .iter()
            .enumerate()
            .rev()
            .take(count)
            .map(|(index, record)| HistoryEntry {
                record,
                is_current: self.cursor == Some(index),
            })
            .collect()
    }

    /// Every record touching `path`, oldest first.
    pub fn file_history(&self, path: &str) -> Vec<&ChangeRecord> {
        self.records.iter().filter(|r| r.path() == path).collect()
    }

    /// Drop every record and move the cursor before the start.
    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = None;
    }

    /// Replace the contents wholesale. Callers validate the input first.
    pub(crate) fn replace(&mut self, records: Vec<ChangeRecord>, cursor: Option<usize>) {
        let newest = records.iter().map(ChangeRecord::id).max();
        self.last_issued = self.last_issued.max(newest);
        self.records = records.into();
        self.cursor = cursor;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.records.len()
    }

    /// Index of the current record, `None` when before the first record.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The record at the cursor.
    pub fn current(&self) -> Option<&ChangeRecord> {
        self.cursor.and_then(|c| self.records.get(c))
    }

    pub fn records(&self) -> impl DoubleEndedIterator<Item = &ChangeRecord> + ExactSizeIterator {
        self.records.iter()
    }

    pub fn get(&self, id: ChangeId) -> Option<&ChangeRecord> {
        self.position(id).and_then(|index| self.records.get(index))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: ChangeId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

/// Diagnostic line for a freshly recorded change.
fn log_change(record: &ChangeRecord) {
    let description = if record.description().is_empty() {
        "No description"
    } else {
        record.description()
    };

    match record.kind() {
        ChangeKind::Update => tracing::info!(
            id = %record.id(),
            kind = %record.kind(),
            path = record.path(),
            description,
            old_size = record.before().map_or(0, str::len),
            new_size = record.after().map_or(0, str::len),
            "recorded change"
        ),
        ChangeKind::Create | ChangeKind::Delete => tracing::info!(
            id = %record.id(),
            kind = %record.kind(),
            path = record.path(),
            description,
            "recorded change"
        ),
    }
}

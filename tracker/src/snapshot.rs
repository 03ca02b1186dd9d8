//! Persisted and exported forms of a history log.
//!
//! Both forms share one layout, `{"records": [...], "cursor": n}`, where a
//! cursor of `-1` means nothing is applied. Exports add an `exportDate`.
//! Decoding rejects anything that would break the log's invariants rather
//! than clamping it. The one exception is stored state written under a larger
//! capacity, which is trimmed from the oldest end on load.

use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::HistoryError;
use crate::errors::Result;
use crate::log::HistoryLog;
use crate::record::ChangeRecord;

/// Stored state as read back from storage or an import.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistorySnapshot {
    #[serde(alias = "changes")]
    pub records: Vec<ChangeRecord>,
    #[serde(alias = "currentIndex")]
    pub cursor: i64,
}

impl HistorySnapshot {
    /// Decode and validate snapshot bytes for a log holding at most `capacity` records.
    pub fn decode(bytes: &[u8], capacity: usize) -> Result<Self> {
        let snapshot = Self::decode_unbounded(bytes)?;
        let len = snapshot.records.len();
        if len > capacity {
            return Err(HistoryError::schema(format!(
                "snapshot holds {len} records but capacity is {capacity}"
            )));
        }
        Ok(snapshot)
    }

    /// Decode and validate snapshot bytes without checking them against a capacity.
    pub fn decode_unbounded(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| HistoryError::parse_with_source("snapshot is not valid JSON", e))?;
        let snapshot: HistorySnapshot = serde_json::from_value(value)
            .map_err(|e| HistoryError::schema_with_source("snapshot has an invalid shape", e))?;

        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Drop the oldest records beyond `capacity`, shifting the cursor with them.
    ///
    /// A cursor that pointed at a dropped record ends up at `-1`. Returns the
    /// number of records dropped.
    pub fn trim_to_capacity(&mut self, capacity: usize) -> usize {
        let excess = self.records.len().saturating_sub(capacity);
        if excess == 0 {
            return 0;
        }

        self.records.drain(..excess);
        let shift = i64::try_from(excess).unwrap_or(i64::MAX);
        self.cursor = self.cursor.saturating_sub(shift).max(-1);
        excess
    }

    /// Cursor as an index, `None` for `-1`. Only meaningful after validation.
    pub fn cursor_index(&self) -> Option<usize> {
        usize::try_from(self.cursor).ok()
    }

    fn validate(&self) -> Result<()> {
        let len = self.records.len();
        let in_range = self.cursor == -1
            || self
                .cursor_index()
                .is_some_and(|index| index < len);
        if !in_range {
            return Err(HistoryError::schema(format!(
                "cursor {} out of range for {len} records",
                self.cursor
            )));
        }

        let mut seen = HashSet::with_capacity(len);
        if let Some(dup) = self.records.iter().find(|r| !seen.insert(r.id())) {
            return Err(HistoryError::schema(format!(
                "duplicate change id {}",
                dup.id()
            )));
        }

        Ok(())
    }
}

/// Borrowed view of a log, serialized for storage or export.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    export_date: Option<DateTime<Utc>>,
    records: Vec<&'a ChangeRecord>,
    cursor: i64,
}

impl<'a> SnapshotRef<'a> {
    fn of(log: &'a HistoryLog, export_date: Option<DateTime<Utc>>) -> Self {
        let cursor = log
            .cursor()
            .and_then(|index| i64::try_from(index).ok())
            .unwrap_or(-1);
        Self {
            export_date,
            records: log.records().collect(),
            cursor,
        }
    }
}

/// Compact form written to durable storage.
pub fn encode_state(log: &HistoryLog) -> Result<Vec<u8>> {
    serde_json::to_vec(&SnapshotRef::of(log, None))
        .map_err(|e| HistoryError::internal_with_source("failed to serialize history", e))
}

/// Pretty-printed export artifact stamped with `export_date`.
pub fn encode_export(log: &HistoryLog, export_date: DateTime<Utc>) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(&SnapshotRef::of(log, Some(export_date)))
        .map_err(|e| HistoryError::internal_with_source("failed to serialize history export", e))
}

/// File name for an export taken at `export_date`.
pub fn export_file_name(export_date: DateTime<Utc>) -> String {
    format!("change-history-{}.json", export_date.timestamp_millis())
}

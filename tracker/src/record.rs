//! Change records and the values handed back to callers.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identifier of a change record, also used as a restore point.
///
/// Ids are Unix milliseconds at creation time, bumped forward when needed so
/// that they strictly increase within a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(i64);

impl ChangeId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Next id after `last_issued`, based on the current wall clock.
    pub(crate) fn next(last_issued: Option<ChangeId>, now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis();
        match last_issued {
            Some(last) if last.0 >= millis => Self(last.0.saturating_add(1)),
            _ => Self(millis),
        }
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Semantic category of a recorded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Resource came into existence; there is no `before` content
    Create,
    /// Resource content was replaced
    Update,
    /// Resource was removed; there is no `after` content
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Create => write!(f, "create"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// One logged mutation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    id: ChangeId,
    timestamp: DateTime<Utc>,
    #[serde(alias = "type")]
    kind: ChangeKind,
    path: String,
    #[serde(alias = "oldContent")]
    before: Option<String>,
    #[serde(alias = "newContent")]
    after: Option<String>,
    #[serde(default)]
    description: String,
}

impl ChangeRecord {
    pub(crate) fn from_draft(draft: ChangeDraft, id: ChangeId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            kind: draft.kind,
            path: draft.path,
            before: draft.before,
            after: draft.after,
            description: draft.description,
        }
    }

    pub fn id(&self) -> ChangeId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Content prior to the mutation (`None` for creates)
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    /// Content after the mutation (`None` for deletes)
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Arguments of a `record` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDraft {
    pub kind: ChangeKind,
    pub path: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub description: String,
}

impl ChangeDraft {
    pub fn new(
        kind: ChangeKind,
        path: impl Into<String>,
        before: Option<String>,
        after: Option<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            before,
            after,
            description: String::new(),
        }
    }

    /// A resource was created with `after` as its content
    pub fn create(path: impl Into<String>, after: impl Into<String>) -> Self {
        Self::new(ChangeKind::Create, path, None, Some(after.into()))
    }

    /// A resource's content changed from `before` to `after`
    pub fn update(
        path: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self::new(
            ChangeKind::Update,
            path,
            Some(before.into()),
            Some(after.into()),
        )
    }

    /// A resource holding `before` was deleted
    pub fn delete(path: impl Into<String>, before: impl Into<String>) -> Self {
        Self::new(ChangeKind::Delete, path, Some(before.into()), None)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Content the caller must apply to `path` to move through history.
///
/// `content` of `None` means the resource should not exist at that point
/// (undoing a create, or redoing a delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restoration {
    pub path: String,
    pub content: Option<String>,
    /// Record this restoration was derived from
    pub change_id: ChangeId,
}

impl Restoration {
    pub(crate) fn before(record: &ChangeRecord) -> Self {
        Self {
            path: record.path.clone(),
            content: record.before.clone(),
            change_id: record.id,
        }
    }

    pub(crate) fn after(record: &ChangeRecord) -> Self {
        Self {
            path: record.path.clone(),
            content: record.after.clone(),
            change_id: record.id,
        }
    }
}

/// A record as listed by `history`, flagged when the cursor sits on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<'a> {
    #[serde(flatten)]
    pub record: &'a ChangeRecord,
    pub is_current: bool,
}

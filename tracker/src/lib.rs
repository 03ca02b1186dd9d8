//! Change history engine.
//!
//! Records content mutations keyed by a logical resource path in a bounded,
//! strictly linear undo/redo log:
//! - Recording after an undo discards the abandoned redo branch
//! - The oldest record is evicted once capacity is reached
//! - Undo, redo and point-in-time restore hand back the content the caller
//!   must re-apply; the engine never touches the resources itself
//! - The log is persisted through a pluggable key-value store and can be
//!   exported and imported as JSON
//!
//! Content is opaque: snapshots are stored whole and never diffed.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod errors;
pub mod log;
pub mod record;
pub mod snapshot;
mod tracker;

pub use config::TrackerConfig;
pub use errors::ErrorCategory;
pub use errors::HistoryError;
pub use errors::Result;
pub use log::DEFAULT_CAPACITY;
pub use log::HistoryLog;
pub use record::ChangeDraft;
pub use record::ChangeId;
pub use record::ChangeKind;
pub use record::ChangeRecord;
pub use record::HistoryEntry;
pub use record::Restoration;
pub use snapshot::HistorySnapshot;
pub use tracker::ChangeTracker;

pub use change_tracker_store::FileStore;
pub use change_tracker_store::KeyValueStore;
pub use change_tracker_store::MemoryStore;
pub use change_tracker_store::StoreError;

//! Change tracker error types
//!
//! Errors that would break the linear-history invariant (restoring to an
//! unknown id, importing malformed state) reject the whole operation.
//! Storage failures are downgraded to warnings by the tracker and only
//! appear here when a caller asks for them explicitly.

use crate::record::ChangeId;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error category for structured logging and caller-side mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `restore_to` given an id absent from the log
    NotFound,
    /// Snapshot bytes are not well-formed JSON
    ParseError,
    /// Snapshot is well-formed but structurally invalid
    SchemaError,
    /// Durable storage could not be read or written
    StorageUnavailable,
    /// Configuration file or values are invalid
    ConfigError,
    /// Reading or writing an import/export file failed
    IoError,
    /// Unexpected logic bugs
    InternalError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::ParseError => "PARSE_ERROR",
            Self::SchemaError => "SCHEMA_ERROR",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the session can carry on unchanged after this error
    pub fn recoverable(&self) -> bool {
        !matches!(self, Self::ConfigError | Self::InternalError)
    }
}

/// Change tracker error with category and context
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("change {id} not found in history")]
    NotFound { id: ChangeId },

    #[error("parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("schema error: {message}")]
    Schema {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("io error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl HistoryError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Parse { .. } => ErrorCategory::ParseError,
            Self::Schema { .. } => ErrorCategory::SchemaError,
            Self::StorageUnavailable { .. } => ErrorCategory::StorageUnavailable,
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::Io { .. } => ErrorCategory::IoError,
            Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    pub fn not_found(id: ChangeId) -> Self {
        Self::NotFound { id }
    }

    /// Create a parse error with source
    pub fn parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            source: None,
        }
    }

    /// Create a schema error with source
    pub fn schema_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Schema {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error with source
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for change tracker operations
pub type Result<T> = std::result::Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_codes_are_stable() {
        assert_eq!(
            HistoryError::not_found(ChangeId::new(7)).category().as_str(),
            "NOT_FOUND"
        );
        assert_eq!(
            HistoryError::schema("missing records").category().as_str(),
            "SCHEMA_ERROR"
        );
    }

    #[test]
    fn display_includes_message() {
        let err = HistoryError::schema("cursor 5 out of range");
        assert_eq!(err.to_string(), "schema error: cursor 5 out of range");
        assert_eq!(
            HistoryError::not_found(ChangeId::new(42)).to_string(),
            "change 42 not found in history"
        );
    }

    #[test]
    fn only_config_and_internal_are_unrecoverable() {
        assert!(ErrorCategory::StorageUnavailable.recoverable());
        assert!(ErrorCategory::NotFound.recoverable());
        assert!(!ErrorCategory::ConfigError.recoverable());
        assert!(!ErrorCategory::InternalError.recoverable());
    }
}

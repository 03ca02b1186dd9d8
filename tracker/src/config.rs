//! Change tracker configuration loading
//!
//! Loads configuration from `~/.config/change-tracker/config.toml` (or the
//! `CHANGE_TRACKER_CONFIG` env var). Every field is optional.

use crate::errors::HistoryError;
use crate::errors::Result;
use crate::log::DEFAULT_CAPACITY;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;

/// Root configuration for a change tracker
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Maximum number of records retained; oldest are evicted first
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Key the log is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory for the file-backed store (`~/` is expanded)
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Number of entries returned by `recent_history`
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_storage_key() -> String {
    "changeTracker".to_string()
}

fn default_storage_dir() -> String {
    "~/.config/change-tracker".to_string()
}

fn default_history_page_size() -> usize {
    10
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            storage_key: default_storage_key(),
            storage_dir: default_storage_dir(),
            history_page_size: default_history_page_size(),
        }
    }
}

impl TrackerConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "CHANGE_TRACKER_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "config.toml";

    /// Load configuration from file
    ///
    /// Resolution order:
    /// 1. `CHANGE_TRACKER_CONFIG` environment variable
    /// 2. `~/.config/change-tracker/config.toml`
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "change tracker config not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HistoryError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: TrackerConfig = toml::from_str(contents)
            .map_err(|e| HistoryError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("change-tracker")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(HistoryError::config("capacity must be at least 1"));
        }
        if self.history_page_size == 0 {
            return Err(HistoryError::config("history_page_size must be at least 1"));
        }
        change_tracker_store::validate_key(&self.storage_key).map_err(|e| {
            HistoryError::config_with_source(
                format!("storage_key {:?} is not a valid storage key", self.storage_key),
                e,
            )
        })?;

        if self.capacity > 10_000 {
            tracing::warn!(
                capacity = self.capacity,
                "large history capacity; every record keeps two full snapshots"
            );
        }

        Ok(())
    }

    /// Get the resolved storage directory (expanding ~ if needed)
    pub fn resolved_storage_dir(&self) -> PathBuf {
        let path = &self.storage_dir;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = TrackerConfig::parse("").unwrap();
        assert_eq!(cfg, TrackerConfig::default());
        assert_eq!(cfg.capacity, 50);
        assert_eq!(cfg.storage_key, "changeTracker");
        assert_eq!(cfg.history_page_size, 10);
    }

    #[test]
    fn partial_file_overrides_fields() {
        let cfg = TrackerConfig::parse(
            r#"
capacity = 5
storage_dir = "/var/lib/history"
"#,
        )
        .unwrap();

        assert_eq!(cfg.capacity, 5);
        assert_eq!(cfg.storage_key, "changeTracker");
        assert_eq!(cfg.resolved_storage_dir(), PathBuf::from("/var/lib/history"));
    }

    #[test]
    fn zero_capacity_is_a_config_error() {
        let err = TrackerConfig::parse("capacity = 0").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ConfigError);
    }

    #[test]
    fn blank_storage_key_is_a_config_error() {
        let err = TrackerConfig::parse(r#"storage_key = "  ""#).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ConfigError);
    }

    #[test]
    fn storage_key_must_be_usable_by_the_store() {
        for key in ["my history", "a/b", "../escape", ".hidden"] {
            let err = TrackerConfig::parse(&format!("storage_key = {key:?}")).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::ConfigError, "{key:?}");
        }

        let cfg = TrackerConfig::parse(r#"storage_key = "site-history.v2""#).unwrap();
        assert_eq!(cfg.storage_key, "site-history.v2");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = TrackerConfig::parse("capacity = [").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ConfigError);
    }

    #[test]
    fn load_from_path_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "history_page_size = 20\n").unwrap();

        let cfg = TrackerConfig::load_from_path(&path).unwrap();
        assert_eq!(cfg.history_page_size, 20);
    }

    #[test]
    fn load_from_missing_path_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = TrackerConfig::load_from_path(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ConfigError);
    }

    #[test]
    fn tilde_is_expanded_against_home() {
        let cfg = TrackerConfig::default();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                cfg.resolved_storage_dir(),
                home.join(".config").join("change-tracker")
            );
        }
    }
}

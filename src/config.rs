//! Engine configuration
//!
//! Loaded from a JSON file; every field is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::SortOrder;
use crate::observability::{log_event, Event};
use crate::uint_set::{SetSelection, DEFAULT_ARENA_BYTES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding `card_<prop>.json` and `card_<order>.sort` (default: "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Use an inline set for records with at most 32 versions (default: true)
    #[serde(default = "default_true")]
    pub small_set_optimization: bool,

    /// Arena bitset (true) or arena sorted array (false) for larger records (default: true)
    #[serde(default = "default_true")]
    pub bitset: bool,

    /// Bytes per set arena (default: 256 KiB)
    #[serde(default = "default_arena_bytes")]
    pub arena_bytes: usize,

    /// Pipeline attempts per execution (default: 2)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Minimum seconds between forced refetches of a stale dataset (default: 60)
    #[serde(default = "default_refetch_interval_secs")]
    pub refetch_interval_secs: u64,

    #[serde(default)]
    pub default_sort_order: SortOrder,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

fn default_arena_bytes() -> usize {
    DEFAULT_ARENA_BYTES
}

fn default_max_attempts() -> u32 {
    2
}

fn default_refetch_interval_secs() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            small_set_optimization: default_true(),
            bitset: default_true(),
            arena_bytes: default_arena_bytes(),
            max_attempts: default_max_attempts(),
            refetch_interval_secs: default_refetch_interval_secs(),
            default_sort_order: SortOrder::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;

        log_event(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("data_dir", &config.data_dir.display().to_string()),
            ],
        );

        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be > 0".to_string()));
        }
        Ok(())
    }

    /// Version-set implementation flags for the evaluator
    pub fn set_selection(&self) -> SetSelection {
        SetSelection {
            small_set_optimization: self.small_set_optimization,
            bitset: self.bitset,
        }
    }

    pub fn refetch_interval(&self) -> Duration {
        Duration::from_secs(self.refetch_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.arena_bytes, 262_144);
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.refetch_interval(), Duration::from_secs(60));
        assert_eq!(config.default_sort_order, SortOrder::Name);
        assert_eq!(config.set_selection(), SetSelection::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cardquery.json");
        fs::write(&path, r#"{"bitset": false, "default_sort_order": "released_at"}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(!config.bitset);
        assert!(config.small_set_optimization);
        assert_eq!(config.default_sort_order, SortOrder::ReleasedAt);
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn test_invalid_files() {
        let dir = TempDir::new().unwrap();

        let missing = EngineConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let path = dir.path().join("zero.json");
        fs::write(&path, r#"{"max_attempts": 0}"#).unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Json(_))));
    }
}

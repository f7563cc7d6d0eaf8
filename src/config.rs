//! Index configuration
//!
//! Controls how much leaf data the out-of-core backend keeps resident and where
//! spilled leaves are written. The fan-out of the tree itself (`M`, `MAX_SIZE`) is
//! fixed at compile time.

use crate::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of leaf lists kept resident by the shared leaf cache
pub const DEFAULT_LEAF_CACHE_CAPACITY: usize = 256;

/// Default file name prefix for spilled leaves
pub const DEFAULT_TEMP_FILE_PREFIX: &str = "filecache";

/// Configuration for the shared leaf cache of file-backed storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum number of leaf lists held in memory at once
    ///
    /// Every resident leaf of a file-backed tree holds up to `MAX_SIZE` entities,
    /// so resident memory is roughly `leaf_cache_capacity * MAX_SIZE * size_of::<E>()`.
    pub leaf_cache_capacity: usize,

    /// Directory for spilled leaves (None = system temp dir)
    pub temp_dir: Option<PathBuf>,

    /// File name prefix for spilled leaves
    pub temp_file_prefix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            leaf_cache_capacity: DEFAULT_LEAF_CACHE_CAPACITY,
            temp_dir: None,
            temp_file_prefix: DEFAULT_TEMP_FILE_PREFIX.to_string(),
        }
    }
}

impl IndexConfig {
    /// Configuration for bulk ingestion (large resident set)
    pub fn for_bulk_load() -> Self {
        Self {
            leaf_cache_capacity: 4096,
            ..Default::default()
        }
    }

    /// Configuration for tests: a tiny resident set so that eviction happens early
    pub fn for_testing() -> Self {
        Self {
            leaf_cache_capacity: 2,
            ..Default::default()
        }
    }

    pub fn with_leaf_cache_capacity(mut self, capacity: usize) -> Self {
        self.leaf_cache_capacity = capacity;
        self
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_temp_file_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.temp_file_prefix = prefix.into();
        self
    }

    /// Check the configuration before it is used to build a cache
    pub fn validate(&self) -> Result<()> {
        if self.leaf_cache_capacity < 1 {
            return Err(IndexError::InvalidArgument(
                "leaf_cache_capacity must be greater than 0".into(),
            ));
        }
        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                return Err(IndexError::Config(format!(
                    "temp_dir {} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.leaf_cache_capacity, 256);
        assert_eq!(config.temp_file_prefix, "filecache");
        assert!(config.temp_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_presets() {
        assert!(IndexConfig::for_bulk_load().leaf_cache_capacity > DEFAULT_LEAF_CACHE_CAPACITY);
        assert_eq!(IndexConfig::for_testing().leaf_cache_capacity, 2);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = IndexConfig::default().with_leaf_cache_capacity(0);
        assert!(matches!(config.validate(), Err(IndexError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_temp_dir_rejected() {
        let temp = TempDir::new().unwrap();
        let config = IndexConfig::default().with_temp_dir(temp.path().join("missing"));
        assert!(matches!(config.validate(), Err(IndexError::Config(_))));
    }

    #[test]
    fn test_json_partial_config() {
        let config = IndexConfig::from_json_str(r#"{ "leaf_cache_capacity": 8 }"#).unwrap();
        assert_eq!(config.leaf_cache_capacity, 8);
        assert_eq!(config.temp_file_prefix, DEFAULT_TEMP_FILE_PREFIX);

        let err = IndexConfig::from_json_str(r#"{ "leaf_cache_capacity": 0 }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let temp = TempDir::new().unwrap();
        let config = IndexConfig::default()
            .with_leaf_cache_capacity(16)
            .with_temp_dir(temp.path())
            .with_temp_file_prefix("leaf");

        let path = temp.path().join("index.json");
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = IndexConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}

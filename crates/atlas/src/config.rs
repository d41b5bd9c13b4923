//! Configuration for the atlas CLI.
//!
//! Configuration lives in `.atlas/config.yaml` at the workspace root. The
//! root is found by walking up from the working directory.

use crate::error::{Error, Result};
use crate::traverse::TraversalType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the atlas directory
pub const ATLAS_DIR_NAME: &str = ".atlas";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the relationship data file
pub const DATA_FILE_NAME: &str = "relationships.jsonl";

/// Default workspace label
pub const DEFAULT_WORKSPACE: &str = "default";

/// Maximum directory depth to walk up when searching for the atlas root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AtlasConfig {
    /// Workspace label attached to every view
    pub workspace: String,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Traversal defaults
    #[serde(default)]
    pub traversal: TraversalConfig,

    /// Path cache behaviour
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Storage section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Relationship JSONL file, relative to the workspace root
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: format!("{ATLAS_DIR_NAME}/{DATA_FILE_NAME}"),
        }
    }
}

/// Traversal section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TraversalConfig {
    /// Edge order for traversals that do not choose their own
    #[serde(default)]
    pub default_type: TraversalType,
}

/// Cache section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Save view caches into the data file after each traversal
    #[serde(default)]
    pub persist: bool,
}

impl AtlasConfig {
    /// A default configuration for `workspace`.
    pub fn new(workspace: &str) -> Self {
        Self {
            workspace: workspace.to_string(),
            storage: StorageConfig::default(),
            traversal: TraversalConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check field values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a blank workspace or data file.
    pub fn validate(&self) -> Result<()> {
        if self.workspace.trim().is_empty() {
            return Err(Error::Config("workspace must not be empty".to_string()));
        }
        if self.storage.data_file.trim().is_empty() {
            return Err(Error::Config("storage.data-file must not be empty".to_string()));
        }
        Ok(())
    }

    /// The data file, resolved against `root`.
    pub fn data_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.data_file)
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKSPACE)
    }
}

/// Find the directory containing `.atlas/`, starting at `start_dir` and
/// walking up.
pub fn find_atlas_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(ATLAS_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut original = AtlasConfig::new("build-42");
        original.traversal.default_type = TraversalType::BreadthFirst;
        original.cache.persist = true;
        original.save(&path).unwrap();

        assert_eq!(AtlasConfig::load(&path).unwrap(), original);
    }

    #[test]
    fn test_yaml_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        AtlasConfig::new("ws").save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("workspace: ws"));
        assert!(content.contains("data-file: .atlas/relationships.jsonl"));
        assert!(content.contains("default-type: depth-first"));
        assert!(content.contains("persist: false"));
    }

    #[test]
    fn test_missing_sections_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "workspace: minimal\n").unwrap();

        let config = AtlasConfig::load(&path).unwrap();
        assert_eq!(config.storage, StorageConfig::default());
        assert!(!config.cache.persist);
    }

    #[test]
    fn test_blank_workspace_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "workspace: '  '\n").unwrap();

        let err = AtlasConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("workspace"));
    }

    #[test]
    fn test_find_root_from_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(ATLAS_DIR_NAME)).unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_atlas_root(&nested), Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn test_find_root_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_atlas_root(temp_dir.path()).is_none());
    }
}

//! Application context for CLI command execution.
//!
//! [`App`] finds the atlas root, loads its configuration and data file, and
//! owns the [`RelationshipGraph`] commands run against.

use crate::config::{ATLAS_DIR_NAME, AtlasConfig, CONFIG_FILE_NAME, find_atlas_root};
use crate::domain::ProjectVersionRef;
use crate::error::{Error, Result};
use crate::graph::GraphView;
use crate::relationship_graph::RelationshipGraph;
use crate::storage::GraphStorage;
use crate::storage::in_memory::{InMemoryStorage, LoadWarning, load_from_jsonl, save_to_jsonl};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Application context for CLI operations.
pub struct App {
    storage: Arc<InMemoryStorage>,
    graph: RelationshipGraph,
    config: AtlasConfig,
    root_dir: PathBuf,
    warnings: Vec<LoadWarning>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root_dir", &self.root_dir)
            .field("workspace", &self.config.workspace)
            .field("warnings", &self.warnings.len())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.atlas/`, loads the
    /// configuration, then the data file. A missing data file is treated
    /// as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if no atlas root is found, the configuration is
    /// invalid, or the data file cannot be read.
    pub fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_atlas_root(working_dir).ok_or_else(|| {
            Error::Config("Not an atlas workspace (run 'atlas init' first)".to_string())
        })?;
        let config = AtlasConfig::load(&root_dir.join(ATLAS_DIR_NAME).join(CONFIG_FILE_NAME))?;

        let data_path = config.data_path(&root_dir);
        let (storage, warnings) = if data_path.exists() {
            load_from_jsonl(&data_path)?
        } else {
            debug!(path = %data_path.display(), "No data file yet, starting empty");
            (InMemoryStorage::new(), Vec::new())
        };
        for warning in &warnings {
            warn!(path = %data_path.display(), %warning, "Data file problem");
        }

        let storage = Arc::new(storage);
        let graph = RelationshipGraph::new(Arc::clone(&storage) as Arc<dyn GraphStorage>);
        Ok(Self {
            storage,
            graph,
            config,
            root_dir,
            warnings,
        })
    }

    /// The relationship graph.
    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    /// The loaded configuration.
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// The directory containing `.atlas/`.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Problems found while loading the data file.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// A view over `roots` in this workspace.
    pub fn view(&self, roots: impl IntoIterator<Item = ProjectVersionRef>) -> GraphView {
        GraphView::new(self.config.workspace.clone(), roots)
    }

    /// Persist `view`'s cache if the configuration asks for it. Returns
    /// whether anything was written to storage.
    ///
    /// # Errors
    ///
    /// Returns serialization or storage errors.
    pub fn persist_if_configured(&self, view: &GraphView) -> Result<bool> {
        if !self.config.cache.persist {
            return Ok(false);
        }
        Ok(self.graph.persist_cache(view)? > 0)
    }

    /// Write storage back to the data file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Json` if writing fails.
    pub fn save(&self) -> Result<()> {
        save_to_jsonl(&self.storage, &self.config.data_path(&self.root_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use tempfile::TempDir;

    #[test]
    fn test_app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("ws")).unwrap();

        let app = App::from_directory(temp_dir.path()).unwrap();
        assert_eq!(app.config().workspace, "ws");
        assert!(app.load_warnings().is_empty());
        assert_eq!(app.view(Vec::new()).workspace(), "ws");
    }

    #[test]
    fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None).unwrap();
        let nested = temp_dir.path().join("modules").join("core");
        std::fs::create_dir_all(&nested).unwrap();

        let app = App::from_directory(&nested).unwrap();
        assert_eq!(app.root_dir(), temp_dir.path());
    }

    #[test]
    fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = App::from_directory(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("Not an atlas workspace"));
    }
}

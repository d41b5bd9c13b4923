//! Implementation of the `init` command.
//!
//! Creates the `.atlas/` directory with a default configuration and an
//! empty relationship data file.

use crate::config::{ATLAS_DIR_NAME, AtlasConfig, CONFIG_FILE_NAME, DEFAULT_WORKSPACE};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum workspace label length
pub const MAX_WORKSPACE_LENGTH: usize = 64;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// The created `.atlas` directory
    pub atlas_dir: PathBuf,
    /// The created config file
    pub config_file: PathBuf,
    /// The created data file
    pub data_file: PathBuf,
    /// The workspace label written to the config
    pub workspace: String,
}

/// Validate a workspace label: non-empty, at most 64 characters, and
/// limited to ASCII letters, digits, `-`, `_` and `.`.
///
/// Expects pre-trimmed input.
///
/// # Errors
///
/// Returns `Error::Config` describing the first rule broken.
pub fn validate_workspace(workspace: &str) -> Result<()> {
    if workspace.is_empty() {
        return Err(Error::Config("Workspace must not be empty".to_string()));
    }
    if workspace.len() > MAX_WORKSPACE_LENGTH {
        return Err(Error::Config(format!(
            "Workspace cannot exceed {MAX_WORKSPACE_LENGTH} characters"
        )));
    }
    if !workspace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::Config(
            "Workspace may only contain letters, digits, '-', '_' and '.'".to_string(),
        ));
    }
    Ok(())
}

/// Initialize atlas in `base_dir`.
///
/// # Errors
///
/// Returns an error if `.atlas/` already exists, the workspace label is
/// invalid, or a file operation fails.
pub fn init(base_dir: &Path, workspace: Option<&str>) -> Result<InitResult> {
    let workspace = workspace.unwrap_or(DEFAULT_WORKSPACE).trim();
    validate_workspace(workspace)?;

    let atlas_dir = base_dir.join(ATLAS_DIR_NAME);
    if atlas_dir.exists() {
        return Err(Error::Config(format!(
            "Atlas is already initialized in this directory. Found existing '{ATLAS_DIR_NAME}'"
        )));
    }
    fs::create_dir_all(&atlas_dir)?;

    let config = AtlasConfig::new(workspace);
    let config_file = atlas_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file)?;

    let data_file = config.data_path(base_dir);
    fs::write(&data_file, "")?;

    Ok(InitResult {
        atlas_dir,
        config_file,
        data_file,
        workspace: workspace.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::simple("default")]
    #[case::dotted("release.2024")]
    #[case::mixed("Build_ws-1")]
    fn test_validate_workspace_valid(#[case] workspace: &str) {
        assert!(validate_workspace(workspace).is_ok());
    }

    #[rstest]
    #[case::empty("", "empty")]
    #[case::too_long("w".repeat(65), "exceed")]
    #[case::space("my ws", "letters")]
    #[case::slash("a/b", "letters")]
    fn test_validate_workspace_invalid(#[case] workspace: impl AsRef<str>, #[case] expected: &str) {
        let err = validate_workspace(workspace.as_ref()).unwrap_err();
        assert!(
            err.to_string().to_lowercase().contains(expected),
            "Expected error to contain '{expected}', got: '{err}'"
        );
    }

    #[test]
    fn test_init_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), Some("ws1")).unwrap();

        assert!(result.atlas_dir.exists());
        assert!(result.config_file.exists());
        assert!(fs::read_to_string(&result.data_file).unwrap().is_empty());
        assert_eq!(AtlasConfig::load(&result.config_file).unwrap().workspace, "ws1");
    }

    #[test]
    fn test_init_default_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), None).unwrap();
        assert_eq!(result.workspace, DEFAULT_WORKSPACE);
    }

    #[test]
    fn test_init_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).unwrap();

        let err = init(temp_dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("already initialized"));
    }
}

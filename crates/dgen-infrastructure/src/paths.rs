//! Path management for dgen configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/dgen/                  # Config directory
//! ├── config.toml                  # Application configuration
//! ├── secret.json                  # API keys
//! ├── diagram-definitions.toml     # Diagram catalog (optional)
//! └── logs/                        # Rolling log files
//!
//! ~/.local/share/dgen/             # Data directory
//! ├── projects/<id>.toml
//! ├── records/<id>.toml
//! └── accounts/<id>.toml
//! ```
//!
//! With a base directory override both trees live under `<base>/config` and
//! `<base>/data`.

use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "dgen";

#[derive(Debug, Error)]
pub enum PathError {
    /// Platform directories could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for dgen_core::DgenError {
    fn from(err: PathError) -> Self {
        dgen_core::DgenError::config(err.to_string())
    }
}

/// Resolves every file location used by dgen.
#[derive(Debug, Clone, Default)]
pub struct DgenPaths {
    base: Option<PathBuf>,
    data_override: Option<PathBuf>,
}

impl DgenPaths {
    /// Platform directories, or everything under `base` when given.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
            data_override: None,
        }
    }

    /// Uses `data_dir` for stored entities regardless of the base directory.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        self.data_override = data_dir;
        self
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(dir) = &self.data_override {
            return Ok(dir.clone());
        }
        match &self.base {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// # Security Note
    ///
    /// Keep this file at mode 600.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn catalog_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("diagram-definitions.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }

    pub fn projects_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("projects"))
    }

    pub fn records_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("records"))
    }

    pub fn accounts_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("accounts"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_dirs_end_with_app_name() {
        let paths = DgenPaths::default();
        if let Ok(config_dir) = paths.config_dir() {
            assert!(config_dir.ends_with("dgen"));
        }
        if let Ok(data_dir) = paths.data_dir() {
            assert!(data_dir.ends_with("dgen"));
        }
    }

    #[test]
    fn test_base_dir_override() {
        let paths = DgenPaths::new(Some(Path::new("/tmp/dgen-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/dgen-test/config/config.toml")
        );
        assert_eq!(
            paths.projects_dir().unwrap(),
            PathBuf::from("/tmp/dgen-test/data/projects")
        );
        assert!(paths.logs_dir().unwrap().starts_with(paths.config_dir().unwrap()));
    }

    #[test]
    fn test_data_dir_override_wins() {
        let paths = DgenPaths::new(Some(Path::new("/tmp/base")))
            .with_data_dir(Some(PathBuf::from("/srv/dgen")));
        assert_eq!(paths.records_dir().unwrap(), PathBuf::from("/srv/dgen/records"));
        assert_eq!(paths.secret_file().unwrap(), PathBuf::from("/tmp/base/config/secret.json"));
    }
}

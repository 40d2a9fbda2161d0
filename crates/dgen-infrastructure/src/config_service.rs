//! Configuration service implementation.
//!
//! Loads `config.toml` and `diagram-definitions.toml` from the config
//! directory. A missing file means defaults; a malformed one is an error.

use crate::paths::DgenPaths;
use crate::storage::AtomicTomlFile;
use dgen_core::config::AppConfig;
use dgen_core::diagram::DiagramCatalog;
use dgen_core::{DgenError, Result};
use std::fs;

/// Loads configuration documents for one set of [`DgenPaths`].
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: DgenPaths,
}

impl ConfigService {
    pub fn new(paths: DgenPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &DgenPaths {
        &self.paths
    }

    /// Reads `config.toml`, falling back to defaults when it is absent.
    pub fn load_config(&self) -> Result<AppConfig> {
        let path = self.paths.config_file()?;
        match AtomicTomlFile::<AppConfig>::new(path.clone()).load()? {
            Some(config) => {
                tracing::debug!("Loaded configuration from {:?}", path);
                Ok(config)
            }
            None => {
                tracing::debug!("No configuration at {:?}, using defaults", path);
                Ok(AppConfig::default())
            }
        }
    }

    /// Writes the default configuration unless a file already exists.
    pub fn ensure_config_file(&self) -> Result<AppConfig> {
        let file = AtomicTomlFile::<AppConfig>::new(self.paths.config_file()?);
        if let Some(existing) = file.load()? {
            return Ok(existing);
        }
        let config = AppConfig::default();
        if let Some(parent) = file.path().parent() {
            fs::create_dir_all(parent)?;
        }
        file.save(&config)?;
        tracing::info!("Created default configuration at {:?}", file.path());
        Ok(config)
    }

    /// Reads the diagram catalog, falling back to the built-in one.
    pub fn load_catalog(&self) -> Result<DiagramCatalog> {
        let path = self.paths.catalog_file()?;
        match fs::read_to_string(&path) {
            Ok(content) => DiagramCatalog::from_toml_str(&content).map_err(|e| {
                DgenError::config(format!("Invalid diagram catalog at {:?}: {}", path, e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No diagram catalog at {:?}, using built-in definitions", path);
                Ok(DiagramCatalog::builtin())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_yield_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(DgenPaths::new(Some(temp_dir.path())));

        assert_eq!(service.load_config().unwrap(), AppConfig::default());
        assert_eq!(service.load_catalog().unwrap(), DiagramCatalog::builtin());
    }

    #[test]
    fn test_ensure_config_file_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(DgenPaths::new(Some(temp_dir.path())));

        service.ensure_config_file().unwrap();
        let path = service.paths().config_file().unwrap();
        assert!(path.exists());

        fs::write(&path, "[generation]\nmodel = \"gpt-4o-mini\"\n").unwrap();
        let config = service.ensure_config_file().unwrap();
        assert_eq!(config.generation.model, "gpt-4o-mini");
    }

    #[test]
    fn test_custom_catalog_replaces_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DgenPaths::new(Some(temp_dir.path()));
        fs::create_dir_all(paths.config_dir().unwrap()).unwrap();
        fs::write(
            paths.catalog_file().unwrap(),
            "[definitions.timeline]\ndescription = \"Events in order\"\n",
        )
        .unwrap();

        let catalog = ConfigService::new(paths).load_catalog().unwrap();
        assert!(catalog.contains("timeline"));
        assert!(!catalog.contains("flowchart"));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DgenPaths::new(Some(temp_dir.path()));
        fs::create_dir_all(paths.config_dir().unwrap()).unwrap();
        fs::write(paths.config_file().unwrap(), "[generation\n").unwrap();

        let err = ConfigService::new(paths).load_config().unwrap_err();
        assert!(matches!(err, DgenError::Serialization { .. }));
    }
}

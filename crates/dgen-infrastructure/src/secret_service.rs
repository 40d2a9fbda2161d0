//! Secret service implementation.
//!
//! Reads `secret.json` and fills missing OpenAI values from the
//! `OPENAI_API_KEY`, `OPENAI_ORGANIZATION_ID` and `OPENAI_MODEL_NAME`
//! environment variables.

use crate::paths::DgenPaths;
use async_trait::async_trait;
use dgen_core::config::{DEFAULT_MODEL, OpenAIConfig, SecretConfig};
use dgen_core::secret::SecretService;
use dgen_core::{DgenError, Result};
use std::fs;
use std::path::PathBuf;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ORGANIZATION_ID: &str = "OPENAI_ORGANIZATION_ID";
pub const ENV_MODEL_NAME: &str = "OPENAI_MODEL_NAME";

pub struct SecretServiceImpl {
    secret_path: PathBuf,
}

impl SecretServiceImpl {
    pub fn new(paths: &DgenPaths) -> Result<Self> {
        Ok(Self {
            secret_path: paths.secret_file()?,
        })
    }

    fn read_file(&self) -> Result<SecretConfig> {
        match fs::read_to_string(&self.secret_path) {
            Ok(content) if content.trim().is_empty() => Ok(SecretConfig::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                // serde_json errors quote input, which may contain the key.
                DgenError::config(format!(
                    "Failed to parse {:?} at line {}",
                    self.secret_path,
                    e.line()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SecretConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes an empty template with mode 600 unless the file exists.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        if self.secret_path.exists() {
            return Ok(self.secret_path.clone());
        }
        if let Some(parent) = self.secret_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            openai: Some(OpenAIConfig {
                api_key: String::new(),
                organization_id: None,
                model_name: Some(DEFAULT_MODEL.to_string()),
            }),
        };
        fs::write(&self.secret_path, serde_json::to_string_pretty(&template)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.secret_path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(self.secret_path.clone())
    }
}

/// Fills gaps in `config` from `lookup`. Values present in the file win.
pub fn apply_env_fallback(
    mut config: SecretConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> SecretConfig {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let mut openai = config.openai.take().unwrap_or(OpenAIConfig {
        api_key: String::new(),
        organization_id: None,
        model_name: None,
    });
    if openai.api_key.trim().is_empty() {
        openai.api_key = non_empty(ENV_API_KEY).unwrap_or_default();
    }
    if openai.organization_id.is_none() {
        openai.organization_id = non_empty(ENV_ORGANIZATION_ID);
    }
    if openai.model_name.is_none() {
        openai.model_name = non_empty(ENV_MODEL_NAME);
    }

    let has_anything = !openai.api_key.is_empty()
        || openai.organization_id.is_some()
        || openai.model_name.is_some();
    config.openai = has_anything.then_some(openai);
    config
}

#[async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        let config = self.read_file()?;
        Ok(apply_env_fallback(config, |name| std::env::var(name).ok()))
    }

    async fn secret_file_exists(&self) -> bool {
        self.secret_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_fills_missing_key() {
        let config = apply_env_fallback(
            SecretConfig::default(),
            env(&[(ENV_API_KEY, "sk-env"), (ENV_MODEL_NAME, "gpt-4o-mini")]),
        );
        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key, "sk-env");
        assert_eq!(openai.model_name.as_deref(), Some("gpt-4o-mini"));
        assert!(openai.organization_id.is_none());
    }

    #[test]
    fn test_file_values_win_over_env() {
        let file = SecretConfig {
            openai: Some(OpenAIConfig {
                api_key: "sk-file".into(),
                organization_id: Some("org-file".into()),
                model_name: None,
            }),
        };
        let config = apply_env_fallback(
            file,
            env(&[(ENV_API_KEY, "sk-env"), (ENV_ORGANIZATION_ID, "org-env")]),
        );
        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key, "sk-file");
        assert_eq!(openai.organization_id.as_deref(), Some("org-file"));
    }

    #[test]
    fn test_nothing_configured_means_no_openai_section() {
        let config = apply_env_fallback(SecretConfig::default(), env(&[]));
        assert!(config.openai.is_none());
    }

    #[tokio::test]
    async fn test_ensure_secret_file_creates_template() {
        let temp_dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::new(&DgenPaths::new(Some(temp_dir.path()))).unwrap();
        assert!(!service.secret_file_exists().await);

        let path = service.ensure_secret_file().unwrap();
        assert!(path.exists());
        assert!(service.secret_file_exists().await);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let parsed = service.read_file().unwrap();
        assert_eq!(parsed.openai.unwrap().api_key, "");
    }

    #[tokio::test]
    async fn test_parse_error_does_not_leak_contents() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DgenPaths::new(Some(temp_dir.path()));
        fs::create_dir_all(paths.config_dir().unwrap()).unwrap();
        fs::write(paths.secret_file().unwrap(), "{\"openai\": {\"api_key\": \"sk-leak\"").unwrap();

        let service = SecretServiceImpl::new(&paths).unwrap();
        let err = service.load_secrets().await.unwrap_err();
        assert!(!err.to_string().contains("sk-leak"));
    }
}

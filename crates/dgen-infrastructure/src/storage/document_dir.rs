//! A directory of TOML documents keyed by id.

use super::atomic_toml::AtomicTomlFile;
use dgen_core::{DgenError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// `<dir>/<id>.toml` for every stored value.
pub struct DocumentDir<T> {
    dir: PathBuf,
    entity_type: &'static str,
    _phantom: PhantomData<T>,
}

impl<T> DocumentDir<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates the directory if needed.
    pub fn open(dir: impl AsRef<Path>, entity_type: &'static str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            entity_type,
            _phantom: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Handle for one document. Ids that could escape the directory are rejected.
    pub fn file(&self, id: &str) -> Result<AtomicTomlFile<T>> {
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\'])
            && !id.starts_with('.');
        if !valid {
            return Err(DgenError::validation(format!(
                "invalid {} id: '{}'",
                self.entity_type, id
            )));
        }
        Ok(AtomicTomlFile::new(self.dir.join(format!("{id}.toml"))))
    }

    pub fn load(&self, id: &str) -> Result<Option<T>> {
        Ok(self.file(id)?.load()?)
    }

    pub fn save(&self, id: &str, value: &T) -> Result<()> {
        Ok(self.file(id)?.save(value)?)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        Ok(self.file(id)?.remove()?)
    }

    /// Every readable document. Unparseable files are skipped with a warning.
    pub fn load_all(&self) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_document = path.extension().is_some_and(|ext| ext == "toml")
                && !path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with('.'));
            if !is_document {
                continue;
            }

            match AtomicTomlFile::<T>::new(path.clone()).load() {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable {} file {:?}: {}",
                        self.entity_type,
                        path,
                        e
                    );
                }
            }
        }
        Ok(values)
    }
}

//! Atomic TOML documents.
//!
//! One value per file. Writes go to a temporary sibling that is fsynced and
//! renamed over the target; read-modify-write cycles hold an exclusive
//! `fs2` lock on a sibling `.lock` file.

use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic TOML operations.
#[derive(Debug, Error)]
pub enum AtomicTomlError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Lock error on {path}: {message}")]
    Lock { path: PathBuf, message: String },
}

impl From<AtomicTomlError> for dgen_core::DgenError {
    fn from(err: AtomicTomlError) -> Self {
        match err {
            AtomicTomlError::Parse { .. } | AtomicTomlError::Serialize(_) => {
                dgen_core::DgenError::Serialization {
                    format: "TOML".to_string(),
                    message: err.to_string(),
                }
            }
            AtomicTomlError::Io { .. } => dgen_core::DgenError::io(err.to_string()),
            AtomicTomlError::Lock { .. } => dgen_core::DgenError::data_access(err.to_string()),
        }
    }
}

/// A handle to one TOML document.
///
/// Provides:
/// - **Atomicity**: tmp file + rename, so readers see the old or the new document
/// - **Isolation**: `save`, `update` and `remove` serialize on a file lock
/// - **Durability**: fsync before rename
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the document.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AtomicTomlError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| AtomicTomlError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Replaces the document.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        let _lock = FileLock::acquire(&self.path)?;
        self.write_atomic(data)
    }

    /// Loads, modifies and writes back the document under the file lock.
    ///
    /// Returns `Ok(None)` without calling `f` when the document does not
    /// exist. Nothing is written when `f` fails.
    pub fn update<R, E, F>(&self, f: F) -> Result<Option<R>, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<AtomicTomlError>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let Some(mut data) = self.load()? else {
            return Ok(None);
        };
        let result = f(&mut data)?;
        self.write_atomic(&data)?;
        Ok(Some(result))
    }

    /// Deletes the document. Missing files are not an error.
    pub fn remove(&self) -> Result<(), AtomicTomlError> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn write_atomic(&self, data: &T) -> Result<(), AtomicTomlError> {
        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        tmp_file
            .write_all(toml_string.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp_file.sync_all().map_err(|e| self.io_error(e))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicTomlError> {
        let (parent, file_name) = self
            .path
            .parent()
            .zip(self.path.file_name())
            .ok_or_else(|| {
                self.io_error(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Path has no parent directory or file name",
                ))
            })?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }

    fn io_error(&self, source: std::io::Error) -> AtomicTomlError {
        AtomicTomlError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Exclusive lock held for the guard's lifetime.
///
/// The lock file itself is left in place; removing it would let a waiter
/// and a newcomer lock different inodes.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");
        let lock_error = |message: String| AtomicTomlError::Lock {
            path: lock_path.clone(),
            message,
        };

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|source| AtomicTomlError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| lock_error(format!("Failed to open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| lock_error(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

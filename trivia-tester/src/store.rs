//! Directory-backed key-value store for `--profile-dir`.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use trivia_game::KeyValueStore;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open `root`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| FileStoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, FileStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if valid {
            Ok(self.root.join(format!("{key}.json")))
        } else {
            Err(FileStoreError::InvalidKey(key.to_string()))
        }
    }
}

impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        fs::write(&path, value).map_err(|source| FileStoreError::Io { path, source })
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                Err(FileStoreError::Io { path, source: err })
            }
            _ => Ok(()),
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Directory-backed store: one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{LocalStore, StorageError};

/// Stores each key as a file named after the URL-encoded key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        tracing::info!(path = %root.display(), "Local store ready");
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys contain '/' separators; encoding keeps everything in one directory
        self.root.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("user-1/workout_progress_abc").unwrap(), None);

        store.set("user-1/workout_progress_abc", "{\"ex\":2}").unwrap();
        assert_eq!(
            store.get("user-1/workout_progress_abc").unwrap().as_deref(),
            Some("{\"ex\":2}")
        );

        store.set("user-1/workout_progress_abc", "{}").unwrap();
        assert_eq!(
            store.get("user-1/workout_progress_abc").unwrap().as_deref(),
            Some("{}")
        );

        store.remove("user-1/workout_progress_abc").unwrap();
        assert_eq!(store.get("user-1/workout_progress_abc").unwrap(), None);

        // Removing a missing key is not an error
        store.remove("user-1/workout_progress_abc").unwrap();
    }

    #[test]
    fn test_keys_do_not_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("../outside", "x").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}

//! File-backed storage backend
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a uniquely named
//! temporary sibling first and are renamed into place, so a reader sees
//! either the previous value or the new one, and concurrent writers never
//! share a temp file.

use super::StorageBackend;
use crate::error::{PrismError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable key-value backend rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    available: bool,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    ///
    /// Never fails: a directory that cannot be created yields a backend
    /// that reports itself unavailable.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let available = match std::fs::create_dir_all(&dir) {
            Ok(()) => true,
            Err(e) => {
                warn!("Storage directory {} unavailable: {}", dir.display(), e);
                false
            }
        };
        debug!("Opened file storage at {}", dir.display());
        Self { dir, available }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PrismError::Storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl StorageBackend for FileStorage {
    fn is_available(&self) -> bool {
        self.available
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PrismError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", key))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| {
                PrismError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create temp file in {}: {}", self.dir.display(), e),
                ))
            })?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;

        tmp.persist(&path).map_err(|e| {
            PrismError::Io(std::io::Error::new(
                e.error.kind(),
                format!("Failed to replace {}: {}", path.display(), e.error),
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_and_missing() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path());
        assert!(storage.is_available());
        assert_eq!(storage.get("prism_documents").unwrap(), None);

        storage.set("prism_documents", r#"[{"a":1}]"#).unwrap();
        assert_eq!(
            storage.get("prism_documents").unwrap().as_deref(),
            Some(r#"[{"a":1}]"#)
        );
        assert!(dir.path().join("prism_documents.json").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_writers_leave_whole_value() {
        let dir = TempDir::new().unwrap();
        let storage = std::sync::Arc::new(FileStorage::open(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = std::sync::Arc::clone(&storage);
                std::thread::spawn(move || {
                    for j in 0..20 {
                        storage
                            .set("prism_queries", &format!("[{}, {}]", i, j))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let raw = storage.get("prism_queries").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path());
        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("").is_err());
    }

    #[test]
    fn test_unavailable_when_dir_cannot_be_created() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let storage = FileStorage::open(blocker.join("nested"));
        assert!(!storage.is_available());
    }
}
